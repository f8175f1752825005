//! Compose/send pipeline.
//!
//! Assembles the outgoing recipient list, invokes the external send
//! capability, and on success synthesizes one optimistic transcript entry
//! shown before the store confirms the message.  That entry is superseded
//! wholesale by the next full reload, which re-renders from store truth.

use crate::render::{Alignment, MessageEntry, RenderEntry, SELF_AUTHOR_LABEL};
use crate::session::ConversationKey;
use crate::status::GlyphKind;
use crate::store::{MessageSender, StoreError};

#[derive(Debug)]
pub enum SendError {
    /// No conversation selected; nothing was sent.
    NoTarget,
    /// Empty or whitespace-only message text; nothing was sent.
    EmptyMessage,
    /// The send capability failed.  The caller keeps the input text and may
    /// retry; no local state changed.
    Transport(StoreError),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::NoTarget => write!(f, "no conversation selected"),
            SendError::EmptyMessage => write!(f, "message text is empty"),
            SendError::Transport(e) => write!(f, "send failed: {e}"),
        }
    }
}

impl std::error::Error for SendError {}

impl From<StoreError> for SendError {
    fn from(e: StoreError) -> Self {
        SendError::Transport(e)
    }
}

/// Ordered recipient list for one compose action: the primary contact
/// first, then any additional recipients in the order they were added.
///
/// Duplicates are deliberately passed through unchanged — deduplication, if
/// any, is the store/crypto layer's call.  The set lives for one compose
/// action and is cleared when the user switches conversation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientSet {
    primary: String,
    additional: Vec<String>,
}

impl RecipientSet {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            additional: Vec::new(),
        }
    }

    pub fn with_additional(primary: impl Into<String>, additional: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            additional,
        }
    }

    pub fn add(&mut self, recipient: impl Into<String>) {
        self.additional.push(recipient.into());
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// The exact ordered list handed to the send capability.
    pub fn to_vec(&self) -> Vec<String> {
        let mut recipients = Vec::with_capacity(1 + self.additional.len());
        recipients.push(self.primary.clone());
        recipients.extend(self.additional.iter().cloned());
        recipients
    }
}

/// Send `plaintext` to the target conversation.
///
/// Preconditions (a selected target, non-empty text) short-circuit before
/// the capability is invoked.  On success the returned entry is the
/// optimistic transcript line: outgoing alignment, assumed-sent glyph, the
/// caller-supplied `time_label` for "now".
pub fn send_message<M: MessageSender + ?Sized>(
    sender: &M,
    target: Option<&ConversationKey>,
    additional_recipients: &[String],
    plaintext: &str,
    time_label: &str,
) -> Result<RenderEntry, SendError> {
    let Some(target) = target else {
        return Err(SendError::NoTarget);
    };
    if plaintext.trim().is_empty() {
        return Err(SendError::EmptyMessage);
    }

    match target {
        ConversationKey::Contact(contact) => {
            let recipients =
                RecipientSet::with_additional(contact.clone(), additional_recipients.to_vec());
            sender.send_direct(&recipients.to_vec(), plaintext)?;
        }
        ConversationKey::Group(group_id) => {
            sender.send_group(*group_id, plaintext)?;
        }
    }

    Ok(RenderEntry::Message(MessageEntry {
        alignment: Alignment::Outgoing,
        author_label: Some(SELF_AUTHOR_LABEL.to_string()),
        display_text: plaintext.to_string(),
        time_label: time_label.to_string(),
        status_glyph: GlyphKind::SingleGray,
        accent: None,
    }))
}
