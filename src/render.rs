//! Transcript rendering: turns fetched conversation rows into an ordered
//! sequence of style-agnostic [`RenderEntry`] values.
//!
//! Rendering is a pure function of its inputs.  Nothing is cached between
//! calls; every refresh recomputes the whole sequence from a fresh store
//! fetch.  The empty conversation and the failed fetch each get a dedicated
//! entry so consumers can distinguish "loaded but empty" from "not loaded".

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::gate::{attempt_decrypt, decrypt_for_display};
use crate::session::ConversationKey;
use crate::status::{glyph_for, GlyphKind, StatusKind};
use crate::store::{Decryptor, GroupMessageRow, MessageRow, MessageStore, StoreError};

/// Text of the dedicated entry for a conversation with no messages.
pub const EMPTY_CONVERSATION_TEXT: &str = "No messages yet. Start the conversation!";

/// Text of the dedicated entry for a failed conversation fetch.
pub const LOAD_FAILED_TEXT: &str = "Failed to load conversation";

/// Display name the renderer uses for the local identity.
pub const SELF_AUTHOR_LABEL: &str = "You";

/// Opaque style parameters supplied by the presentation layer.  The renderer
/// copies `accent` onto read-status entries and never interprets either
/// field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub accent: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "io".to_string(),
            accent: "#00D9FF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Message authored by the local identity; presented right-aligned.
    Outgoing,
    /// Message from a peer; presented left-aligned.
    Incoming,
}

/// One transcript line's semantic attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub alignment: Alignment,
    /// `"You"` for outgoing messages.  For incoming messages: the sender
    /// identity in group conversations, omitted in one-to-one conversations
    /// where the peer is implied.
    pub author_label: Option<String>,
    pub display_text: String,
    /// `HH:MM` derived from the store timestamp.
    pub time_label: String,
    pub status_glyph: GlyphKind,
    /// Theme accent, present only on [`GlyphKind::DoubleAccent`] entries.
    pub accent: Option<String>,
}

/// One element of a rendered transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderEntry {
    Message(MessageEntry),
    /// The conversation loaded successfully and holds no messages.
    Empty,
    /// The conversation fetch itself failed.
    LoadFailed,
}

impl RenderEntry {
    pub fn display_text(&self) -> &str {
        match self {
            RenderEntry::Message(entry) => &entry.display_text,
            RenderEntry::Empty => EMPTY_CONVERSATION_TEXT,
            RenderEntry::LoadFailed => LOAD_FAILED_TEXT,
        }
    }
}

const STORE_TS_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const TIME_LABEL_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[hour]:[minute]");

/// `HH:MM` label for a store timestamp.
///
/// The store format is `"YYYY-MM-DD HH:MM:SS"`; a proper parse replaces the
/// historical fixed-offset slice, with the slice kept as a fallback for
/// malformed rows so one bad timestamp never blanks a whole transcript.
pub fn time_label(timestamp: &str) -> String {
    if let Ok(parsed) = PrimitiveDateTime::parse(timestamp, &STORE_TS_FORMAT) {
        if let Ok(label) = parsed.format(&TIME_LABEL_FORMAT) {
            return label;
        }
    }
    timestamp.get(11..16).unwrap_or_default().to_string()
}

fn message_entry(
    alignment: Alignment,
    author_label: Option<String>,
    display_text: String,
    timestamp: &str,
    status: StatusKind,
    theme: &Theme,
) -> RenderEntry {
    let status_glyph = glyph_for(status, alignment == Alignment::Outgoing);
    let accent = match status_glyph {
        GlyphKind::DoubleAccent => Some(theme.accent.clone()),
        _ => None,
    };
    RenderEntry::Message(MessageEntry {
        alignment,
        author_label,
        display_text,
        time_label: time_label(timestamp),
        status_glyph,
        accent,
    })
}

/// Render a one-to-one conversation.
///
/// Each message passes through the decryption gate; zero rows produce the
/// dedicated empty entry rather than an empty sequence.
pub fn render_direct<D: Decryptor + ?Sized>(
    rows: &[MessageRow],
    local_identity: &str,
    theme: &Theme,
    decryptor: &D,
) -> Vec<RenderEntry> {
    if rows.is_empty() {
        return vec![RenderEntry::Empty];
    }
    rows.iter()
        .map(|row| {
            let display = attempt_decrypt(decryptor, row, local_identity);
            let (alignment, author_label) = if row.sender == local_identity {
                (Alignment::Outgoing, Some(SELF_AUTHOR_LABEL.to_string()))
            } else {
                (Alignment::Incoming, None)
            };
            message_entry(
                alignment,
                author_label,
                display.text().to_string(),
                &row.timestamp,
                StatusKind::classify(row.status.as_deref()),
                theme,
            )
        })
        .collect()
}

/// Render a group conversation.
///
/// Decryption is always attempted — there is no recipient set to gate on —
/// and author labels are always present so members can be told apart.
/// Group rows carry no status column, so outgoing entries show the sent
/// glyph.
pub fn render_group<D: Decryptor + ?Sized>(
    rows: &[GroupMessageRow],
    local_identity: &str,
    theme: &Theme,
    decryptor: &D,
) -> Vec<RenderEntry> {
    if rows.is_empty() {
        return vec![RenderEntry::Empty];
    }
    rows.iter()
        .map(|row| {
            let display = decrypt_for_display(decryptor, row.id);
            let (alignment, author_label) = if row.sender == local_identity {
                (Alignment::Outgoing, Some(SELF_AUTHOR_LABEL.to_string()))
            } else {
                (Alignment::Incoming, Some(row.sender.clone()))
            };
            message_entry(
                alignment,
                author_label,
                display.text().to_string(),
                &row.timestamp,
                StatusKind::Sent,
                theme,
            )
        })
        .collect()
}

/// Fetch and render the transcript for a conversation key.
///
/// A fetch failure yields the dedicated error entry; it never propagates.
pub fn load_transcript<S, D>(
    store: &S,
    decryptor: &D,
    local_identity: &str,
    key: &ConversationKey,
    theme: &Theme,
) -> Vec<RenderEntry>
where
    S: MessageStore + ?Sized,
    D: Decryptor + ?Sized,
{
    let result: Result<Vec<RenderEntry>, StoreError> = match key {
        ConversationKey::Contact(contact) => store
            .fetch_conversation(local_identity, contact)
            .map(|rows| render_direct(&rows, local_identity, theme, decryptor)),
        ConversationKey::Group(group_id) => store
            .fetch_group_conversation(*group_id)
            .map(|rows| render_group(&rows, local_identity, theme, decryptor)),
    };
    match result {
        Ok(entries) => entries,
        Err(e) => {
            crate::plog!("render: conversation fetch failed: {e}");
            vec![RenderEntry::LoadFailed]
        }
    }
}
