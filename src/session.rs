//! Session state and outward-facing events.
//!
//! All mutable per-session state lives in one explicit [`SessionState`]
//! value passed by reference to the components, never in ambient globals.
//! Each field has exactly one writer: the synchronizer owns the cursor, the
//! select action owns the active conversation key.  Consumers of the core
//! (presentation, notifications) observe it only through [`CoreEvent`]s
//! pushed into an [`EventSink`].

use serde::{Deserialize, Serialize};

use crate::render::RenderEntry;

#[derive(Debug)]
pub enum SessionError {
    /// No usable identity; the session cannot be created (fatal).
    MissingIdentity,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::MissingIdentity => write!(f, "no usable identity for session"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Key of a conversation: a one-to-one peer or a group id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationKey {
    Contact(String),
    Group(i64),
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationKey::Contact(name) => write!(f, "contact:{name}"),
            ConversationKey::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// Mutable state of one client session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Local identity, immutable for the session's lifetime.
    pub identity: String,
    /// Currently displayed conversation, if any.  Written only by the
    /// select-conversation action.
    pub active: Option<ConversationKey>,
    /// Sync cursor: highest message id already processed.  Written only by
    /// the synchronizer; starts at 0 every session and only increases.
    pub last_checked_message_id: i64,
}

impl SessionState {
    pub fn new(identity: impl Into<String>) -> Result<Self, SessionError> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(SessionError::MissingIdentity);
        }
        Ok(Self {
            identity,
            active: None,
            last_checked_message_id: 0,
        })
    }

    /// The active peer name, when the active conversation is one-to-one.
    pub fn active_contact(&self) -> Option<&str> {
        match self.active {
            Some(ConversationKey::Contact(ref name)) => Some(name),
            _ => None,
        }
    }
}

/// Events the core raises for presentation and notification collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreEvent {
    /// Raised once per newly observed incoming message.
    MessageArrived { sender: String, timestamp: String },
    /// A refreshed, ready-to-display transcript for a conversation.
    TranscriptReady {
        conversation: ConversationKey,
        entries: Vec<RenderEntry>,
    },
    /// Outcome of a compose/send action.
    SendCompleted { ok: bool },
}

/// Consumer of core events.  Implemented for the tokio broadcast sender
/// used by the session runtime; tests wrap a closure in [`FnSink`] to
/// collect events into a `RefCell<Vec<_>>`.
pub trait EventSink {
    fn emit(&self, event: CoreEvent);
}

/// Adapter turning any `Fn(CoreEvent)` closure into an [`EventSink`].
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(CoreEvent),
{
    fn emit(&self, event: CoreEvent) {
        (self.0)(event);
    }
}

impl EventSink for tokio::sync::broadcast::Sender<CoreEvent> {
    fn emit(&self, event: CoreEvent) {
        // Nobody listening is fine; events are fire-and-forget.
        let _ = self.send(event);
    }
}
