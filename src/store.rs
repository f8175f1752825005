//! Capability interfaces the sync core consumes.
//!
//! The core never talks to a database, a key store, or a network directly.
//! Everything it needs from the outside world is expressed as three narrow
//! traits: [`MessageStore`] for queries and status writes, [`Decryptor`] for
//! turning a message id into plaintext, and [`MessageSender`] for outgoing
//! sends.  [`crate::storage::SqliteStore`] is the reference implementation;
//! tests substitute recording fakes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    NotFound(String),
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            StoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            StoreError::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One row of the incremental poll query: messages addressed to the local
/// identity with an id above the sync cursor, ascending by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessageRow {
    pub id: i64,
    pub sender: String,
    pub timestamp: String,
}

/// One row of a one-to-one conversation fetch.
///
/// `timestamp` is the store's `"YYYY-MM-DD HH:MM:SS"` string; `status` is
/// the store's raw status column, absent or unrecognized values classify as
/// sent.  The message body never appears here — displayable text comes from
/// the decryption gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub sender: String,
    pub recipient: String,
    pub timestamp: String,
    pub status: Option<String>,
}

/// One row of a group conversation fetch.  Group messages carry no explicit
/// recipient; membership authorization is the store/crypto layer's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessageRow {
    pub id: i64,
    pub sender: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfoRow {
    pub group_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Query and status-write surface of the remote message store.
pub trait MessageStore {
    /// Messages where `recipient == identity AND id > after_id`, ascending
    /// by id.  Ascending order is a contract: the caller advances its cursor
    /// and fires per-message side effects in store-assigned order.
    fn fetch_new_messages(
        &self,
        identity: &str,
        after_id: i64,
    ) -> Result<Vec<NewMessageRow>, StoreError>;

    /// Count of messages `sender -> recipient` whose status is delivered or
    /// read.
    fn fetch_status_progress_count(
        &self,
        sender: &str,
        recipient: &str,
    ) -> Result<i64, StoreError>;

    /// Full two-way conversation between `identity` and `contact`, ascending
    /// by id.
    fn fetch_conversation(
        &self,
        identity: &str,
        contact: &str,
    ) -> Result<Vec<MessageRow>, StoreError>;

    /// Full group conversation, ascending by id.
    fn fetch_group_conversation(&self, group_id: i64)
        -> Result<Vec<GroupMessageRow>, StoreError>;

    fn fetch_group_info(&self, group_id: i64) -> Result<GroupInfoRow, StoreError>;

    /// Record that the local client has fetched the message.  Idempotent on
    /// the store side; the cursor makes it at-most-once per session anyway.
    fn mark_delivered(&self, message_id: i64) -> Result<(), StoreError>;

    /// Mark every message from `contact` to `identity` as read.  Invoked
    /// when a conversation becomes the active selection.
    fn mark_conversation_read(&self, identity: &str, contact: &str) -> Result<(), StoreError>;
}

/// External decrypt capability.  Key management and the actual cipher are
/// out of scope; the core only sees plaintext bytes or failure.
pub trait Decryptor {
    fn decrypt(&self, message_id: i64) -> Result<Vec<u8>, StoreError>;
}

/// External send capability.
pub trait MessageSender {
    /// Send to an explicit ordered recipient list, primary recipient first.
    /// The list is passed through exactly as assembled — duplicates and all.
    fn send_direct(&self, recipients: &[String], plaintext: &str) -> Result<(), StoreError>;

    /// Group send; membership resolution happens behind the capability.
    fn send_group(&self, group_id: i64, plaintext: &str) -> Result<(), StoreError>;
}
