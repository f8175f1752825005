//! SQLite reference implementation of the store capabilities.
//!
//! The sync core only ever sees the [`MessageStore`] / [`Decryptor`] /
//! [`MessageSender`] traits; this module backs all three with a small
//! SQLite schema so the demo binary and the integration tests have a real
//! query engine to reconcile against.  Message bodies are stored as-is and
//! served back through `decrypt` — a deployment-grade backend keeps
//! ciphertext at rest and performs real decryption behind the same trait.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::store::{
    Decryptor, GroupInfoRow, GroupMessageRow, MessageRow, MessageSender, MessageStore,
    NewMessageRow, StoreError,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    sender      TEXT NOT NULL,
    recipient   TEXT,
    group_id    INTEGER,
    body        TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'sent',
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient, id);
CREATE INDEX IF NOT EXISTS idx_messages_group ON messages(group_id, id);
CREATE TABLE IF NOT EXISTS groups (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    creator     TEXT,
    created_at  TEXT
);
";

pub struct SqliteStore {
    conn: Connection,
    /// Identity stamped as the sender on outgoing sends, mirroring a send
    /// capability bound to one session.
    local_identity: String,
}

impl SqliteStore {
    /// Open (and if needed create) a store at `path`, bound to `identity`
    /// for outgoing sends.
    pub fn open(path: &Path, identity: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            local_identity: identity.to_string(),
        })
    }

    /// Open a fresh in-memory store.  Used by tests and `--memory` demos.
    pub fn open_in_memory(identity: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            local_identity: identity.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Seeding helpers (demo binary and tests)
    // -----------------------------------------------------------------------

    pub fn insert_direct_message(
        &self,
        sender: &str,
        recipient: &str,
        timestamp: &str,
        body: &str,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO messages (sender, recipient, body, status, created_at)
             VALUES (?1, ?2, ?3, 'sent', ?4)",
            params![sender, recipient, body, timestamp],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert with an explicit store-assigned id.  Lets tests reproduce id
    /// sequences with gaps.
    pub fn insert_direct_message_with_id(
        &self,
        id: i64,
        sender: &str,
        recipient: &str,
        timestamp: &str,
        body: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO messages (id, sender, recipient, body, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'sent', ?5)",
            params![id, sender, recipient, body, timestamp],
        )?;
        Ok(())
    }

    pub fn insert_group_message(
        &self,
        group_id: i64,
        sender: &str,
        timestamp: &str,
        body: &str,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO messages (sender, group_id, body, status, created_at)
             VALUES (?1, ?2, ?3, 'sent', ?4)",
            params![sender, group_id, body, timestamp],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        creator: Option<&str>,
        created_at: Option<&str>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO groups (name, description, creator, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, description, creator, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_status(&self, message_id: i64, status: &str) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE messages SET status = ?1 WHERE id = ?2",
            params![status, message_id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("message {message_id}")));
        }
        Ok(())
    }

    pub fn status_of(&self, message_id: i64) -> Result<String, StoreError> {
        self.conn
            .query_row(
                "SELECT status FROM messages WHERE id = ?1",
                params![message_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("message {message_id}")))
    }
}

impl MessageStore for SqliteStore {
    fn fetch_new_messages(
        &self,
        identity: &str,
        after_id: i64,
    ) -> Result<Vec<NewMessageRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sender, created_at FROM messages
             WHERE recipient = ?1 AND id > ?2
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![identity, after_id], |row| {
                Ok(NewMessageRow {
                    id: row.get(0)?,
                    sender: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn fetch_status_progress_count(
        &self,
        sender: &str,
        recipient: &str,
    ) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM messages
             WHERE sender = ?1 AND recipient = ?2
               AND status IN ('delivered', 'read')",
            params![sender, recipient],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn fetch_conversation(
        &self,
        identity: &str,
        contact: &str,
    ) -> Result<Vec<MessageRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sender, recipient, created_at, status FROM messages
             WHERE group_id IS NULL
               AND ((sender = ?1 AND recipient = ?2) OR (sender = ?2 AND recipient = ?1))
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![identity, contact], |row| {
                Ok(MessageRow {
                    id: row.get(0)?,
                    sender: row.get(1)?,
                    recipient: row.get(2)?,
                    timestamp: row.get(3)?,
                    status: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn fetch_group_conversation(
        &self,
        group_id: i64,
    ) -> Result<Vec<GroupMessageRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sender, created_at FROM messages
             WHERE group_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![group_id], |row| {
                Ok(GroupMessageRow {
                    id: row.get(0)?,
                    sender: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn fetch_group_info(&self, group_id: i64) -> Result<GroupInfoRow, StoreError> {
        self.conn
            .query_row(
                "SELECT id, name, description, creator, created_at FROM groups WHERE id = ?1",
                params![group_id],
                |row| {
                    Ok(GroupInfoRow {
                        group_id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        creator: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("group {group_id}")))
    }

    fn mark_delivered(&self, message_id: i64) -> Result<(), StoreError> {
        // Only forward: a read message never drops back to delivered.
        self.conn.execute(
            "UPDATE messages SET status = 'delivered' WHERE id = ?1 AND status = 'sent'",
            params![message_id],
        )?;
        Ok(())
    }

    fn mark_conversation_read(&self, identity: &str, contact: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE messages SET status = 'read'
             WHERE sender = ?2 AND recipient = ?1 AND status <> 'read'",
            params![identity, contact],
        )?;
        Ok(())
    }
}

impl Decryptor for SqliteStore {
    fn decrypt(&self, message_id: i64) -> Result<Vec<u8>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM messages WHERE id = ?1",
                params![message_id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(String::into_bytes)
            .ok_or_else(|| StoreError::NotFound(format!("message {message_id}")))
    }
}

impl MessageSender for SqliteStore {
    fn send_direct(&self, recipients: &[String], plaintext: &str) -> Result<(), StoreError> {
        if recipients.is_empty() {
            return Err(StoreError::Backend("empty recipient list".to_string()));
        }
        // One row per recipient so each one's poll query can see it.  The
        // per-recipient copy stands in for per-recipient key wrapping.
        for recipient in recipients {
            self.conn.execute(
                "INSERT INTO messages (sender, recipient, body, status, created_at)
                 VALUES (?1, ?2, ?3, 'sent', strftime('%Y-%m-%d %H:%M:%S', 'now'))",
                params![self.local_identity, recipient, plaintext],
            )?;
        }
        Ok(())
    }

    fn send_group(&self, group_id: i64, plaintext: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO messages (sender, group_id, body, status, created_at)
             VALUES (?1, ?2, ?3, 'sent', strftime('%Y-%m-%d %H:%M:%S', 'now'))",
            params![self.local_identity, group_id, plaintext],
        )?;
        Ok(())
    }
}
