//! Transcript rendering through the full fetch/decrypt/render path:
//! placeholder selection, glyph and accent assignment, and the fixed
//! entries for empty and failed loads.

use std::cell::Cell;

use parley::gate::{DECRYPT_FAILED_PLACEHOLDER, NO_ACCESS_PLACEHOLDER};
use parley::render::{
    load_transcript, time_label, RenderEntry, Theme, EMPTY_CONVERSATION_TEXT, LOAD_FAILED_TEXT,
};
use parley::session::ConversationKey;
use parley::status::GlyphKind;
use parley::storage::SqliteStore;
use parley::store::{
    Decryptor, GroupInfoRow, GroupMessageRow, MessageRow, MessageStore, NewMessageRow, StoreError,
};

const TS: &str = "2026-08-30 09:41:27";

fn contact(name: &str) -> ConversationKey {
    ConversationKey::Contact(name.to_string())
}

#[test]
fn decrypt_failure_shows_failed_placeholder_not_no_access() {
    // bob is a party to the message, so the gate admits it;
    // the decryptor then fails and the failed placeholder must win.
    struct FailingDecryptor;

    impl Decryptor for FailingDecryptor {
        fn decrypt(&self, _message_id: i64) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::Backend("bad key material".to_string()))
        }
    }

    let store = SqliteStore::open_in_memory("bob").expect("store");
    store
        .insert_direct_message("carol", "bob", TS, "unreadable")
        .expect("insert");

    let entries = load_transcript(
        &store,
        &FailingDecryptor,
        "bob",
        &contact("carol"),
        &Theme::default(),
    );

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].display_text(), DECRYPT_FAILED_PLACEHOLDER);
}

#[test]
fn third_party_message_is_gated_without_a_decrypt_call() {
    // A row neither sent nor received by the local identity shows the
    // no-access placeholder and the decrypt capability is never consulted.
    struct CountingDecryptor {
        calls: Cell<usize>,
    }

    impl Decryptor for CountingDecryptor {
        fn decrypt(&self, _message_id: i64) -> Result<Vec<u8>, StoreError> {
            self.calls.set(self.calls.get() + 1);
            Ok(b"leaked".to_vec())
        }
    }

    struct ThirdPartyStore;

    impl MessageStore for ThirdPartyStore {
        fn fetch_new_messages(
            &self,
            _identity: &str,
            _after_id: i64,
        ) -> Result<Vec<NewMessageRow>, StoreError> {
            Ok(Vec::new())
        }

        fn fetch_status_progress_count(
            &self,
            _sender: &str,
            _recipient: &str,
        ) -> Result<i64, StoreError> {
            Ok(0)
        }

        fn fetch_conversation(
            &self,
            _identity: &str,
            _contact: &str,
        ) -> Result<Vec<MessageRow>, StoreError> {
            Ok(vec![MessageRow {
                id: 1,
                sender: "carol".to_string(),
                recipient: "dave".to_string(),
                timestamp: TS.to_string(),
                status: None,
            }])
        }

        fn fetch_group_conversation(
            &self,
            _group_id: i64,
        ) -> Result<Vec<GroupMessageRow>, StoreError> {
            Ok(Vec::new())
        }

        fn fetch_group_info(&self, group_id: i64) -> Result<GroupInfoRow, StoreError> {
            Err(StoreError::NotFound(format!("group {group_id}")))
        }

        fn mark_delivered(&self, _message_id: i64) -> Result<(), StoreError> {
            Ok(())
        }

        fn mark_conversation_read(
            &self,
            _identity: &str,
            _contact: &str,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    let decryptor = CountingDecryptor { calls: Cell::new(0) };
    let entries = load_transcript(
        &ThirdPartyStore,
        &decryptor,
        "alice",
        &contact("carol"),
        &Theme::default(),
    );

    assert_eq!(entries[0].display_text(), NO_ACCESS_PLACEHOLDER);
    assert_eq!(decryptor.calls.get(), 0);
}

#[test]
fn empty_conversation_renders_the_dedicated_entry() {
    // Zero rows yields exactly one empty entry, not zero.
    let store = SqliteStore::open_in_memory("alice").expect("store");
    let entries = load_transcript(
        &store,
        &store,
        "alice",
        &contact("nobody-yet"),
        &Theme::default(),
    );
    assert_eq!(entries, vec![RenderEntry::Empty]);
    assert_eq!(entries[0].display_text(), EMPTY_CONVERSATION_TEXT);
}

#[test]
fn fetch_failure_renders_the_error_entry() {
    struct BrokenStore;

    impl MessageStore for BrokenStore {
        fn fetch_new_messages(
            &self,
            _identity: &str,
            _after_id: i64,
        ) -> Result<Vec<NewMessageRow>, StoreError> {
            Ok(Vec::new())
        }

        fn fetch_status_progress_count(
            &self,
            _sender: &str,
            _recipient: &str,
        ) -> Result<i64, StoreError> {
            Ok(0)
        }

        fn fetch_conversation(
            &self,
            _identity: &str,
            _contact: &str,
        ) -> Result<Vec<MessageRow>, StoreError> {
            Err(StoreError::Backend("disk gone".to_string()))
        }

        fn fetch_group_conversation(
            &self,
            _group_id: i64,
        ) -> Result<Vec<GroupMessageRow>, StoreError> {
            Err(StoreError::Backend("disk gone".to_string()))
        }

        fn fetch_group_info(&self, group_id: i64) -> Result<GroupInfoRow, StoreError> {
            Err(StoreError::NotFound(format!("group {group_id}")))
        }

        fn mark_delivered(&self, _message_id: i64) -> Result<(), StoreError> {
            Ok(())
        }

        fn mark_conversation_read(
            &self,
            _identity: &str,
            _contact: &str,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct NeverDecrypt;

    impl Decryptor for NeverDecrypt {
        fn decrypt(&self, _message_id: i64) -> Result<Vec<u8>, StoreError> {
            unreachable!("nothing to decrypt when the fetch fails");
        }
    }

    let entries = load_transcript(
        &BrokenStore,
        &NeverDecrypt,
        "alice",
        &contact("carol"),
        &Theme::default(),
    );
    assert_eq!(entries, vec![RenderEntry::LoadFailed]);
    assert_eq!(entries[0].display_text(), LOAD_FAILED_TEXT);

    let entries = load_transcript(
        &BrokenStore,
        &NeverDecrypt,
        "alice",
        &ConversationKey::Group(4),
        &Theme::default(),
    );
    assert_eq!(entries, vec![RenderEntry::LoadFailed]);
}

#[test]
fn read_status_carries_the_theme_accent() {
    let store = SqliteStore::open_in_memory("alice").expect("store");
    let id = store
        .insert_direct_message("alice", "bob", TS, "seen yet?")
        .expect("insert");
    store.set_status(id, "read").expect("set");

    let club = Theme {
        name: "club".to_string(),
        accent: "#FF8C42".to_string(),
    };
    let entries = load_transcript(&store, &store, "alice", &contact("bob"), &club);

    let RenderEntry::Message(entry) = &entries[0] else {
        panic!("expected a message entry");
    };
    assert_eq!(entry.status_glyph, GlyphKind::DoubleAccent);
    assert_eq!(entry.accent.as_deref(), Some("#FF8C42"));
}

#[test]
fn glyphs_follow_status_progression_for_outgoing_only() {
    let store = SqliteStore::open_in_memory("alice").expect("store");
    let sent = store
        .insert_direct_message("alice", "bob", TS, "one")
        .expect("insert");
    let delivered = store
        .insert_direct_message("alice", "bob", TS, "two")
        .expect("insert");
    store.set_status(delivered, "delivered").expect("set");
    let incoming = store
        .insert_direct_message("bob", "alice", TS, "three")
        .expect("insert");
    store.set_status(incoming, "read").expect("set");
    let _ = sent;

    let entries = load_transcript(&store, &store, "alice", &contact("bob"), &Theme::default());
    let glyphs: Vec<GlyphKind> = entries
        .iter()
        .map(|e| match e {
            RenderEntry::Message(m) => m.status_glyph,
            other => panic!("unexpected entry {other:?}"),
        })
        .collect();

    // Incoming entries never show a glyph regardless of stored status.
    assert_eq!(
        glyphs,
        vec![GlyphKind::SingleGray, GlyphKind::DoubleGray, GlyphKind::None]
    );
}

#[test]
fn group_transcript_always_labels_authors() {
    let store = SqliteStore::open_in_memory("alice").expect("store");
    let gid = store
        .create_group("book-club", None, Some("alice"), Some(TS))
        .expect("group");
    store
        .insert_group_message(gid, "alice", TS, "started it")
        .expect("insert");
    store
        .insert_group_message(gid, "bob", TS, "me too")
        .expect("insert");

    let entries = load_transcript(
        &store,
        &store,
        "alice",
        &ConversationKey::Group(gid),
        &Theme::default(),
    );

    let labels: Vec<Option<&str>> = entries
        .iter()
        .map(|e| match e {
            RenderEntry::Message(m) => m.author_label.as_deref(),
            other => panic!("unexpected entry {other:?}"),
        })
        .collect();
    assert_eq!(labels, vec![Some("You"), Some("bob")]);
}

#[test]
fn reloading_a_transcript_is_stable() {
    let store = SqliteStore::open_in_memory("alice").expect("store");
    store
        .insert_direct_message("bob", "alice", TS, "same every time")
        .expect("insert");

    let first = load_transcript(&store, &store, "alice", &contact("bob"), &Theme::default());
    let second = load_transcript(&store, &store, "alice", &contact("bob"), &Theme::default());
    assert_eq!(first, second);
}

#[test]
fn time_labels_come_from_the_store_timestamp() {
    assert_eq!(time_label("2026-08-30 09:41:27"), "09:41");
    assert_eq!(time_label("2026-01-02 23:05:00"), "23:05");
    // Malformed input degrades to the raw character slice.
    assert_eq!(time_label("not a timestamp!"), "tamp!");
    assert_eq!(time_label("short"), "");
}
