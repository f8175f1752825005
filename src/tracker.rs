//! Status progress tracker.
//!
//! Lets a sender see their own messages progress from sent to delivered to
//! read: each cycle asks the store how many messages to the active peer
//! have progressed, and any positive count triggers a full transcript
//! reload.  There is deliberately no delta tracking against a previous
//! count — a stable positive count reloads every cycle.  Rendering is pure,
//! so the redundant reloads are harmless, and suppressing them would change
//! observable behavior.

use crate::render::{load_transcript, Theme};
use crate::session::{ConversationKey, CoreEvent, EventSink, SessionState};
use crate::store::{Decryptor, MessageStore};

/// Reference status-poll period.
pub const STATUS_POLL_INTERVAL_SECS: u64 = 10;

/// Whether the active one-to-one conversation needs a reload because some
/// sent message has progressed beyond `Sent`.
///
/// Returns `false` when no one-to-one conversation is active and on query
/// failure; a transient failure just suppresses the refresh for this cycle.
pub fn check_status_progress<S: MessageStore + ?Sized>(
    store: &S,
    session: &SessionState,
) -> bool {
    let Some(contact) = session.active_contact() else {
        return false;
    };
    match store.fetch_status_progress_count(&session.identity, contact) {
        Ok(count) => count > 0,
        Err(e) => {
            crate::plog!("status: progress query failed, skipping cycle: {e}");
            false
        }
    }
}

/// Run one status cycle: reload and republish the active transcript when
/// [`check_status_progress`] says so.
pub fn status_tick<S, D, E>(
    store: &S,
    decryptor: &D,
    session: &SessionState,
    theme: &Theme,
    sink: &E,
) -> bool
where
    S: MessageStore + ?Sized,
    D: Decryptor + ?Sized,
    E: EventSink + ?Sized,
{
    if !check_status_progress(store, session) {
        return false;
    }
    let Some(contact) = session.active_contact() else {
        return false;
    };
    let key = ConversationKey::Contact(contact.to_string());
    let entries = load_transcript(store, decryptor, &session.identity, &key, theme);
    sink.emit(CoreEvent::TranscriptReady {
        conversation: key,
        entries,
    });
    true
}
