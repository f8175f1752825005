//! Incremental conversation synchronizer.
//!
//! One poll cycle fetches every message addressed to the local identity
//! with an id above the session cursor, in store-assigned ascending order,
//! and for each one: advances the cursor, acknowledges delivery, raises an
//! arrival event, and refreshes the visible transcript when the sender is
//! the active one-to-one peer.
//!
//! A failed fetch aborts the cycle with no state change — the next
//! scheduled poll retries from the same cursor.  Transient store failures
//! never surface to the user from here.

use crate::logging;
use crate::render::{load_transcript, Theme};
use crate::session::{ConversationKey, CoreEvent, EventSink, SessionState};
use crate::store::{Decryptor, MessageStore};

/// Reference poll period.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// What one poll cycle did.
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    /// Rows returned by the store for this cycle.
    pub fetched: usize,
    /// Ids acknowledged as delivered this cycle, in processing order.
    pub delivered: Vec<i64>,
    /// Whether the active transcript was refreshed.
    pub refreshed: bool,
}

/// Run one poll cycle against the store.
///
/// The cursor in `session` only moves forward, and only on rows actually
/// returned by a successful fetch, so `mark_delivered` fires at most once
/// per message id per session.  An individual `mark_delivered` failure is
/// logged and otherwise ignored; the cursor has already passed the id and
/// the store call is at-least-once by design.
pub fn poll_new_messages<S, D, E>(
    store: &S,
    decryptor: &D,
    session: &mut SessionState,
    theme: &Theme,
    sink: &E,
) -> PollOutcome
where
    S: MessageStore + ?Sized,
    D: Decryptor + ?Sized,
    E: EventSink + ?Sized,
{
    let rows = match store.fetch_new_messages(&session.identity, session.last_checked_message_id)
    {
        Ok(rows) => rows,
        Err(e) => {
            crate::plog!("poll: fetch failed, skipping cycle: {e}");
            return PollOutcome::default();
        }
    };

    let mut outcome = PollOutcome {
        fetched: rows.len(),
        ..PollOutcome::default()
    };

    for row in rows {
        if row.id > session.last_checked_message_id {
            session.last_checked_message_id = row.id;
        }

        if let Err(e) = store.mark_delivered(row.id) {
            crate::plog!(
                "poll: mark_delivered failed for {}: {e}",
                logging::message_id(row.id)
            );
        }
        outcome.delivered.push(row.id);

        crate::plog!(
            "poll: new message {} from {}",
            logging::message_id(row.id),
            logging::contact(&row.sender)
        );
        sink.emit(CoreEvent::MessageArrived {
            sender: row.sender.clone(),
            timestamp: row.timestamp.clone(),
        });

        if session.active_contact() == Some(row.sender.as_str()) {
            let key = ConversationKey::Contact(row.sender.clone());
            let entries = load_transcript(store, decryptor, &session.identity, &key, theme);
            sink.emit(CoreEvent::TranscriptReady {
                conversation: key,
                entries,
            });
            outcome.refreshed = true;
        }
    }

    outcome
}
