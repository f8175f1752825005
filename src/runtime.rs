//! Session runtime: one task that serializes the periodic polls and the
//! user-triggered actions.
//!
//! The loop is a `tokio::select!` over the sync interval, the status
//! interval, and a command channel.  Because every branch runs to
//! completion on the same task, the session fields keep their single-writer
//! discipline without locks, and transcript refreshes are published in
//! request order by construction.  Store calls are synchronous and
//! blocking, as in the reference design; a slow call simply delays the next
//! tick.

use std::cell::RefCell;
use std::time::Duration;

use time::macros::format_description;
use time::OffsetDateTime;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;

use crate::compose;
use crate::logging;
use crate::plog;
use crate::render::{load_transcript, RenderEntry, Theme};
use crate::session::{ConversationKey, CoreEvent, EventSink, SessionState};
use crate::store::{Decryptor, MessageSender, MessageStore};
use crate::sync::{self, POLL_INTERVAL_SECS};
use crate::tracker::{self, STATUS_POLL_INTERVAL_SECS};

/// User-triggered actions fed into the session loop.
#[derive(Debug, Clone)]
pub enum Command {
    /// Make a one-to-one conversation the active selection.  Marks it read
    /// and clears any additional recipients.
    SelectContact(String),
    /// Make a group conversation the active selection.
    SelectGroup(i64),
    /// Replace the additional-recipient list for subsequent sends.
    SetExtraRecipients(Vec<String>),
    /// Send a message to the active conversation.
    Send(String),
    /// Re-render the active conversation from the store.
    Refresh,
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub poll_interval: Duration,
    pub status_interval: Duration,
    pub theme: Theme,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            status_interval: Duration::from_secs(STATUS_POLL_INTERVAL_SECS),
            theme: Theme::default(),
        }
    }
}

/// Forwards events to the broadcast channel while keeping a copy of the
/// latest published transcript, so an optimistic send entry can be appended
/// to what is currently displayed.
struct ForwardingSink<'a> {
    events: &'a broadcast::Sender<CoreEvent>,
    transcript: &'a RefCell<Vec<RenderEntry>>,
}

impl EventSink for ForwardingSink<'_> {
    fn emit(&self, event: CoreEvent) {
        if let CoreEvent::TranscriptReady { ref entries, .. } = event {
            *self.transcript.borrow_mut() = entries.clone();
        }
        let _ = self.events.send(event);
    }
}

const CLOCK_LABEL_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[hour]:[minute]");

fn now_time_label() -> String {
    OffsetDateTime::now_utc()
        .format(&CLOCK_LABEL_FORMAT)
        .unwrap_or_default()
}

/// Drive one session until `Shutdown` (or the command channel closing).
///
/// `backend` provides all three capabilities; in production that is a
/// store/crypto bridge, in tests and the demo binary a
/// [`crate::storage::SqliteStore`].
pub async fn run_session<B>(
    backend: &B,
    session: &mut SessionState,
    config: RuntimeConfig,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<CoreEvent>,
) where
    B: MessageStore + Decryptor + MessageSender,
{
    let transcript = RefCell::new(Vec::new());
    let sink = ForwardingSink {
        events: &events,
        transcript: &transcript,
    };
    let mut extra_recipients: Vec<String> = Vec::new();

    let mut poll = tokio::time::interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut status = tokio::time::interval(config.status_interval);
    status.set_missed_tick_behavior(MissedTickBehavior::Delay);

    plog!("session: started for {}", logging::contact(&session.identity));

    loop {
        tokio::select! {
            _ = poll.tick() => {
                sync::poll_new_messages(backend, backend, session, &config.theme, &sink);
            }
            _ = status.tick() => {
                tracker::status_tick(backend, backend, session, &config.theme, &sink);
            }
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    Command::SelectContact(contact) => {
                        extra_recipients.clear();
                        if let Err(e) = backend.mark_conversation_read(&session.identity, &contact) {
                            plog!(
                                "select: mark_conversation_read failed for {}: {e}",
                                logging::contact(&contact)
                            );
                        }
                        session.active = Some(ConversationKey::Contact(contact));
                        publish_active(backend, session, &config.theme, &sink);
                    }
                    Command::SelectGroup(group_id) => {
                        extra_recipients.clear();
                        match backend.fetch_group_info(group_id) {
                            Ok(info) => plog!("select: group {} ({})", group_id, info.name),
                            Err(e) => plog!("select: group info unavailable for {group_id}: {e}"),
                        }
                        session.active = Some(ConversationKey::Group(group_id));
                        publish_active(backend, session, &config.theme, &sink);
                    }
                    Command::SetExtraRecipients(recipients) => {
                        plog!("compose: {} additional recipient(s)", recipients.len());
                        extra_recipients = recipients;
                    }
                    Command::Send(text) => {
                        let label = now_time_label();
                        match compose::send_message(
                            backend,
                            session.active.as_ref(),
                            &extra_recipients,
                            &text,
                            &label,
                        ) {
                            Ok(entry) => {
                                transcript.borrow_mut().push(entry);
                                if let Some(key) = session.active.clone() {
                                    let _ = events.send(CoreEvent::TranscriptReady {
                                        conversation: key,
                                        entries: transcript.borrow().clone(),
                                    });
                                }
                                let _ = events.send(CoreEvent::SendCompleted { ok: true });
                            }
                            Err(compose::SendError::Transport(e)) => {
                                plog!("send: failed: {e}");
                                let _ = events.send(CoreEvent::SendCompleted { ok: false });
                            }
                            Err(e) => {
                                // Precondition violation; nothing was sent
                                // and the input text is the caller's to keep.
                                plog!("send: {e}");
                            }
                        }
                    }
                    Command::Refresh => {
                        publish_active(backend, session, &config.theme, &sink);
                    }
                    Command::Shutdown => break,
                }
            }
        }
    }

    plog!("session: stopped for {}", logging::contact(&session.identity));
}

fn publish_active<B, E>(backend: &B, session: &SessionState, theme: &Theme, sink: &E)
where
    B: MessageStore + Decryptor,
    E: EventSink + ?Sized,
{
    let Some(key) = session.active.clone() else {
        return;
    };
    let entries = load_transcript(backend, backend, &session.identity, &key, theme);
    sink.emit(CoreEvent::TranscriptReady {
        conversation: key,
        entries,
    });
}
