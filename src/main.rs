//! Demo CLI for the parley sync core.
//!
//! Runs a full session loop against a SQLite-backed reference store and
//! prints every core event as it arrives.  Line commands:
//!
//! ```text
//! /open <contact>     select a one-to-one conversation
//! /group <id>         select a group conversation
//! /cc a,b,c           set additional recipients for subsequent sends
//! /refresh            re-render the active conversation
//! /quit               exit
//! anything else       send as a message to the active conversation
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

use parley::plog;
use parley::render::{Alignment, RenderEntry, Theme};
use parley::runtime::{run_session, Command, RuntimeConfig};
use parley::session::{CoreEvent, SessionState};
use parley::status::GlyphKind;
use parley::storage::SqliteStore;
use parley::logging;

/// Conversation sync client over a shared SQLite message store.
///
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Local identity name [env: PARLEY_IDENTITY]
    #[arg(long, short = 'i')]
    identity: Option<String>,

    /// Path to the SQLite message store [env: PARLEY_STORE] [default: parley.db]
    #[arg(long, short = 's')]
    store: Option<PathBuf>,

    /// Use a throwaway in-memory store instead of a file.
    #[arg(long)]
    memory: bool,

    /// Theme name; "club" switches the read-checkmark accent.
    #[arg(long, default_value = "io")]
    theme: String,
}

fn theme_for(name: &str) -> Theme {
    match name {
        "club" => Theme {
            name: "club".to_string(),
            accent: "#FF8C42".to_string(),
        },
        _ => Theme::default(),
    }
}

fn glyph_text(glyph: GlyphKind) -> &'static str {
    match glyph {
        GlyphKind::None => "",
        GlyphKind::SingleGray => " ✓",
        GlyphKind::DoubleGray | GlyphKind::DoubleAccent => " ✓✓",
    }
}

fn print_transcript(entries: &[RenderEntry]) {
    for entry in entries {
        match entry {
            RenderEntry::Message(msg) => {
                let author = msg.author_label.as_deref().unwrap_or("");
                let line = format!(
                    "{} {} {}{}",
                    msg.time_label,
                    if author.is_empty() { "·" } else { author },
                    msg.display_text,
                    glyph_text(msg.status_glyph)
                );
                match msg.alignment {
                    Alignment::Outgoing => println!("{:>78}", line),
                    Alignment::Incoming => println!("{line}"),
                }
            }
            RenderEntry::Empty | RenderEntry::LoadFailed => {
                println!("-- {} --", entry.display_text());
            }
        }
    }
}

fn parse_line(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("/open ") {
        return Some(Command::SelectContact(rest.trim().to_string()));
    }
    if let Some(rest) = trimmed.strip_prefix("/group ") {
        return match rest.trim().parse::<i64>() {
            Ok(id) => Some(Command::SelectGroup(id)),
            Err(_) => {
                eprintln!("not a group id: {rest}");
                None
            }
        };
    }
    if let Some(rest) = trimmed.strip_prefix("/cc ") {
        let recipients = rest
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        return Some(Command::SetExtraRecipients(recipients));
    }
    match trimmed {
        "/refresh" => Some(Command::Refresh),
        "/quit" => Some(Command::Shutdown),
        _ if trimmed.starts_with('/') => {
            eprintln!("unknown command: {trimmed}");
            None
        }
        _ => Some(Command::Send(trimmed.to_string())),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let identity = cli
        .identity
        .or_else(|| std::env::var("PARLEY_IDENTITY").ok())
        .unwrap_or_default();
    let mut session = SessionState::new(identity)?;

    let store = if cli.memory {
        SqliteStore::open_in_memory(&session.identity)?
    } else {
        let path = cli
            .store
            .or_else(|| std::env::var("PARLEY_STORE").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("parley.db"));
        SqliteStore::open(&path, &session.identity)?
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(32);
    let (event_tx, mut event_rx) = broadcast::channel::<CoreEvent>(256);

    let printer = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match event {
                CoreEvent::MessageArrived { sender, timestamp } => {
                    println!("* new message from {} at {}", logging::contact(&sender), timestamp);
                }
                CoreEvent::TranscriptReady { conversation, entries } => {
                    println!("--- {conversation} ---");
                    print_transcript(&entries);
                }
                CoreEvent::SendCompleted { ok } => {
                    if !ok {
                        println!("! send failed, message kept for retry");
                    }
                }
            }
        }
    });

    let reader_tx = cmd_tx.clone();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let Some(cmd) = parse_line(&line) else { continue };
            let shutdown = matches!(cmd, Command::Shutdown);
            if reader_tx.send(cmd).await.is_err() || shutdown {
                break;
            }
        }
        // stdin closed: end the session.
        let _ = reader_tx.send(Command::Shutdown).await;
    });

    drop(cmd_tx);
    run_session(
        &store,
        &mut session,
        RuntimeConfig {
            theme: theme_for(&cli.theme),
            ..RuntimeConfig::default()
        },
        cmd_rx,
        event_tx,
    )
    .await;

    reader.abort();
    printer.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            plog!("fatal: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
