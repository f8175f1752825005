//! Timestamped logging with source locations and ANSI colour support.
//!
//! Provides the [`plog!`] macro for consistent log output in the format:
//!
//! ```text
//! 2026-08-30T14:02:11.000 - src/sync.rs:87 - poll: fetched 3 message(s)
//! ```
//!
//! Contact names get a deterministic colour based on their content so the
//! same peer is always printed the same way; message ids are printed in a
//! fixed colour.  Lines go to stderr by default; [`set_writer`] redirects
//! output to any `Write` implementor and disables colour codes.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};

use time::macros::format_description;
use time::OffsetDateTime;

static COLOUR_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_WRITER: LazyLock<Mutex<Box<dyn Write + Send>>> =
    LazyLock::new(|| Mutex::new(Box::new(io::stderr())));

/// Initialize logging. Call once at startup; detects whether stderr is a
/// colour-capable terminal.
pub fn init() {
    COLOUR_ENABLED.store(io::stderr().is_terminal(), Ordering::Relaxed);
}

/// Replace the log writer.  All subsequent [`plog!`] output goes to `w`.
/// Colour codes are disabled for custom writers.
pub fn set_writer(w: Box<dyn Write + Send>) {
    COLOUR_ENABLED.store(false, Ordering::Relaxed);
    if let Ok(mut writer) = LOG_WRITER.lock() {
        *writer = w;
    }
}

/// Whether ANSI colour output is currently enabled.
pub fn colour_enabled() -> bool {
    COLOUR_ENABLED.load(Ordering::Relaxed)
}

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

const CONTACT_COLOURS: &[&str] = &[
    "\x1b[91m", // bright red
    "\x1b[92m", // bright green
    "\x1b[94m", // bright blue
    "\x1b[95m", // bright magenta
    "\x1b[96m", // bright cyan
    "\x1b[33m", // yellow
];

fn hash_colour(name: &str) -> &'static str {
    let hash: u32 = name
        .bytes()
        .fold(7u32, |acc, b| acc.wrapping_mul(131).wrapping_add(b as u32));
    CONTACT_COLOURS[(hash as usize) % CONTACT_COLOURS.len()]
}

/// Format a contact name with a consistent per-name colour.
pub fn contact(name: &str) -> String {
    if colour_enabled() {
        let colour = hash_colour(name);
        format!("{colour}{name}{RESET}")
    } else {
        name.to_string()
    }
}

const MSG_ID_COLOUR: &str = "\x1b[93m"; // bright yellow

/// Format a store-assigned message id as `m-<id>`.
pub fn message_id(id: i64) -> String {
    if colour_enabled() {
        format!("{MSG_ID_COLOUR}m-{id}{RESET}")
    } else {
        format!("m-{id}")
    }
}

const LOG_TS_FORMAT: &[time::format_description::FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
);

/// Current wall-clock time as `YYYY-MM-DDTHH:MM:SS.mmm` (UTC).
pub fn format_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&LOG_TS_FORMAT)
        .unwrap_or_default()
}

/// Write a single log line to the current writer.
///
/// Called by the [`plog!`] macro; not intended for direct use.
pub fn emit(file: &str, line: u32, msg: &str) {
    let ts = format_timestamp();
    let formatted = if colour_enabled() {
        format!("{DIM}{ts}{RESET} {DIM}{file}:{line}{RESET} {msg}")
    } else {
        format!("{ts} - {file}:{line} - {msg}")
    };
    if let Ok(mut writer) = LOG_WRITER.lock() {
        let _ = writeln!(*writer, "{formatted}");
    }
}

/// Emit a log line with timestamp and source location.
///
/// ```ignore
/// plog!("poll: fetched {} message(s)", count);
/// plog!("poll: new message from {}", logging::contact(&sender));
/// ```
#[macro_export]
macro_rules! plog {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*));
    }};
}
