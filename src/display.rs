//! Colored CLI display utilities.
//!
//! Peer events go to stdout as JSON lines so the output can be piped; status
//! lines go to stderr.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::blocks::{ProcessExit, UpdateCommand};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum length in characters, adding ellipsis if
/// truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Print a peer event as one JSON line on stdout.
pub fn print_event(event: &serde_json::Value) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{event}");
    let _ = stdout.flush();
}

/// Print peer start information.
pub fn print_peer_start(pid: Option<u32>, args: &[String]) {
    eprintln!(
        "{} {} pid={} {}",
        timestamp().dimmed(),
        "[PEER]".blue().bold(),
        pid.map_or_else(|| "?".to_string(), |p| p.to_string()).cyan(),
        truncate(&args.join(" "), DEFAULT_MAX_LEN).dimmed()
    );
}

/// Print an update sent to the peer.
pub fn print_update(update: &UpdateCommand) {
    let line = update.encode_line().unwrap_or_default();
    eprintln!(
        "{} {} {}",
        timestamp().dimmed(),
        "[UPDATE]".magenta().bold(),
        truncate(line.trim_end(), DEFAULT_MAX_LEN)
    );
}

/// Print peer exit information.
pub fn print_peer_exit(exit: &ProcessExit) {
    let ts = timestamp();
    match exit.status {
        Some(status) if status.success() => eprintln!(
            "{} {} Peer exited",
            ts.dimmed(),
            "[PEER]".blue().bold()
        ),
        Some(status) => eprintln!(
            "{} {} Peer exited with {}",
            ts.dimmed(),
            "[PEER]".red().bold(),
            status.to_string().red()
        ),
        None => eprintln!(
            "{} {} Peer exited, status unknown",
            ts.dimmed(),
            "[PEER]".yellow().bold()
        ),
    }
}

/// Print a notice that the user interrupted the session.
pub fn print_interrupted() {
    eprintln!(
        "{} {} Interrupted, terminating peer",
        timestamp().dimmed(),
        "[PEER]".yellow().bold()
    );
}
