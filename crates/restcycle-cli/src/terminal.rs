//! Terminal implementations of the core's output ports.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use restcycle_core::{format_hms, AccountId, AccountSnapshot, Notifier, PortError, Renderer, SoundPlayer};

/// One status line per account row.
pub fn status_line(s: &AccountSnapshot) -> String {
    let rest = if s.resting() {
        format_hms(s.rest_remaining_ms)
    } else {
        "-".to_string()
    };
    format!(
        "{:<10} {:<8} {:>9} {:>9} {:>9} {:>9} {:>9} {:>5.1}%",
        s.id.to_string(),
        s.status.to_string(),
        format_hms(s.total_active_ms),
        format_hms(s.goal_remaining_ms),
        format_hms(s.session_elapsed_ms),
        format_hms(s.time_to_next_rest_ms),
        rest,
        s.goal_progress_pct,
    )
}

pub fn status_header() -> String {
    format!(
        "{:<10} {:<8} {:>9} {:>9} {:>9} {:>9} {:>9} {:>6}",
        "account", "status", "total", "remaining", "session", "next rest", "rest left", "goal"
    )
}

/// Renders to stdout only in verbose mode; otherwise renders are traced.
pub struct TerminalRenderer {
    verbose: bool,
}

impl TerminalRenderer {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, id: AccountId, snapshot: &AccountSnapshot) {
        tracing::trace!(account = %id, status = %snapshot.status, total = snapshot.total_active_ms, "render");
        if self.verbose {
            write_status(&mut std::io::stdout().lock(), id, snapshot);
        }
    }
}

/// A closed or broken stdout loses the line but never the scheduler task.
fn write_status(out: &mut impl Write, id: AccountId, snapshot: &AccountSnapshot) {
    if let Err(e) = writeln!(out, "{}", status_line(snapshot)).and_then(|_| out.flush()) {
        tracing::warn!(account = %id, error = %e, "status line dropped");
    }
}

pub struct BannerNotifier;

impl Notifier for BannerNotifier {
    fn notify(&self, message: &str) -> Result<(), PortError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "*** {message} ***")
            .and_then(|_| out.flush())
            .map_err(|e| PortError::Unavailable {
                port: "banner",
                message: e.to_string(),
            })
    }
}

/// Terminal bell on stderr. Volume 0 mutes it.
pub struct BellPlayer {
    volume: Arc<AtomicU32>,
}

impl BellPlayer {
    pub fn new(volume: Arc<AtomicU32>) -> Self {
        Self { volume }
    }
}

impl SoundPlayer for BellPlayer {
    fn play_sound(&self) -> Result<(), PortError> {
        if self.volume.load(Ordering::Relaxed) == 0 {
            return Ok(());
        }
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")
            .and_then(|_| err.flush())
            .map_err(|e| PortError::Unavailable {
                port: "sound",
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restcycle_core::{Account, AccountSettings};

    #[test]
    fn status_line_shows_rest_only_while_resting() {
        let snapshot = Account::new(AccountId(1), AccountSettings::default()).snapshot();
        let line = status_line(&snapshot);
        assert!(line.starts_with("account1"));
        assert!(line.contains("idle"));
        assert!(line.contains("08:00:00"));
        assert!(line.contains(" - "));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn status_write_failure_is_swallowed() {
        let snapshot = Account::new(AccountId(2), AccountSettings::default()).snapshot();
        write_status(&mut ClosedPipe, AccountId(2), &snapshot);

        let mut buf = Vec::new();
        write_status(&mut buf, AccountId(2), &snapshot);
        assert!(String::from_utf8(buf).unwrap().starts_with("account2"));
    }

    #[test]
    fn muted_bell_is_silent_success() {
        let player = BellPlayer::new(Arc::new(AtomicU32::new(0)));
        assert!(player.play_sound().is_ok());
        assert!(player.vibrate().is_err());
    }
}
