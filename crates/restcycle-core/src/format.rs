//! Display helpers shared by renderers and alert messages.

/// Format milliseconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_hms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// `done / total` as a percentage clamped to 0.0..=100.0.
///
/// A zero total counts as complete.
pub fn progress_pct(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done as f64 / total as f64 * 100.0).min(100.0)
}
