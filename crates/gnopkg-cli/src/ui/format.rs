//! Formatting helpers for durations and load summaries.

use std::time::Duration;

use owo_colors::OwoColorize;

use super::colors_enabled;

/// Format a duration as `50ms`, `1.50s` or `2m 5s`.
///
/// ```
/// use std::time::Duration;
/// use gnopkg_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// `1 package`, `3 packages`.
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Print a one-line load summary to stderr.
pub fn print_load_summary(packages: usize, skipped: usize, elapsed: Duration) {
    let mut line = format!("Loaded {}", plural(packages, "package"));
    if skipped > 0 {
        line.push_str(&format!(", skipped {}", skipped));
    }
    let took = format!("in {}", format_duration(elapsed));

    if colors_enabled() {
        eprintln!("{} {} {}", "▸".blue(), line.bold(), took.dimmed());
    } else {
        eprintln!("▸ {} {}", line, took);
    }
}
