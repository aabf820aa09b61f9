//! Formatting helpers for the countdown and cooldown messages.

use chrono::TimeDelta;

/// Seconds left below which the countdown is shown as a warning.
pub const WARNING_SECONDS: u64 = 180;
/// Seconds left below which the countdown is shown as critical.
pub const CRITICAL_SECONDS: u64 = 60;

/// How urgent the remaining time looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerBand {
    Normal,
    Warning,
    Critical,
}

impl TimerBand {
    pub fn for_remaining(seconds: u64) -> Self {
        if seconds < CRITICAL_SECONDS {
            TimerBand::Critical
        } else if seconds < WARNING_SECONDS {
            TimerBand::Warning
        } else {
            TimerBand::Normal
        }
    }
}

/// `m:ss`, e.g. `9:05`.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// `Hh Mm` until the next attempt, or `None` once the wait is over.
pub fn format_wait(remaining: TimeDelta) -> Option<String> {
    let seconds = remaining.num_seconds();
    if seconds <= 0 {
        return None;
    }
    Some(format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60))
}
