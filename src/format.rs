//! Interpretation of time-like values shared by the engine and the display
//! layer: signed durations, lap-encoded gap text and session countdowns.

use std::time::Duration;

use crate::types::GapValue;

/// Values closer to zero than this carry no sign.
const SIGN_EPSILON_S: f64 = 0.0001;

/// Format a duration in seconds as `[-|+]MM:SS.mmm`.
///
/// Minutes are dropped under one minute (`SS.mmm`). Negative values always get
/// a `-`; positive values get a `+` only when `sign_if_positive` is set, which
/// is how "behind" is expressed for gaps.
///
/// # Arguments
/// * `seconds` - Duration in seconds, possibly negative
/// * `sign_if_positive` - Prefix positive values with `+`
pub fn format_time(seconds: f64, sign_if_positive: bool) -> String {
    if !seconds.is_finite() {
        return "--:--:--".to_string();
    }

    let sign = if seconds < -SIGN_EPSILON_S {
        "-"
    } else if sign_if_positive && seconds > SIGN_EPSILON_S {
        "+"
    } else {
        ""
    };

    let total_ms = (seconds.abs() * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if minutes == 0 {
        format!("{sign}{secs:02}.{millis:03}")
    } else {
        format!("{sign}{minutes:02}:{secs:02}.{millis:03}")
    }
}

pub fn format_gap(gap: &GapValue, sign_if_positive: bool) -> String {
    match gap {
        GapValue::Seconds(s) => format_time(*s, sign_if_positive),
        GapValue::Laps(text) => text.clone(),
    }
}

/// `+1 LAP`, `+3 LAPS`.
pub fn laps_annotation(laps_down: u32) -> String {
    if laps_down == 1 {
        "+1 LAP".to_string()
    } else {
        format!("+{laps_down} LAPS")
    }
}

/// `HH:MM:SS`, whole seconds, truncated.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
