//! Session-level header figures: current lap, track status and the clock.

use serde::Serialize;
use std::time::Duration;

use crate::derive::DerivedCompetitor;
use crate::format::format_countdown;
use crate::session::SessionContext;
use crate::store::Status;
use crate::types::{Timestamp, TrackStatusRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LapProgress {
    Lap(u32),
    NotStarted,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionClock {
    Remaining { seconds: u64 },
    Finished,
}

impl SessionClock {
    pub fn label(&self) -> String {
        match self {
            SessionClock::Remaining { seconds } => format_countdown(Duration::from_secs(*seconds)),
            SessionClock::Finished => "Finished".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub current_lap: LapProgress,
    pub total_laps: Option<u32>,
    pub track_status: String,
    pub clock: SessionClock,
    /// Still polling after this summary.
    pub live: bool,
    /// The declared end passed during this cycle; polling must stop.
    pub session_ended: bool,
}

impl SessionSummary {
    /// `"23 / 57"`, `"0"`, `"--"`.
    pub fn laps_label(&self) -> String {
        let current = match self.current_lap {
            LapProgress::Lap(n) => n.to_string(),
            LapProgress::NotStarted => "0".to_string(),
            LapProgress::Finished => "--".to_string(),
        };
        match self.total_laps {
            Some(total) => format!("{current} / {total}"),
            None => current,
        }
    }
}

/// Build the header for one cycle. `rows` may be empty (total fetch failure);
/// the clock still advances.
pub fn summarize(
    track_status: &[TrackStatusRecord],
    rows: &[DerivedCompetitor],
    ctx: &SessionContext,
    live: bool,
    now: Timestamp,
) -> SessionSummary {
    let session_ended = live && ctx.session.date_end.map_or(false, |end| end <= now);
    let still_live = live && !session_ended;

    let clock = match (still_live, ctx.session.date_end) {
        (true, Some(end)) => SessionClock::Remaining {
            seconds: (end - now).num_seconds().max(0) as u64,
        },
        _ => SessionClock::Finished,
    };

    let max_lap = rows
        .iter()
        .filter(|r| r.status == Status::Active)
        .filter_map(|r| r.current_lap)
        .filter(|lap| *lap > 0)
        .max();
    let current_lap = match (max_lap, still_live) {
        (Some(lap), _) => LapProgress::Lap(lap),
        (None, true) => LapProgress::NotStarted,
        (None, false) => LapProgress::Finished,
    };

    let track_status = track_status
        .last()
        .and_then(|s| s.label())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if still_live { "Unknown" } else { "Finished" }.to_string()
        });

    SessionSummary {
        current_lap,
        total_laps: ctx.total_laps,
        track_status,
        clock,
        live: still_live,
        session_ended,
    }
}
