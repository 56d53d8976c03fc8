//! Display strings for the board and the sinks that receive each painted board.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::derive::{DerivedCompetitor, LastLap, PersonalBest, PositionDelta};
use crate::format::format_time;
use crate::session::SessionHeader;
use crate::store::Status;
use crate::summary::SessionSummary;

const UNKNOWN_TIME: &str = "--:--:--";

/// Receives one fully derived board per cycle. Must not mutate its input and
/// must tolerate being painted the same board twice.
pub trait RenderSink: Send + Sync {
    fn paint(&self, board: &Board);
}

// ---------- Display records ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TyreCategory {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Unknown,
}

impl TyreCategory {
    pub fn from_label(compound: &str) -> Self {
        let c = compound.trim().to_ascii_lowercase();
        if c.starts_with("soft") {
            TyreCategory::Soft
        } else if c.starts_with("medium") {
            TyreCategory::Medium
        } else if c.starts_with("hard") {
            TyreCategory::Hard
        } else if c.starts_with("inter") {
            TyreCategory::Intermediate
        } else if c.starts_with("wet") {
            TyreCategory::Wet
        } else {
            TyreCategory::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub driver_number: u32,
    pub name: String,
    pub acronym: String,
    pub team: String,
    pub team_colour: String,
    pub status: Status,
    pub position: String,
    /// First rank seen this session.
    pub start_position: Option<u32>,
    pub drs: String,
    pub compound: String,
    pub tyre: TyreCategory,
    pub laps_on_set: String,
    pub pit_stops: String,
    pub position_delta: String,
    pub gap: String,
    pub gap_secondary: Option<String>,
    pub last_lap: String,
    pub personal_best: String,
}

fn position_label(row: &DerivedCompetitor) -> String {
    match (row.rank, row.status) {
        (Some(rank), _) => rank.to_string(),
        (None, Status::Out) => "OUT".to_string(),
        (None, _) => "--".to_string(),
    }
}

fn delta_label(row: &DerivedCompetitor) -> String {
    if row.status == Status::Out {
        return "OUT".to_string();
    }
    match row.position_delta {
        PositionDelta::Gained(n) => format!("▲{n}"),
        PositionDelta::Lost(n) => format!("▼{n}"),
        PositionDelta::Unchanged | PositionDelta::NotApplicable => "-".to_string(),
    }
}

fn last_lap_label(last: LastLap) -> String {
    match last {
        LastLap::Time(s) => format_time(s, false),
        LastLap::OutLap => "OUTLAP".to_string(),
        LastLap::Retired => "OUT".to_string(),
        LastLap::Unknown => UNKNOWN_TIME.to_string(),
    }
}

fn personal_best_label(best: PersonalBest) -> String {
    match best {
        PersonalBest::Time(s) => format_time(s, false),
        PersonalBest::NotApplicable => "N/A".to_string(),
        PersonalBest::Unknown => UNKNOWN_TIME.to_string(),
    }
}

impl From<&DerivedCompetitor> for DisplayRecord {
    fn from(row: &DerivedCompetitor) -> Self {
        let compound = row
            .tyre
            .compound
            .clone()
            .unwrap_or_else(|| "N/A".to_string());
        Self {
            driver_number: row.driver_number(),
            name: row.identity.display_name(),
            acronym: row.identity.acronym().to_string(),
            team: row.identity.team().to_string(),
            team_colour: row.identity.colour().to_string(),
            status: row.status,
            position: position_label(row),
            start_position: row.first_known_rank,
            drs: row.drs.label().to_string(),
            tyre: TyreCategory::from_label(&compound),
            compound,
            laps_on_set: row
                .tyre
                .laps_on_current_set
                .map_or_else(|| "--".to_string(), |n| format!("L: {n}")),
            pit_stops: row
                .tyre
                .pit_stops
                .map_or_else(|| "-".to_string(), |n| format!("P: {n}")),
            position_delta: delta_label(row),
            gap: row.gap.primary.render(),
            gap_secondary: row.gap.secondary.clone(),
            last_lap: last_lap_label(row.last_lap),
            personal_best: personal_best_label(row.personal_best),
        }
    }
}

// ---------- Board ----------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub header: SessionHeader,
    pub summary: SessionSummary,
    pub laps_label: String,
    pub clock_label: String,
    pub rows: Vec<DisplayRecord>,
}

impl Board {
    pub fn new(header: SessionHeader, summary: SessionSummary, rows: &[DerivedCompetitor]) -> Self {
        Self {
            laps_label: summary.laps_label(),
            clock_label: summary.clock.label(),
            header,
            summary,
            rows: rows.iter().map(DisplayRecord::from).collect(),
        }
    }
}

// ---------- Sinks ----------

/// Keeps the latest board for HTTP readers and fans every new one out to
/// WebSocket subscribers.
pub struct BoardHub {
    latest: RwLock<Option<Arc<Board>>>,
    tx: broadcast::Sender<Arc<Board>>,
}

impl BoardHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: RwLock::new(None),
            tx,
        }
    }

    pub fn latest(&self) -> Option<Arc<Board>> {
        self.latest.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Board>> {
        self.tx.subscribe()
    }
}

impl Default for BoardHub {
    fn default() -> Self {
        Self::new(16)
    }
}

impl RenderSink for BoardHub {
    fn paint(&self, board: &Board) {
        let board = Arc::new(board.clone());
        *self.latest.write() = Some(Arc::clone(&board));
        // No subscribers is fine.
        let _ = self.tx.send(board);
    }
}

/// Writes each board to the tracing output.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn paint(&self, board: &Board) {
        info!(
            session_key = board.header.session_key,
            title = %board.header.title,
            lap = %board.laps_label,
            track_status = %board.summary.track_status,
            clock = %board.clock_label,
            competitors = board.rows.len(),
            "board"
        );
        for row in &board.rows {
            debug!(
                "{:>3} {:<4} {:>9} {:>10} {:>9} {:>4} {} {}",
                row.position,
                row.acronym,
                row.gap,
                row.last_lap,
                row.personal_best,
                row.drs,
                row.compound,
                row.laps_on_set
            );
        }
    }
}
