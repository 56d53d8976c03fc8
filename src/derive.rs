//! Per-cycle derived fields for every ranked competitor.
//!
//! Everything here is recomputed from the [`StateStore`] each cycle; nothing
//! is written back. Fields that need the whole field of competitors (leader
//! laps, the car-ahead context) are resolved by walking the ordered list once
//! with an explicit [`LapsDownContext`] accumulator.

use crate::format::{format_gap, laps_annotation};
use crate::ordering;
use crate::store::{CompetitorRecord, Identity, RankHistory, StateStore, Status};
use crate::types::{DriverNumber, GapValue, IntervalRecord};

// ---------- DRS ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drs {
    Open,
    Available,
    Off,
    Disabled,
    NotApplicable,
}

impl Drs {
    /// Decode the telemetry DRS code. 10/12/14 are the open-flap states, 8 is
    /// "eligible in the next zone".
    pub fn decode(code: Option<i32>, status: Status) -> Self {
        match (status, code) {
            (Status::Out, _) => Drs::NotApplicable,
            (_, None) => Drs::Disabled,
            (_, Some(10 | 12 | 14)) => Drs::Open,
            (_, Some(8)) => Drs::Available,
            (_, Some(_)) => Drs::Off,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Drs::Open => "OPEN",
            Drs::Available => "AVAIL",
            Drs::Off => "OFF",
            Drs::Disabled => "---",
            Drs::NotApplicable => "N/A",
        }
    }
}

// ---------- Tyres ----------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TyreSummary {
    pub compound: Option<String>,
    pub laps_on_current_set: Option<u32>,
    pub pit_stops: Option<u32>,
}

impl TyreSummary {
    fn from_record(rec: &CompetitorRecord) -> Self {
        let Some(stint) = rec.latest_stint() else {
            return Self::default();
        };
        let current_lap = rec.latest_lap().and_then(|l| l.lap_number);
        let laps_on_current_set = match (current_lap, stint.lap_start) {
            (Some(lap), Some(start)) => {
                let on_set = i64::from(lap) - i64::from(start) + 1;
                if on_set > 0 {
                    Some(on_set as u32)
                } else {
                    stint.tyre_age_at_start
                }
            }
            _ => stint.tyre_age_at_start,
        };
        Self {
            compound: stint.compound.clone(),
            laps_on_current_set,
            pit_stops: stint.stint_number.map(|n| n.saturating_sub(1)),
        }
    }
}

// ---------- Gap ----------

#[derive(Debug, Clone, PartialEq)]
pub enum GapDisplay {
    /// Rank 1: no gap.
    Leader,
    Seconds(f64),
    /// Lap-encoded text, shown verbatim.
    Laps(String),
    Retired,
    Unknown,
}

impl GapDisplay {
    fn from_value(value: &GapValue) -> Self {
        match value {
            GapValue::Seconds(s) => GapDisplay::Seconds(*s),
            GapValue::Laps(text) => GapDisplay::Laps(text.clone()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            GapDisplay::Leader => String::new(),
            GapDisplay::Seconds(s) => format_gap(&GapValue::Seconds(*s), true),
            GapDisplay::Laps(text) => text.clone(),
            GapDisplay::Retired => "OUT".to_string(),
            GapDisplay::Unknown => "--".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub primary: GapDisplay,
    /// `+N LAP(S)` when the competitor is laps down.
    pub secondary: Option<String>,
}

impl Gap {
    fn only(primary: GapDisplay) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }
}

/// What one competitor contributes to the car-ahead fold.
#[derive(Debug, Clone, Copy)]
pub struct GapInputs<'a> {
    pub status: Status,
    pub rank: Option<u32>,
    pub laps_completed: Option<u32>,
    pub interval: Option<&'a IntervalRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GapOutcome {
    pub laps_down: u32,
    pub gap: Gap,
}

/// Accumulator threaded through the ordered competitor list.
///
/// `inherited` is the laps-down annotation established by the cars ahead; a
/// competitor whose own completed-lap count is unknown shows it as its
/// secondary gap value. Rank 1 always clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapsDownContext {
    pub leader_laps: Option<u32>,
    pub inherited: Option<String>,
}

impl LapsDownContext {
    pub fn new(leader_laps: Option<u32>) -> Self {
        Self {
            leader_laps,
            inherited: None,
        }
    }

    pub fn step(self, input: &GapInputs<'_>) -> (Self, GapOutcome) {
        let is_leader = input.rank == Some(1);
        let laps_down = match (is_leader, self.leader_laps, input.laps_completed) {
            (false, Some(leader), Some(own)) => leader.saturating_sub(own),
            _ => 0,
        };

        if input.status == Status::Out {
            let outcome = GapOutcome {
                laps_down,
                gap: Gap::only(GapDisplay::Retired),
            };
            return (self, outcome);
        }

        if is_leader {
            let next = Self {
                leader_laps: self.leader_laps,
                inherited: None,
            };
            let outcome = GapOutcome {
                laps_down: 0,
                gap: Gap::only(GapDisplay::Leader),
            };
            return (next, outcome);
        }

        let gap_to_leader = input.interval.and_then(|r| r.gap_to_leader.as_ref());
        let to_car_ahead = input.interval.and_then(|r| r.interval.as_ref());

        // Interval to the car ahead first (verbatim when lap-encoded), then
        // gap to the leader.
        let primary = match (to_car_ahead, gap_to_leader) {
            (Some(v), _) | (None, Some(v)) => GapDisplay::from_value(v),
            (None, None) => GapDisplay::Unknown,
        };

        let own = (laps_down > 0).then(|| laps_annotation(laps_down));
        let secondary = match (&own, input.laps_completed) {
            (Some(annotation), _) => Some(annotation.clone()),
            (None, None) => self.inherited.clone(),
            (None, Some(_)) => None,
        };

        let inherited = match gap_to_leader {
            Some(GapValue::Laps(text)) => Some(text.clone()),
            _ if own.is_some() => own,
            _ if input.laps_completed.is_some() => None,
            _ => self.inherited,
        };

        let next = Self {
            leader_laps: self.leader_laps,
            inherited,
        };
        let outcome = GapOutcome {
            laps_down,
            gap: Gap { primary, secondary },
        };
        (next, outcome)
    }
}

// ---------- Position delta & lap times ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionDelta {
    Gained(u32),
    Lost(u32),
    Unchanged,
    NotApplicable,
}

impl PositionDelta {
    pub fn from_history(history: Option<RankHistory>) -> Self {
        let Some(h) = history else {
            return PositionDelta::NotApplicable;
        };
        match h.first.cmp(&h.last) {
            std::cmp::Ordering::Greater => PositionDelta::Gained(h.first - h.last),
            std::cmp::Ordering::Less => PositionDelta::Lost(h.last - h.first),
            std::cmp::Ordering::Equal => PositionDelta::Unchanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LastLap {
    Time(f64),
    OutLap,
    Retired,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PersonalBest {
    Time(f64),
    NotApplicable,
    Unknown,
}

fn last_lap(rec: &CompetitorRecord) -> LastLap {
    let lap = rec.latest_lap();
    let duration = lap.and_then(|l| l.lap_duration).filter(|d| *d > 0.0);
    match rec.status() {
        Status::Out => duration.map_or(LastLap::Retired, LastLap::Time),
        _ if lap.and_then(|l| l.is_pit_out_lap) == Some(true) => LastLap::OutLap,
        _ => duration.map_or(LastLap::Unknown, LastLap::Time),
    }
}

fn personal_best(rec: &CompetitorRecord) -> PersonalBest {
    match (rec.personal_best(), rec.status()) {
        (Some(best), _) => PersonalBest::Time(best),
        (None, Status::Out) => PersonalBest::NotApplicable,
        (None, _) => PersonalBest::Unknown,
    }
}

// ---------- Derived row ----------

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedCompetitor {
    pub identity: Identity,
    pub status: Status,
    pub rank: Option<u32>,
    pub first_known_rank: Option<u32>,
    pub current_lap: Option<u32>,
    pub laps_completed: Option<u32>,
    pub drs: Drs,
    pub tyre: TyreSummary,
    pub laps_down: u32,
    pub gap: Gap,
    pub position_delta: PositionDelta,
    pub last_lap: LastLap,
    pub personal_best: PersonalBest,
}

impl DerivedCompetitor {
    fn base(rec: &CompetitorRecord) -> Self {
        let status = rec.status();
        Self {
            identity: rec.identity().clone(),
            status,
            rank: rec.rank(),
            first_known_rank: rec.first_known_rank(),
            current_lap: rec.latest_lap().and_then(|l| l.lap_number),
            laps_completed: rec.total_laps_completed(),
            drs: Drs::decode(rec.latest_telemetry().and_then(|c| c.drs), status),
            tyre: TyreSummary::from_record(rec),
            laps_down: 0,
            gap: Gap::only(GapDisplay::Unknown),
            position_delta: PositionDelta::from_history(rec.rank_history()),
            last_lap: last_lap(rec),
            personal_best: personal_best(rec),
        }
    }

    pub fn driver_number(&self) -> DriverNumber {
        self.identity.driver_number
    }
}

/// Derive every `Active`/`Out` competitor, returned in presentation order.
pub fn compute(store: &StateStore) -> Vec<DerivedCompetitor> {
    let mut rows: Vec<DerivedCompetitor> = store
        .iter()
        .filter(|rec| rec.status().is_ranked())
        .map(DerivedCompetitor::base)
        .collect();
    ordering::sort(&mut rows);

    let leader_laps = rows
        .iter()
        .find(|r| r.status == Status::Active && r.rank == Some(1))
        .and_then(|r| r.laps_completed);

    let mut ctx = LapsDownContext::new(leader_laps);
    for row in rows.iter_mut() {
        let input = GapInputs {
            status: row.status,
            rank: row.rank,
            laps_completed: row.laps_completed,
            interval: store
                .get(row.driver_number())
                .and_then(|rec| rec.latest_interval()),
        };
        let (next, outcome) = ctx.step(&input);
        row.laps_down = outcome.laps_down;
        row.gap = outcome.gap;
        ctx = next;
    }

    rows
}
