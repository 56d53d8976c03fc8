//! Durable per-competitor state for one tracked session.
//!
//! # Merge order
//!
//! Each cycle's [`Snapshot`] is folded in a fixed order because later steps
//! read what earlier ones wrote:
//!
//! 1. identity (drivers)
//! 2. laps: history, personal best, completed-lap count, latest lap
//! 3. telemetry, latest by timestamp
//! 4. stints, highest stint number
//! 5. intervals, latest by timestamp
//! 6. positions: mark seen, latest by timestamp, `Active`, rank history
//! 7. retirement: `Active` competitors silent for longer than
//!    [`RETIREMENT_TIMEOUT_MS`] become `Out`
//!
//! # Status
//!
//! ```text
//!   Unknown ──position──► Active ──15 s without position──► Out (terminal)
//! ```
//!
//! Records are never removed during a session and a field is only ever
//! replaced by data at least as new, so an empty or partial snapshot cannot
//! erase anything. [`StateStore::reset`] is the only way to drop state.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::types::{
    CarDataRecord, DriverNumber, DriverRecord, IntervalRecord, LapRecord, PositionRecord,
    Snapshot, StintRecord, Timestamp,
};

/// Position silence after which an `Active` competitor is declared `Out`.
/// The boundary itself is still `Active`.
pub const RETIREMENT_TIMEOUT_MS: i64 = 15_000;

// ---------- Status ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Known from some stream but never seen in positions.
    Unknown,
    Active,
    /// Retired for the rest of the session. **Terminal.**
    Out,
}

impl Status {
    pub fn is_ranked(&self) -> bool {
        matches!(self, Status::Active | Status::Out)
    }
}

// ---------- Identity ----------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub driver_number: DriverNumber,
    pub full_name: Option<String>,
    pub name_acronym: Option<String>,
    pub team_name: Option<String>,
    pub team_colour: Option<String>,
}

impl Identity {
    fn placeholder(driver_number: DriverNumber) -> Self {
        Self {
            driver_number,
            full_name: None,
            name_acronym: None,
            team_name: None,
            team_colour: None,
        }
    }

    /// Take every field the detail record carries; keep the rest.
    fn refresh(&mut self, detail: &DriverRecord) {
        if let Some(v) = &detail.full_name {
            self.full_name = Some(v.clone());
        }
        if let Some(v) = &detail.name_acronym {
            self.name_acronym = Some(v.clone());
        }
        if let Some(v) = &detail.team_name {
            self.team_name = Some(v.clone());
        }
        if let Some(v) = &detail.team_colour {
            self.team_colour = Some(v.clone());
        }
    }

    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .unwrap_or_else(|| format!("Driver {}", self.driver_number))
    }

    pub fn acronym(&self) -> &str {
        self.name_acronym.as_deref().unwrap_or("N/A")
    }

    pub fn team(&self) -> &str {
        self.team_name.as_deref().unwrap_or("N/A")
    }

    pub fn colour(&self) -> &str {
        self.team_colour.as_deref().unwrap_or("333333")
    }
}

// ---------- Competitor record ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankHistory {
    pub first: u32,
    pub last: u32,
}

#[derive(Debug, Clone)]
pub struct CompetitorRecord {
    identity: Identity,
    status: Status,
    last_seen_active_at: Option<Timestamp>,
    lap_history: Vec<LapRecord>,
    latest_lap: Option<LapRecord>,
    personal_best: Option<f64>,
    total_laps_completed: Option<u32>,
    latest_position: Option<PositionRecord>,
    latest_telemetry: Option<CarDataRecord>,
    latest_stint: Option<StintRecord>,
    latest_interval: Option<IntervalRecord>,
    first_known_rank: Option<u32>,
    rank_history: Option<RankHistory>,
}

impl CompetitorRecord {
    fn new(driver_number: DriverNumber) -> Self {
        Self {
            identity: Identity::placeholder(driver_number),
            status: Status::Unknown,
            last_seen_active_at: None,
            lap_history: Vec::new(),
            latest_lap: None,
            personal_best: None,
            total_laps_completed: None,
            latest_position: None,
            latest_telemetry: None,
            latest_stint: None,
            latest_interval: None,
            first_known_rank: None,
            rank_history: None,
        }
    }

    pub fn driver_number(&self) -> DriverNumber {
        self.identity.driver_number
    }
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn last_seen_active_at(&self) -> Option<Timestamp> {
        self.last_seen_active_at
    }
    pub fn lap_history(&self) -> &[LapRecord] {
        &self.lap_history
    }
    pub fn latest_lap(&self) -> Option<&LapRecord> {
        self.latest_lap.as_ref()
    }
    pub fn personal_best(&self) -> Option<f64> {
        self.personal_best
    }
    pub fn total_laps_completed(&self) -> Option<u32> {
        self.total_laps_completed
    }
    pub fn latest_position(&self) -> Option<&PositionRecord> {
        self.latest_position.as_ref()
    }
    pub fn latest_telemetry(&self) -> Option<&CarDataRecord> {
        self.latest_telemetry.as_ref()
    }
    pub fn latest_stint(&self) -> Option<&StintRecord> {
        self.latest_stint.as_ref()
    }
    pub fn latest_interval(&self) -> Option<&IntervalRecord> {
        self.latest_interval.as_ref()
    }
    pub fn first_known_rank(&self) -> Option<u32> {
        self.first_known_rank
    }
    pub fn rank_history(&self) -> Option<RankHistory> {
        self.rank_history
    }

    /// Current race position, if any position was ever seen.
    pub fn rank(&self) -> Option<u32> {
        self.latest_position.as_ref().and_then(|p| p.position)
    }

    fn absorb_lap(&mut self, lap: &LapRecord) {
        // The feed re-sends the whole session; a known lap is refreshed in place.
        let known = lap
            .lap_number
            .and_then(|n| self.lap_history.iter_mut().find(|l| l.lap_number == Some(n)));
        match known {
            Some(existing) => {
                if lap_supersedes(lap, existing) {
                    *existing = lap.clone();
                }
            }
            None => self.lap_history.push(lap.clone()),
        }

        if let Some(duration) = lap.lap_duration {
            if duration > 0.0 && self.personal_best.map_or(true, |best| duration < best) {
                self.personal_best = Some(duration);
            }
        }

        if let Some(n) = lap.lap_number {
            self.total_laps_completed = Some(self.total_laps_completed.map_or(n, |t| t.max(n)));
        }

        let supersedes = match &self.latest_lap {
            None => true,
            Some(current) => lap_supersedes(lap, current),
        };
        if supersedes {
            self.latest_lap = Some(lap.clone());
        }
    }
}

/// Higher lap number wins; equal numbers go to the newer (or refreshed) start.
fn lap_supersedes(incoming: &LapRecord, current: &LapRecord) -> bool {
    match (incoming.lap_number, current.lap_number) {
        (Some(a), Some(b)) if a != b => a > b,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        _ => is_at_least_as_new(incoming.date_start, current.date_start),
    }
}

/// Latest-wins comparison between two record timestamps. An undated incoming
/// record never replaces an existing one.
fn is_at_least_as_new(incoming: Option<Timestamp>, current: Option<Timestamp>) -> bool {
    match (incoming, current) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(a), Some(b)) => a >= b,
    }
}

fn keep_latest<T: Clone>(slot: &mut Option<T>, incoming: &T, date: impl Fn(&T) -> Option<Timestamp>) {
    let replace = match slot.as_ref() {
        None => true,
        Some(current) => is_at_least_as_new(date(incoming), date(current)),
    };
    if replace {
        *slot = Some(incoming.clone());
    }
}

fn owner(driver_number: Option<DriverNumber>, stream: &'static str) -> Option<DriverNumber> {
    if driver_number.is_none() {
        debug!(stream, "dropping record without driver_number");
    }
    driver_number
}

// ---------- Merge report ----------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Competitors present in this cycle's position stream.
    pub seen: usize,
    /// Records created by this merge.
    pub created: usize,
    /// Competitors that became `Out` during this merge.
    pub retired: Vec<DriverNumber>,
}

// ---------- Store ----------

#[derive(Debug, Clone, Copy)]
struct CycleRanks {
    first: (Option<Timestamp>, u32),
    last: (Option<Timestamp>, u32),
}

/// Reconciled state for every competitor of the tracked session.
#[derive(Debug, Default)]
pub struct StateStore {
    records: BTreeMap<DriverNumber, CompetitorRecord>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record. Called when a new session begins.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, driver_number: DriverNumber) -> Option<&CompetitorRecord> {
        self.records.get(&driver_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompetitorRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn entry(&mut self, driver_number: DriverNumber) -> &mut CompetitorRecord {
        self.records
            .entry(driver_number)
            .or_insert_with(|| CompetitorRecord::new(driver_number))
    }

    /// Fold one cycle's snapshot into the store. Never fails; missing streams
    /// simply contribute nothing.
    pub fn merge(&mut self, snapshot: &Snapshot, now: Timestamp) -> MergeReport {
        let before = self.records.len();

        for detail in &snapshot.drivers {
            if let Some(n) = owner(detail.driver_number, "drivers") {
                self.entry(n).identity.refresh(detail);
            }
        }

        for lap in &snapshot.laps {
            if let Some(n) = owner(lap.driver_number, "laps") {
                self.entry(n).absorb_lap(lap);
            }
        }

        for sample in &snapshot.car_data {
            if let Some(n) = owner(sample.driver_number, "car_data") {
                keep_latest(&mut self.entry(n).latest_telemetry, sample, |r| r.date);
            }
        }

        for stint in &snapshot.stints {
            if let Some(n) = owner(stint.driver_number, "stints") {
                let rec = self.entry(n);
                let replace = match &rec.latest_stint {
                    None => true,
                    Some(current) => match (stint.stint_number, current.stint_number) {
                        (None, _) => false,
                        (Some(_), None) => true,
                        (Some(a), Some(b)) => a >= b,
                    },
                };
                if replace {
                    rec.latest_stint = Some(stint.clone());
                }
            }
        }

        for interval in &snapshot.intervals {
            if let Some(n) = owner(interval.driver_number, "intervals") {
                keep_latest(&mut self.entry(n).latest_interval, interval, |r| r.date);
            }
        }

        let seen = self.fold_positions(&snapshot.positions, now);
        let retired = self.reconcile_retirements(&seen, now);

        MergeReport {
            seen: seen.len(),
            created: self.records.len() - before,
            retired,
        }
    }

    fn fold_positions(
        &mut self,
        positions: &[PositionRecord],
        now: Timestamp,
    ) -> BTreeSet<DriverNumber> {
        let mut seen = BTreeSet::new();
        let mut cycle: BTreeMap<DriverNumber, CycleRanks> = BTreeMap::new();

        for pos in positions {
            let Some(n) = owner(pos.driver_number, "position") else {
                continue;
            };
            seen.insert(n);

            let rec = self.entry(n);
            keep_latest(&mut rec.latest_position, pos, |r| r.date);
            if rec.status != Status::Out {
                rec.status = Status::Active;
            }
            rec.last_seen_active_at = Some(now);

            if let Some(rank) = pos.position {
                let ranks = cycle.entry(n).or_insert(CycleRanks {
                    first: (pos.date, rank),
                    last: (pos.date, rank),
                });
                // Undated records only count when nothing dated was seen.
                let earlier = match (pos.date, ranks.first.0) {
                    (Some(a), Some(b)) => a < b,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if earlier {
                    ranks.first = (pos.date, rank);
                }
                if is_at_least_as_new(pos.date, ranks.last.0) {
                    ranks.last = (pos.date, rank);
                }
            }
        }

        for (n, ranks) in cycle {
            let rec = self.entry(n);
            rec.rank_history = Some(RankHistory {
                first: ranks.first.1,
                last: ranks.last.1,
            });
            if rec.first_known_rank.is_none() {
                rec.first_known_rank = Some(ranks.first.1);
            }
        }

        seen
    }

    fn reconcile_retirements(
        &mut self,
        seen: &BTreeSet<DriverNumber>,
        now: Timestamp,
    ) -> Vec<DriverNumber> {
        let mut retired = Vec::new();
        for (n, rec) in self.records.iter_mut() {
            if seen.contains(n) || rec.status != Status::Active {
                continue;
            }
            let silent_ms = rec
                .last_seen_active_at
                .map(|t| (now - t).num_milliseconds());
            // Inside the grace window the stale record is carried forward as Active.
            if silent_ms.map_or(true, |ms| ms > RETIREMENT_TIMEOUT_MS) {
                rec.status = Status::Out;
                retired.push(*n);
                info!(
                    driver_number = *n,
                    silent_ms = silent_ms.unwrap_or_default(),
                    "competitor retired after position silence"
                );
            }
        }
        retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GapValue;
    use chrono::{TimeZone, Utc};

    fn t(ms: i64) -> Timestamp {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn pos(n: u32, rank: u32, at: i64) -> PositionRecord {
        PositionRecord {
            driver_number: Some(n),
            position: Some(rank),
            date: Some(t(at)),
        }
    }

    fn lap(n: u32, number: u32, duration: Option<f64>) -> LapRecord {
        LapRecord {
            driver_number: Some(n),
            lap_number: Some(number),
            lap_duration: duration,
            is_pit_out_lap: Some(false),
            date_start: Some(t(number as i64 * 90_000)),
        }
    }

    fn positions(records: Vec<PositionRecord>) -> Snapshot {
        Snapshot {
            positions: records,
            ..Default::default()
        }
    }

    #[test]
    fn record_is_created_lazily_by_any_stream() {
        let mut store = StateStore::new();
        let snap = Snapshot {
            car_data: vec![CarDataRecord {
                driver_number: Some(81),
                drs: Some(8),
                speed: Some(301.0),
                date: Some(t(0)),
            }],
            ..Default::default()
        };
        let report = store.merge(&snap, t(0));
        assert_eq!(report.created, 1);
        let rec = store.get(81).unwrap();
        assert_eq!(rec.status(), Status::Unknown);
        assert_eq!(rec.identity().display_name(), "Driver 81");
        assert_eq!(rec.latest_telemetry().and_then(|c| c.drs), Some(8));
    }

    #[test]
    fn records_without_driver_number_are_dropped() {
        let mut store = StateStore::new();
        let snap = positions(vec![PositionRecord {
            driver_number: None,
            position: Some(1),
            date: Some(t(0)),
        }]);
        let report = store.merge(&snap, t(0));
        assert_eq!(report.seen, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn identity_refresh_keeps_fields_missing_from_detail() {
        let mut store = StateStore::new();
        let full = Snapshot {
            drivers: vec![DriverRecord {
                driver_number: Some(1),
                full_name: Some("Max VERSTAPPEN".into()),
                name_acronym: Some("VER".into()),
                team_name: Some("Red Bull Racing".into()),
                team_colour: Some("3671C6".into()),
            }],
            ..Default::default()
        };
        store.merge(&full, t(0));
        let sparse = Snapshot {
            drivers: vec![DriverRecord {
                driver_number: Some(1),
                team_colour: Some("1E41FF".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        store.merge(&sparse, t(1_000));

        let id = store.get(1).unwrap().identity();
        assert_eq!(id.display_name(), "Max VERSTAPPEN");
        assert_eq!(id.acronym(), "VER");
        assert_eq!(id.colour(), "1E41FF");
    }

    #[test]
    fn laps_fold_history_best_and_latest() {
        let mut store = StateStore::new();
        let snap = Snapshot {
            laps: vec![
                lap(44, 2, Some(91.2)),
                lap(44, 3, Some(90.8)),
                lap(44, 1, Some(0.0)),
                lap(44, 4, None),
            ],
            ..Default::default()
        };
        store.merge(&snap, t(0));
        let rec = store.get(44).unwrap();
        assert_eq!(rec.lap_history().len(), 4);
        assert_eq!(rec.personal_best(), Some(90.8));
        assert_eq!(rec.total_laps_completed(), Some(4));
        assert_eq!(rec.latest_lap().and_then(|l| l.lap_number), Some(4));

        // The next poll fills in lap 4's duration: refreshed, not duplicated.
        let snap = Snapshot {
            laps: vec![lap(44, 4, Some(89.9))],
            ..Default::default()
        };
        store.merge(&snap, t(2_000));
        let rec = store.get(44).unwrap();
        assert_eq!(rec.lap_history().len(), 4);
        assert_eq!(rec.personal_best(), Some(89.9));
        assert_eq!(rec.latest_lap().and_then(|l| l.lap_duration), Some(89.9));
    }

    #[test]
    fn equal_lap_numbers_resolve_by_start_time() {
        let mut store = StateStore::new();
        let mut early = lap(16, 7, Some(95.0));
        early.date_start = Some(t(10_000));
        let mut late = lap(16, 7, Some(94.0));
        late.date_start = Some(t(20_000));
        let snap = Snapshot {
            laps: vec![late.clone(), early],
            ..Default::default()
        };
        store.merge(&snap, t(0));
        assert_eq!(store.get(16).unwrap().latest_lap(), Some(&late));
    }

    #[test]
    fn total_laps_never_decrease() {
        let mut store = StateStore::new();
        store.merge(
            &Snapshot {
                laps: vec![lap(4, 12, Some(92.0))],
                ..Default::default()
            },
            t(0),
        );
        store.merge(
            &Snapshot {
                laps: vec![lap(4, 9, Some(92.0))],
                ..Default::default()
            },
            t(2_000),
        );
        assert_eq!(store.get(4).unwrap().total_laps_completed(), Some(12));
        assert_eq!(
            store.get(4).unwrap().latest_lap().and_then(|l| l.lap_number),
            Some(12)
        );
    }

    #[test]
    fn older_position_never_overwrites_newer() {
        let mut store = StateStore::new();
        store.merge(&positions(vec![pos(11, 3, 5_000)]), t(5_000));
        store.merge(&positions(vec![pos(11, 7, 1_000)]), t(6_000));
        assert_eq!(store.get(11).unwrap().rank(), Some(3));

        store.merge(&positions(vec![pos(11, 2, 5_000)]), t(7_000));
        assert_eq!(store.get(11).unwrap().rank(), Some(2), "equal timestamp is at least as new");
    }

    #[test]
    fn undated_record_only_fills_an_empty_slot() {
        let mut store = StateStore::new();
        let undated = IntervalRecord {
            driver_number: Some(63),
            gap_to_leader: Some(GapValue::Seconds(9.0)),
            interval: Some(GapValue::Seconds(1.0)),
            date: None,
        };
        store.merge(
            &Snapshot {
                intervals: vec![undated.clone()],
                ..Default::default()
            },
            t(0),
        );
        assert_eq!(store.get(63).unwrap().latest_interval(), Some(&undated));

        let dated = IntervalRecord {
            date: Some(t(1_000)),
            interval: Some(GapValue::Seconds(2.0)),
            ..undated.clone()
        };
        store.merge(
            &Snapshot {
                intervals: vec![dated.clone(), undated],
                ..Default::default()
            },
            t(1_000),
        );
        assert_eq!(store.get(63).unwrap().latest_interval(), Some(&dated));
    }

    #[test]
    fn highest_stint_number_wins() {
        let mut store = StateStore::new();
        let stint = |number: u32, compound: &str| StintRecord {
            driver_number: Some(55),
            stint_number: Some(number),
            lap_start: Some(number * 10),
            lap_end: None,
            compound: Some(compound.into()),
            tyre_age_at_start: Some(0),
        };
        store.merge(
            &Snapshot {
                stints: vec![stint(2, "HARD"), stint(1, "MEDIUM"), stint(3, "SOFT")],
                ..Default::default()
            },
            t(0),
        );
        store.merge(
            &Snapshot {
                stints: vec![stint(1, "MEDIUM")],
                ..Default::default()
            },
            t(2_000),
        );
        let latest = store.get(55).unwrap().latest_stint().unwrap();
        assert_eq!(latest.stint_number, Some(3));
        assert_eq!(latest.compound.as_deref(), Some("SOFT"));
    }

    #[test]
    fn retirement_boundary_is_fifteen_seconds_exclusive() {
        let mut store = StateStore::new();
        store.merge(&positions(vec![pos(22, 9, 0)]), t(0));
        let empty = Snapshot::default();

        store.merge(&empty, t(14_900));
        assert_eq!(store.get(22).unwrap().status(), Status::Active);
        store.merge(&empty, t(15_000));
        assert_eq!(store.get(22).unwrap().status(), Status::Active);

        let report = store.merge(&empty, t(15_100));
        assert_eq!(report.retired, vec![22]);
        assert_eq!(store.get(22).unwrap().status(), Status::Out);
    }

    #[test]
    fn out_is_terminal() {
        let mut store = StateStore::new();
        store.merge(&positions(vec![pos(2, 18, 0)]), t(0));
        store.merge(&Snapshot::default(), t(20_000));
        assert_eq!(store.get(2).unwrap().status(), Status::Out);

        store.merge(&positions(vec![pos(2, 17, 21_000)]), t(21_000));
        let rec = store.get(2).unwrap();
        assert_eq!(rec.status(), Status::Out);
        assert_eq!(rec.rank(), Some(17));
    }

    #[test]
    fn absent_competitor_keeps_every_field() {
        let mut store = StateStore::new();
        let full = Snapshot {
            positions: vec![pos(10, 5, 0)],
            laps: vec![lap(10, 20, Some(93.1))],
            stints: vec![StintRecord {
                driver_number: Some(10),
                stint_number: Some(2),
                lap_start: Some(15),
                compound: Some("HARD".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        store.merge(&full, t(0));
        let before = store.get(10).unwrap().clone();

        store.merge(&positions(vec![pos(1, 1, 1_000)]), t(1_000));
        let after = store.get(10).unwrap();
        assert_eq!(after.status(), Status::Active);
        assert_eq!(after.latest_position(), before.latest_position());
        assert_eq!(after.latest_lap(), before.latest_lap());
        assert_eq!(after.latest_stint(), before.latest_stint());
        assert_eq!(after.personal_best(), before.personal_best());
        assert_eq!(after.last_seen_active_at(), before.last_seen_active_at());
    }

    #[test]
    fn rank_history_tracks_first_and_last_of_cycle() {
        let mut store = StateStore::new();
        let snap = positions(vec![pos(14, 6, 3_000), pos(14, 8, 0), pos(14, 4, 9_000)]);
        store.merge(&snap, t(10_000));
        let rec = store.get(14).unwrap();
        assert_eq!(rec.rank_history(), Some(RankHistory { first: 8, last: 4 }));
        assert_eq!(rec.first_known_rank(), Some(8));
        assert_eq!(rec.rank(), Some(4));

        store.merge(&positions(vec![pos(14, 3, 12_000)]), t(12_000));
        let rec = store.get(14).unwrap();
        assert_eq!(rec.rank_history(), Some(RankHistory { first: 3, last: 3 }));
        assert_eq!(rec.first_known_rank(), Some(8));

        // An undated record after dated ones moves neither end.
        let undated = PositionRecord {
            driver_number: Some(14),
            position: Some(2),
            date: None,
        };
        store.merge(
            &positions(vec![pos(14, 8, 13_000), pos(14, 4, 19_000), undated]),
            t(20_000),
        );
        let rec = store.get(14).unwrap();
        assert_eq!(rec.rank_history(), Some(RankHistory { first: 8, last: 4 }));
        assert_eq!(rec.rank(), Some(4));
    }

    #[test]
    fn never_positioned_competitor_stays_unknown() {
        let mut store = StateStore::new();
        store.merge(
            &Snapshot {
                laps: vec![lap(99, 1, Some(100.0))],
                ..Default::default()
            },
            t(0),
        );
        store.merge(&Snapshot::default(), t(60_000));
        assert_eq!(store.get(99).unwrap().status(), Status::Unknown);
        assert!(!store.get(99).unwrap().status().is_ranked());
    }

    #[test]
    fn reset_drops_everything() {
        let mut store = StateStore::new();
        store.merge(&positions(vec![pos(1, 1, 0), pos(16, 2, 0)]), t(0));
        assert_eq!(store.len(), 2);
        store.reset();
        assert!(store.is_empty());
    }
}
