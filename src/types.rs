use chrono::{DateTime, Utc};
use serde::Deserialize;

pub type Timestamp = DateTime<Utc>;
pub type DriverNumber = u32;

// ---------- Feed records ----------
//
// One struct per sub-stream. Every field is optional: the feeds are sparse and
// routinely omit keys, so defaulting happens here instead of in the engine.

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PositionRecord {
    pub driver_number: Option<DriverNumber>,
    pub position: Option<u32>,
    pub date: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverRecord {
    pub driver_number: Option<DriverNumber>,
    pub full_name: Option<String>,
    pub name_acronym: Option<String>,
    pub team_name: Option<String>,
    pub team_colour: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LapRecord {
    pub driver_number: Option<DriverNumber>,
    pub lap_number: Option<u32>,
    pub lap_duration: Option<f64>, // seconds
    pub is_pit_out_lap: Option<bool>,
    pub date_start: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CarDataRecord {
    pub driver_number: Option<DriverNumber>,
    pub drs: Option<i32>,
    pub speed: Option<f64>,
    pub date: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StintRecord {
    pub driver_number: Option<DriverNumber>,
    pub stint_number: Option<u32>,
    pub lap_start: Option<u32>,
    pub lap_end: Option<u32>,
    pub compound: Option<String>, // e.g. "SOFT", "MEDIUM", "INTERMEDIATE"
    pub tyre_age_at_start: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntervalRecord {
    pub driver_number: Option<DriverNumber>,
    pub gap_to_leader: Option<GapValue>,
    pub interval: Option<GapValue>, // to car ahead
    pub date: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackStatusRecord {
    pub status_type: Option<String>,
    pub message: Option<String>,
    pub date: Option<Timestamp>,
}

impl TrackStatusRecord {
    pub fn label(&self) -> Option<&str> {
        self.status_type.as_deref().or(self.message.as_deref())
    }
}

// ---------- Gap values ----------

/// A gap/interval as reported by the intervals feed.
///
/// The feed mixes plain seconds (`3.217`), numeric text (`"3.217"`) and
/// lap-count text (`"+1 LAP"`). Numeric text collapses into `Seconds`; any
/// other text is kept verbatim as `Laps`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGap")]
pub enum GapValue {
    Seconds(f64),
    Laps(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGap {
    Number(f64),
    Text(String),
}

impl From<RawGap> for GapValue {
    fn from(raw: RawGap) -> Self {
        match raw {
            RawGap::Number(s) => GapValue::Seconds(s),
            RawGap::Text(t) => GapValue::parse(&t),
        }
    }
}

impl GapValue {
    pub fn parse(text: &str) -> Self {
        if is_lap_encoded(text) {
            return GapValue::Laps(text.to_string());
        }
        match text.trim().parse::<f64>() {
            Ok(s) if s.is_finite() => GapValue::Seconds(s),
            _ => GapValue::Laps(text.to_string()),
        }
    }
}

fn is_lap_encoded(text: &str) -> bool {
    text.to_ascii_uppercase().contains("LAP")
}

// ---------- Snapshot ----------

/// Everything one polling cycle fetched for a session. A stream that failed
/// to load is simply empty.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub positions: Vec<PositionRecord>,
    pub drivers: Vec<DriverRecord>,
    pub laps: Vec<LapRecord>,
    pub car_data: Vec<CarDataRecord>,
    pub stints: Vec<StintRecord>,
    pub intervals: Vec<IntervalRecord>,
    pub track_status: Vec<TrackStatusRecord>,
}

// ---------- Session discovery ----------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    pub session_key: u32,
    pub session_name: Option<String>,
    pub session_type: Option<String>,
    pub date_start: Option<Timestamp>,
    pub date_end: Option<Timestamp>,
    pub meeting_key: Option<u32>,
}

impl SessionInfo {
    /// Live means a race whose declared window contains `now`.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        let is_race = self.session_type.as_deref() == Some("Race");
        match (self.date_start, self.date_end) {
            (Some(start), Some(end)) => is_race && start <= now && now <= end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeetingInfo {
    pub meeting_key: Option<u32>,
    pub meeting_name: Option<String>,
    pub country_name: Option<String>,
}
