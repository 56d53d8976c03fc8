use std::cmp::Ordering;

use crate::derive::DerivedCompetitor;
use crate::store::Status;

/// Rank used for competitors without a known position.
pub const ABSENT_RANK: u32 = 99;

fn status_bucket(status: Status) -> u8 {
    match status {
        Status::Active => 0,
        Status::Out => 1,
        Status::Unknown => 2,
    }
}

fn rank_key(row: &DerivedCompetitor) -> u32 {
    row.rank.unwrap_or(ABSENT_RANK)
}

/// Presentation order. Strict and total:
/// - `Active` before `Out`
/// - `Active` by ascending rank
/// - `Out` by descending completed laps, then ascending last-known rank
/// - driver number breaks any remaining tie
pub fn compare(a: &DerivedCompetitor, b: &DerivedCompetitor) -> Ordering {
    status_bucket(a.status)
        .cmp(&status_bucket(b.status))
        .then_with(|| match (a.status, b.status) {
            (Status::Out, Status::Out) => b
                .laps_completed
                .unwrap_or(0)
                .cmp(&a.laps_completed.unwrap_or(0))
                .then_with(|| rank_key(a).cmp(&rank_key(b))),
            _ => rank_key(a).cmp(&rank_key(b)),
        })
        .then_with(|| a.driver_number().cmp(&b.driver_number()))
}

pub fn sort(rows: &mut [DerivedCompetitor]) {
    rows.sort_by(compare);
}
