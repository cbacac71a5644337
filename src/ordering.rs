// ↕️ Result ordering - one comparator for the engine and the auditor
//
// Total order, most important first:
//   1. date descending (ISO strings compare chronologically)
//   2. stage priority descending (final > other > qualification)
//   3. rank ascending, missing/invalid rank last

use crate::model::ResultRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort value for a missing or invalid rank
pub const RANK_UNKNOWN: u32 = u32::MAX;

/// Rank score sentinel for the monotonic formulation (see [`rank_score`])
pub const RANK_SCORE_SENTINEL: i64 = -9999;

// ============================================================================
// STAGE PRIORITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StagePriority {
    Qualification = 0,
    Main = 1,
    Final = 2,
}

impl StagePriority {
    /// Classify free category text
    pub fn classify(text: &str) -> Self {
        let t = text.trim().to_lowercase();
        if is_qualification_lower(&t) {
            StagePriority::Qualification
        } else if t.contains("final") {
            StagePriority::Final
        } else {
            StagePriority::Main
        }
    }

    pub fn of(result: &ResultRecord) -> Self {
        Self::classify(result.stage_text())
    }

    pub fn weight(self) -> u8 {
        self as u8
    }
}

/// Qualification rounds: "qualif..." anywhere, or exactly "qua"
pub fn is_qualification(text: &str) -> bool {
    is_qualification_lower(&text.trim().to_lowercase())
}

fn is_qualification_lower(t: &str) -> bool {
    t.contains("qualif") || t == "qua"
}

// ============================================================================
// COMPARATORS
// ============================================================================

pub fn rank_sort_key(result: &ResultRecord) -> u32 {
    result.finish_rank().unwrap_or(RANK_UNKNOWN)
}

/// Within one event: stage descending, then rank ascending
pub fn compare_within_event(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    StagePriority::of(b)
        .cmp(&StagePriority::of(a))
        .then_with(|| rank_sort_key(a).cmp(&rank_sort_key(b)))
}

/// Date descending only
pub fn compare_by_date(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    b.date_str().cmp(a.date_str())
}

/// Full canonical order
pub fn compare_results(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    compare_by_date(a, b).then_with(|| compare_within_event(a, b))
}

/// Stable sort into canonical order
pub fn sort_results(results: &mut [ResultRecord]) {
    results.sort_by(compare_results);
}

/// Monotonic score form of the rank tie-break, compared descending
///
/// Agrees with [`rank_sort_key`] for every rank below 9999; above that the
/// sentinel ranks an unknown finish ahead of the real one.
pub fn rank_score(result: &ResultRecord) -> i64 {
    match result.finish_rank() {
        Some(rank) => -(rank as i64),
        None => RANK_SCORE_SENTINEL,
    }
}

/// Canonical order expressed through scores instead of a comparator
pub fn compare_by_score(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    compare_by_date(a, b)
        .then_with(|| StagePriority::of(b).weight().cmp(&StagePriority::of(a).weight()))
        .then_with(|| rank_score(b).cmp(&rank_score(a)))
}

// ============================================================================
// TESTS
// ============================================================================
