// 🔍 Result Deduplication - collapse results sharing an identity key
// Two key strategies: full identity key (every outcome field) and the
// narrower event key used by additive merges.

use crate::model::ResultRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

// ============================================================================
// KEY STRATEGY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStrategy {
    /// date, place, discipline, category, category_code, rank, result_code, points
    Identity,

    /// date, place, discipline, category
    Event,
}

// ============================================================================
// KEYS
// ============================================================================

/// Full identity key: two results equal on every field here are the same result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultKey {
    pub date: String,
    pub place: String,
    pub discipline: String,
    pub category: String,
    pub category_code: String,
    pub rank: String,
    pub result_code: String,
    pub fis_points: String,
    pub cup_points: String,
}

impl ResultKey {
    pub fn of(result: &ResultRecord) -> Self {
        ResultKey {
            date: text(&result.date),
            place: text(&result.place),
            discipline: text(&result.discipline),
            category: text(&result.category),
            category_code: result.category_code.clone(),
            rank: result.rank.map(|r| r.to_string()).unwrap_or_default(),
            result_code: text(&result.result_code),
            fis_points: number_text(result.fis_points),
            cup_points: number_text(result.cup_points),
        }
    }

    /// Pipe-joined form, used for stable content hashes
    pub fn joined(&self) -> String {
        [
            self.date.as_str(),
            self.place.as_str(),
            self.discipline.as_str(),
            self.category.as_str(),
            self.category_code.as_str(),
            self.rank.as_str(),
            self.result_code.as_str(),
            self.fis_points.as_str(),
            self.cup_points.as_str(),
        ]
        .join("|")
    }
}

/// Narrow key: one entry per athlete per event/category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub date: String,
    pub place: String,
    pub discipline: String,
    pub category: String,
}

impl EventKey {
    pub fn of(result: &ResultRecord) -> Self {
        EventKey {
            date: text(&result.date),
            place: text(&result.place),
            discipline: text(&result.discipline),
            category: text(&result.category),
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// 12.0 → "12", 12.5 → "12.5"
fn number_text(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

// ============================================================================
// DEDUPLICATION
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    /// Surviving results, in first-seen position
    pub results: Vec<ResultRecord>,

    /// How many inputs collapsed onto an earlier key
    pub collapsed: usize,
}

/// Collapse results by key. A later result with a key already seen replaces
/// the earlier value in the earlier position.
pub fn dedupe_by<K, F>(results: impl IntoIterator<Item = ResultRecord>, key_fn: F) -> DedupOutcome
where
    K: Eq + Hash,
    F: Fn(&ResultRecord) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut kept: Vec<ResultRecord> = Vec::new();
    let mut collapsed = 0;

    for result in results {
        let key = key_fn(&result);
        match positions.get(&key).copied() {
            Some(pos) => {
                kept[pos] = result;
                collapsed += 1;
            }
            None => {
                positions.insert(key, kept.len());
                kept.push(result);
            }
        }
    }

    DedupOutcome {
        results: kept,
        collapsed,
    }
}

pub fn dedupe(results: impl IntoIterator<Item = ResultRecord>, strategy: KeyStrategy) -> DedupOutcome {
    match strategy {
        KeyStrategy::Identity => dedupe_by(results, ResultKey::of),
        KeyStrategy::Event => dedupe_by(results, EventKey::of),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn create_test_result(date: &str, category: &str, rank: u32, points: f64) -> ResultRecord {
        ResultRecord {
            date: Some(date.to_string()),
            place: Some("Bokwang".to_string()),
            category: Some(category.to_string()),
            category_code: "FEC".to_string(),
            category_name: Some(category.to_string()),
            discipline: Some("Halfpipe".to_string()),
            rank: Some(rank),
            result_code: None,
            fis_points: points,
            cup_points: 0.0,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_identical_results_collapse() {
        let a = create_test_result("2024-02-10", "Far East Cup", 3, 120.0);
        let b = a.clone();

        let outcome = dedupe(vec![a, b], KeyStrategy::Identity);

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.collapsed, 1);
    }

    #[test]
    fn test_any_identity_field_difference_survives() {
        let base = create_test_result("2024-02-10", "Far East Cup", 3, 120.0);

        let mut variants = vec![base.clone()];

        let mut v = base.clone();
        v.date = Some("2024-02-11".to_string());
        variants.push(v);

        let mut v = base.clone();
        v.place = Some("Yongpyong".to_string());
        variants.push(v);

        let mut v = base.clone();
        v.discipline = Some("Slopestyle".to_string());
        variants.push(v);

        let mut v = base.clone();
        v.category = Some("FIS".to_string());
        variants.push(v);

        let mut v = base.clone();
        v.category_code = "FIS".to_string();
        variants.push(v);

        let mut v = base.clone();
        v.rank = Some(4);
        variants.push(v);

        let mut v = base.clone();
        v.result_code = Some("DSQ".to_string());
        variants.push(v);

        let mut v = base.clone();
        v.fis_points = 121.0;
        variants.push(v);

        let mut v = base.clone();
        v.cup_points = 50.0;
        variants.push(v);

        let count = variants.len();
        let outcome = dedupe(variants, KeyStrategy::Identity);

        assert_eq!(outcome.results.len(), count);
        assert_eq!(outcome.collapsed, 0);
    }

    #[test]
    fn test_category_name_not_part_of_identity() {
        let a = create_test_result("2024-02-10", "Far East Cup", 3, 120.0);
        let mut b = a.clone();
        b.category_name = Some("FEC".to_string());

        let outcome = dedupe(vec![a, b.clone()], KeyStrategy::Identity);

        assert_eq!(outcome.results.len(), 1);
        // Later value wins, earlier position kept
        assert_eq!(outcome.results[0], b);
    }

    #[test]
    fn test_event_key_merges_rank_updates() {
        let old = create_test_result("2024-02-10", "Far East Cup", 5, 100.0);
        let new = create_test_result("2024-02-10", "Far East Cup", 3, 120.0);
        let other = create_test_result("2024-01-20", "Far East Cup", 1, 150.0);

        let outcome = dedupe(vec![old, other.clone(), new.clone()], KeyStrategy::Event);

        assert_eq!(outcome.results, vec![new, other]);
        assert_eq!(outcome.collapsed, 1);
    }

    #[test]
    fn test_joined_key_format() {
        let r = create_test_result("2024-02-10", "Far East Cup", 3, 120.0);
        assert_eq!(
            ResultKey::of(&r).joined(),
            "2024-02-10|Bokwang|Halfpipe|Far East Cup|FEC|3||120|0"
        );
    }
}
