// 🧹 Normalizer - raw scraped result → canonical result shape

use crate::coerce;
use crate::model::{RawResult, ResultRecord};
use crate::rules::CategoryCodeRules;
use serde_json::Map;

/// Status stored when a result has no valid finishing rank and no status text
pub const DEFAULT_RESULT_CODE: &str = "DNF";

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: CategoryCodeRules,
}

impl Normalizer {
    pub fn new() -> Self {
        Normalizer {
            rules: CategoryCodeRules::standard(),
        }
    }

    pub fn with_rules(rules: CategoryCodeRules) -> Self {
        Normalizer { rules }
    }

    /// Map a scraped result into the canonical shape
    ///
    /// A rank that is not a positive whole number becomes 0 and the result
    /// carries a status code instead (`rank_status`, else "DNF").
    pub fn normalize(&self, raw: &RawResult) -> ResultRecord {
        let category = coerce::text(&raw.category);
        let category_code = self.rules.code_for(category.as_deref().unwrap_or(""));

        let (rank, result_code) = match coerce::finish_rank(raw.rank.as_ref()) {
            Some(rank) => (rank, None),
            None => (
                0,
                Some(
                    coerce::text(&raw.rank_status)
                        .or_else(|| coerce::text(&raw.result_code))
                        .unwrap_or_else(|| DEFAULT_RESULT_CODE.to_string()),
                ),
            ),
        };
        let fis_points = coerce::opt_number(raw.points.as_ref())
            .or_else(|| coerce::opt_number(raw.fis_points.as_ref()))
            .unwrap_or(0.0);

        ResultRecord {
            date: coerce::text(&raw.date),
            place: coerce::text(&raw.place),
            category: category.clone(),
            category_code,
            category_name: category,
            discipline: coerce::text(&raw.discipline).or_else(|| coerce::text(&raw.event)),
            rank: Some(rank),
            result_code,
            fis_points,
            cup_points: coerce::opt_number(raw.cup_points.as_ref()).unwrap_or(0.0),
            extra: Map::new(),
        }
    }

    /// Bring an already-canonical result up to date
    ///
    /// Only fills `category_code` when it is missing; every other field is
    /// kept, so this is a no-op on normalized results.
    pub fn renormalize(&self, mut result: ResultRecord) -> ResultRecord {
        if result.category_code.is_empty() {
            result.category_code = self.rules.code_for(result.stage_text());
        }
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(category: &str, rank: serde_json::Value) -> RawResult {
        RawResult {
            date: Some("2024-02-10".to_string()),
            place: Some("Calgary".to_string()),
            category: Some(category.to_string()),
            discipline: Some("Moguls".to_string()),
            rank: Some(rank),
            points: Some(json!("85.5")),
            cup_points: Some(json!(45)),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_valid_rank() {
        let normalizer = Normalizer::new();
        let result = normalizer.normalize(&raw("FIS World Cup", json!(5)));

        assert_eq!(result.rank, Some(5));
        assert_eq!(result.result_code, None);
        assert_eq!(result.category_code, "WC");
        assert_eq!(result.category_name.as_deref(), Some("FIS World Cup"));
        assert_eq!(result.fis_points, 85.5);
        assert_eq!(result.cup_points, 45.0);
    }

    #[test]
    fn test_zero_rank_becomes_dnf() {
        let normalizer = Normalizer::new();
        let result = normalizer.normalize(&raw("FIS World Cup", json!(0)));

        assert_eq!(result.rank, Some(0));
        assert_eq!(result.result_code.as_deref(), Some("DNF"));
    }

    #[test]
    fn test_rank_status_carried_over() {
        let normalizer = Normalizer::new();
        let mut input = raw("FIS", json!(null));
        input.rank_status = Some("DNS".to_string());

        let result = normalizer.normalize(&input);

        assert_eq!(result.rank, Some(0));
        assert_eq!(result.result_code.as_deref(), Some("DNS"));
        assert_eq!(result.category_code, "FIS");
    }

    #[test]
    fn test_garbage_numbers_fall_back_to_zero() {
        let normalizer = Normalizer::new();
        let mut input = raw("Regional Cup", json!("DSQ"));
        input.points = Some(json!("—"));
        input.cup_points = None;

        let result = normalizer.normalize(&input);

        assert_eq!(result.rank, Some(0));
        assert_eq!(result.result_code.as_deref(), Some("DNF"));
        assert_eq!(result.fis_points, 0.0);
        assert_eq!(result.cup_points, 0.0);
        assert_eq!(result.category_code, "");
    }

    #[test]
    fn test_canonical_field_names_accepted() {
        let normalizer = Normalizer::new();
        let stored: RawResult = serde_json::from_value(json!({
            "date": "2024-02-10",
            "category": "FIS",
            "rank": 0,
            "result_code": "DNS",
            "fis_points": 35,
            "cup_points": 0.0
        }))
        .unwrap();

        let result = normalizer.normalize(&stored);

        assert_eq!(result.result_code.as_deref(), Some("DNS"));
        assert_eq!(result.fis_points, 35.0);

        // scraped names win when both are present
        let mut scraped = stored.clone();
        scraped.rank_status = Some("DSQ".to_string());
        scraped.points = Some(json!(12));
        let result = normalizer.normalize(&scraped);
        assert_eq!(result.result_code.as_deref(), Some("DSQ"));
        assert_eq!(result.fis_points, 12.0);
    }

    #[test]
    fn test_event_used_when_discipline_missing() {
        let normalizer = Normalizer::new();
        let input = RawResult {
            date: Some(String::new()),
            event: Some("Big Air".to_string()),
            rank: Some(json!(2)),
            ..Default::default()
        };

        let result = normalizer.normalize(&input);

        assert_eq!(result.discipline.as_deref(), Some("Big Air"));
        assert_eq!(result.date, None);
        assert_eq!(result.category, None);
    }

    #[test]
    fn test_renormalize_is_idempotent() {
        let normalizer = Normalizer::new();
        let once = normalizer.normalize(&raw("Qualification", json!(12)));
        let twice = normalizer.renormalize(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_renormalize_keeps_existing_code() {
        let normalizer = Normalizer::new();
        let mut result = normalizer.normalize(&raw("Qualification", json!(12)));
        result.category_code = "WC".to_string();

        assert_eq!(normalizer.renormalize(result).category_code, "WC");
    }

    #[test]
    fn test_renormalize_fills_missing_code_from_category_name() {
        let normalizer = Normalizer::new();
        let mut result = normalizer.normalize(&raw("Far East Cup", json!(1)));
        result.category = None;
        result.category_code = String::new();

        assert_eq!(normalizer.renormalize(result).category_code, "FEC");
    }
}
