// 🏅 Record shapes - canonical athletes/results + raw scraped input
//
// Canonical records are what the site bundle stores. Raw records are what the
// scraper hands over. Fields this crate does not interpret ride along in
// `extra` so a load → save cycle never drops data owned by the site.

use crate::coerce;
use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// CANONICAL RESULT
// ============================================================================

/// One competition outcome for one athlete at one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub place: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    /// Derived short code (QUA, WC, ...); empty when no rule matched
    #[serde(default, deserialize_with = "coerce::de_string_or_empty")]
    pub category_code: String,

    #[serde(default)]
    pub category_name: Option<String>,

    #[serde(default)]
    pub discipline: Option<String>,

    /// 0 or absent = did not finish / unknown
    #[serde(default, deserialize_with = "coerce::de_opt_whole")]
    pub rank: Option<u32>,

    /// Only set when rank is not a valid finish (DNF, DNS, DSQ...)
    #[serde(default)]
    pub result_code: Option<String>,

    #[serde(default, deserialize_with = "coerce::de_number_or_zero")]
    pub fis_points: f64,

    #[serde(default, deserialize_with = "coerce::de_number_or_zero")]
    pub cup_points: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultRecord {
    /// Text used for stage classification: category, else category_name
    pub fn stage_text(&self) -> &str {
        self.category
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.category_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("")
    }

    /// Rank if it is a real finishing position
    pub fn finish_rank(&self) -> Option<u32> {
        self.rank.filter(|r| *r > 0)
    }

    pub fn date_str(&self) -> &str {
        self.date.as_deref().unwrap_or("")
    }

    pub fn has_date(&self) -> bool {
        self.date.as_deref().is_some_and(|d| !d.is_empty())
    }
}

// ============================================================================
// CANONICAL ATHLETE
// ============================================================================

/// Athlete entity, identified by its federation code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    #[serde(default, deserialize_with = "coerce::de_code")]
    pub fis_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ko: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_display: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fis_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(
        default,
        deserialize_with = "coerce::de_opt_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_year: Option<u32>,

    #[serde(
        default,
        deserialize_with = "coerce::de_opt_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<u32>,

    #[serde(
        default,
        deserialize_with = "coerce::de_opt_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_rank: Option<u32>,

    /// Latest positive points value from the sorted results
    #[serde(
        default,
        deserialize_with = "coerce::de_opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub fis_points: Option<f64>,

    /// Single source of truth, sorted most-important first
    #[serde(default)]
    pub recent_results: Vec<ResultRecord>,

    /// Legacy summary copy of `recent_results` from an older data shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modal_results: Option<Vec<ResultRecord>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Athlete {
    /// Empty athlete carrying only an identity
    pub fn with_code(fis_code: impl Into<String>) -> Self {
        Athlete {
            fis_code: fis_code.into(),
            name_ko: None,
            name_en: None,
            sport: None,
            sport_display: None,
            team: None,
            fis_url: None,
            birth_date: None,
            birth_year: None,
            age: None,
            current_rank: None,
            fis_points: None,
            recent_results: Vec::new(),
            modal_results: None,
            extra: Map::new(),
        }
    }

    /// Read view for the summary/modal list; falls back to the profile list
    pub fn modal_view(&self) -> &[ResultRecord] {
        self.modal_results
            .as_deref()
            .unwrap_or(&self.recent_results)
    }

    /// Korean name when present, else English name
    pub fn display_name(&self) -> Option<&str> {
        self.name_ko
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name_en.as_deref().filter(|s| !s.is_empty()))
    }

    pub fn sport_or_unknown(&self) -> &str {
        self.sport
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
    }
}

// ============================================================================
// RAW (SCRAPED) INPUT
// ============================================================================

/// One scraped result before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub discipline: Option<String>,
    /// Older scrapes name the discipline `event`
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub rank: Option<Value>,
    #[serde(default)]
    pub rank_status: Option<String>,
    /// Status under its canonical name, when a stored set is fed back in
    #[serde(default)]
    pub result_code: Option<String>,
    #[serde(default)]
    pub points: Option<Value>,
    /// Points under their canonical name, used when `points` is absent
    #[serde(default)]
    pub fis_points: Option<Value>,
    #[serde(default)]
    pub cup_points: Option<Value>,
}

/// One scraped athlete record from the incoming batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAthlete {
    #[serde(default)]
    pub fis_code: Option<Value>,
    #[serde(default)]
    pub name_ko: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub sport_display: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub fis_url: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub birth_year: Option<Value>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub current_rank: Option<Value>,
    #[serde(default)]
    pub recent_results: Vec<RawResult>,
}

impl RawAthlete {
    /// Normalized external code, None when missing or unusable
    pub fn code(&self) -> Option<String> {
        self.fis_code.as_ref().and_then(coerce::code)
    }
}

// ============================================================================
// SHAPE CHECKS
// ============================================================================

/// Canonical set: must be an array of athlete objects
pub fn parse_canonical(value: Value) -> Result<Vec<Athlete>> {
    let items = expect_records(value, "array of athlete records")?;
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ReconcileError::from))
        .collect()
}

/// Incoming batch: `{"athletes": [...]}` (missing key = empty) or a bare array
pub fn parse_incoming(value: Value) -> Result<Vec<RawAthlete>> {
    let list = match value {
        Value::Object(mut map) => match map.remove("athletes") {
            Some(list) => list,
            None => return Ok(Vec::new()),
        },
        other => other,
    };

    let items = expect_records(list, "array of incoming athlete records")?;
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ReconcileError::from))
        .collect()
}

fn expect_records(value: Value, expected: &str) -> Result<Vec<Value>> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(ReconcileError::input_shape(expected, &other)),
    };

    if let Some(bad) = items.iter().find(|item| !item.is_object()) {
        return Err(ReconcileError::input_shape(expected, bad));
    }

    Ok(items)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_athlete_preserves_unknown_fields() {
        let value = json!({
            "fis_code": "9531234",
            "name_ko": "김선수",
            "medals": {"gold": 1, "silver": 0, "bronze": 0},
            "recent_results": [
                {"date": "2024-02-10", "rank": 3, "fis_points": 12.5, "heat": "A"}
            ]
        });

        let athlete: Athlete = serde_json::from_value(value).unwrap();
        assert_eq!(athlete.fis_code, "9531234");
        assert!(athlete.extra.contains_key("medals"));
        assert_eq!(athlete.recent_results[0].extra["heat"], json!("A"));

        let back = serde_json::to_value(&athlete).unwrap();
        assert_eq!(back["medals"]["gold"], json!(1));
        assert_eq!(back["recent_results"][0]["heat"], json!("A"));
    }

    #[test]
    fn test_numeric_code_normalized_to_string() {
        let athlete: Athlete =
            serde_json::from_value(json!({"fis_code": 2500123, "recent_results": []})).unwrap();
        assert_eq!(athlete.fis_code, "2500123");
    }

    #[test]
    fn test_lenient_numbers_on_canonical_result() {
        let result: ResultRecord = serde_json::from_value(json!({
            "date": "2024-01-01",
            "rank": "4",
            "fis_points": null,
            "cup_points": "n/a"
        }))
        .unwrap();

        assert_eq!(result.rank, Some(4));
        assert_eq!(result.fis_points, 0.0);
        assert_eq!(result.cup_points, 0.0);
        assert_eq!(result.category_code, "");
    }

    #[test]
    fn test_modal_view_defaults_to_profile() {
        let mut athlete = Athlete::with_code("1");
        athlete.recent_results = vec![serde_json::from_value(json!({"date": "2024-01-01"})).unwrap()];

        assert_eq!(athlete.modal_view(), athlete.recent_results.as_slice());

        athlete.modal_results = Some(Vec::new());
        assert!(athlete.modal_view().is_empty());
    }

    #[test]
    fn test_stage_text_fallback() {
        let result: ResultRecord = serde_json::from_value(json!({
            "category": "",
            "category_name": "Qualification"
        }))
        .unwrap();
        assert_eq!(result.stage_text(), "Qualification");
    }

    #[test]
    fn test_parse_canonical_rejects_non_array() {
        let err = parse_canonical(json!({"athletes": []})).unwrap_err();
        assert!(matches!(err, ReconcileError::InputShape { .. }));
    }

    #[test]
    fn test_parse_canonical_rejects_non_object_element() {
        let err = parse_canonical(json!([{"fis_code": "1"}, 42])).unwrap_err();
        assert!(matches!(err, ReconcileError::InputShape { .. }));
    }

    #[test]
    fn test_parse_incoming_shapes() {
        let wrapped = parse_incoming(json!({"athletes": [{"fis_code": 7}]})).unwrap();
        assert_eq!(wrapped[0].code(), Some("7".to_string()));

        let bare = parse_incoming(json!([{"fis_code": "8"}])).unwrap();
        assert_eq!(bare.len(), 1);

        let missing = parse_incoming(json!({"metadata": {}})).unwrap();
        assert!(missing.is_empty());

        let err = parse_incoming(json!({"athletes": "nope"})).unwrap_err();
        assert!(matches!(err, ReconcileError::InputShape { .. }));
    }
}
