// 🔢 Lenient field coercion
//
// Scraped and hand-edited data carries numbers as numbers, numeric strings,
// nulls or garbage. None of that fails a record: every helper here returns
// None (or a default) and the caller decides the fallback.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a JSON value as a finite number
///
/// Accepts numbers and numeric strings (surrounding whitespace ignored).
/// Empty strings, booleans, arrays, objects and non-finite values → None.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

/// Same as [`number`] for an optional field
pub fn opt_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(number)
}

/// Non-negative whole number (birth year, age, ranking position)
pub fn whole(value: Option<&Value>) -> Option<u32> {
    let n = opt_number(value)?;
    if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

/// A finishing position: whole and strictly positive
pub fn finish_rank(value: Option<&Value>) -> Option<u32> {
    whole(value).filter(|r| *r > 0)
}

/// External codes arrive as strings or bare numbers; both normalize to text
pub fn code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-empty text, the way a truthiness check reads it
pub fn text(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// Contains Hangul jamo or syllables
pub fn has_hangul(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{3131}'..='\u{318E}' | '\u{AC00}'..='\u{D7A3}'))
}

// ============================================================================
// SERDE HELPERS (canonical records)
// ============================================================================

pub fn de_opt_whole<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(whole(value.as_ref()))
}

pub fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(opt_number(value.as_ref()))
}

pub fn de_number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(opt_number(value.as_ref()).unwrap_or(0.0))
}

pub fn de_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(code).unwrap_or_default())
}

pub fn de_string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_numeric_strings() {
        assert_eq!(number(&json!(12.5)), Some(12.5));
        assert_eq!(number(&json!(" 7 ")), Some(7.0));
        assert_eq!(number(&json!("abc")), None);
        assert_eq!(number(&json!("")), None);
        assert_eq!(number(&json!(null)), None);
        assert_eq!(number(&json!(true)), None);
    }

    #[test]
    fn test_number_rejects_non_finite() {
        assert_eq!(number(&json!("inf")), None);
        assert_eq!(number(&json!("NaN")), None);
    }

    #[test]
    fn test_finish_rank() {
        assert_eq!(finish_rank(Some(&json!(5))), Some(5));
        assert_eq!(finish_rank(Some(&json!("12"))), Some(12));
        assert_eq!(finish_rank(Some(&json!(0))), None);
        assert_eq!(finish_rank(Some(&json!(-3))), None);
        assert_eq!(finish_rank(Some(&json!(2.5))), None);
        assert_eq!(finish_rank(None), None);
    }

    #[test]
    fn test_code_normalization() {
        assert_eq!(code(&json!(9531234)), Some("9531234".to_string()));
        assert_eq!(code(&json!(" 2500 ")), Some("2500".to_string()));
        assert_eq!(code(&json!("")), None);
        assert_eq!(code(&json!(null)), None);
    }

    #[test]
    fn test_has_hangul() {
        assert!(has_hangul("김민지"));
        assert!(has_hangul("KIM 민지"));
        assert!(has_hangul("ㅎ"));
        assert!(!has_hangul("KIM Minji"));
        assert!(!has_hangul(""));
    }
}
