// ⏳ Freshness Summary - how current is the canonical set?
//
// Newest event overall, oldest "latest result" across athletes, and the
// athletes whose latest result is older than a stale threshold.

use crate::model::Athlete;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STALE_THRESHOLD_DAYS: i64 = 30;

/// Stale athletes listed in the summary
pub const STALE_PREVIEW_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleAthlete {
    pub fis_code: String,
    pub name: Option<String>,
    pub latest_result_date: String,
    pub age_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessSummary {
    pub max_event_date: Option<String>,
    pub min_latest_per_athlete: Option<String>,
    pub athletes_with_results: usize,
    pub total_events: usize,
    pub stale_threshold_days: i64,
    pub stale_athletes_count: usize,
    pub stale_athletes_preview: Vec<StaleAthlete>,
}

impl FreshnessSummary {
    pub fn summary(&self) -> String {
        format!(
            "Freshness: {} events, latest {}, {} of {} athletes stale (> {} days)",
            self.total_events,
            self.max_event_date.as_deref().unwrap_or("-"),
            self.stale_athletes_count,
            self.athletes_with_results,
            self.stale_threshold_days
        )
    }
}

pub fn summarize_freshness(
    athletes: &[Athlete],
    today: NaiveDate,
    stale_threshold_days: i64,
) -> FreshnessSummary {
    let mut max_event_date: Option<&str> = None;
    let mut latest_per_athlete: Vec<&str> = Vec::new();
    let mut total_events = 0;
    let mut stale = Vec::new();

    for athlete in athletes {
        let dates: Vec<&str> = athlete
            .recent_results
            .iter()
            .filter(|r| r.has_date())
            .map(|r| r.date_str())
            .collect();

        let Some(latest) = dates.iter().copied().max() else {
            continue;
        };

        total_events += dates.len();
        latest_per_athlete.push(latest);
        if max_event_date.map_or(true, |m| latest > m) {
            max_event_date = Some(latest);
        }

        // Unparseable dates still count above, they just can't be aged
        if let Ok(latest_day) = NaiveDate::parse_from_str(latest, "%Y-%m-%d") {
            let age_days = (today - latest_day).num_days();
            if age_days > stale_threshold_days {
                stale.push(StaleAthlete {
                    fis_code: athlete.fis_code.clone(),
                    name: athlete.name_en.clone(),
                    latest_result_date: latest.to_string(),
                    age_days,
                });
            }
        }
    }

    stale.sort_by(|a, b| b.age_days.cmp(&a.age_days));
    let stale_athletes_count = stale.len();
    stale.truncate(STALE_PREVIEW_LIMIT);

    FreshnessSummary {
        max_event_date: max_event_date.map(str::to_string),
        min_latest_per_athlete: latest_per_athlete.iter().min().map(|d| d.to_string()),
        athletes_with_results: latest_per_athlete.len(),
        total_events,
        stale_threshold_days,
        stale_athletes_count,
        stale_athletes_preview: stale,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_athlete(code: &str, dates: &[&str]) -> Athlete {
        let results: Vec<_> = dates.iter().map(|d| json!({"date": d, "rank": 1})).collect();
        serde_json::from_value(json!({
            "fis_code": code,
            "name_en": format!("Athlete {}", code),
            "recent_results": results
        }))
        .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_freshness_totals() {
        let athletes = vec![
            create_athlete("1", &["2024-02-20", "2024-01-05"]),
            create_athlete("2", &["2023-11-30"]),
            create_athlete("3", &[]),
        ];

        let summary = summarize_freshness(&athletes, today(), DEFAULT_STALE_THRESHOLD_DAYS);

        assert_eq!(summary.max_event_date.as_deref(), Some("2024-02-20"));
        assert_eq!(summary.min_latest_per_athlete.as_deref(), Some("2023-11-30"));
        assert_eq!(summary.athletes_with_results, 2);
        assert_eq!(summary.total_events, 3);
    }

    #[test]
    fn test_stale_athletes_sorted_oldest_first() {
        let athletes = vec![
            create_athlete("1", &["2024-02-20"]),
            create_athlete("2", &["2023-12-01"]),
            create_athlete("3", &["2023-06-01"]),
        ];

        let summary = summarize_freshness(&athletes, today(), 30);

        assert_eq!(summary.stale_athletes_count, 2);
        assert_eq!(summary.stale_athletes_preview[0].fis_code, "3");
        assert_eq!(summary.stale_athletes_preview[1].fis_code, "2");
        assert_eq!(summary.stale_athletes_preview[1].age_days, 91);
        assert_eq!(summary.stale_athletes_preview[1].name.as_deref(), Some("Athlete 2"));
    }

    #[test]
    fn test_unparseable_date_not_aged() {
        let athletes = vec![create_athlete("1", &["Feb 2019"])];

        let summary = summarize_freshness(&athletes, today(), 30);

        assert_eq!(summary.total_events, 1);
        assert_eq!(summary.stale_athletes_count, 0);
    }

    #[test]
    fn test_preview_limited() {
        let athletes: Vec<Athlete> = (0..15)
            .map(|i| create_athlete(&i.to_string(), &["2020-01-01"]))
            .collect();

        let summary = summarize_freshness(&athletes, today(), 30);

        assert_eq!(summary.stale_athletes_count, 15);
        assert_eq!(summary.stale_athletes_preview.len(), STALE_PREVIEW_LIMIT);
    }
}
