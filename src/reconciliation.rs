// ⚖️ Reconciliation Engine - merge an incoming scrape into the canonical set
//
// For every canonical athlete with a matching incoming record:
//   scalars   ← incoming value when present, else prior
//   results   ← merge policy output (dedup + sort)
//   fis_points ← first positive points in the sorted results, else prior, else 0
//
// Canonical athletes without a match pass through untouched.

use crate::coerce;
use crate::deduplication::{dedupe, KeyStrategy};
use crate::error::Result;
use crate::model::{parse_canonical, parse_incoming, Athlete, RawAthlete, RawResult, ResultRecord};
use crate::normalizer::Normalizer;
use crate::ordering::{compare_by_date, sort_results};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

// ============================================================================
// POLICIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Incoming supersedes: results become the incoming list, deduplicated on
    /// the full identity key and stage-sorted
    #[default]
    Replace,

    /// Additive: old ∪ new on the event key (newer wins), date-only sort
    Union,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Replace => "replace",
            MergePolicy::Union => "union",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(MergePolicy::Replace),
            "union" => Ok(MergePolicy::Union),
            other => Err(format!("unknown merge policy: {other} (expected replace|union)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Incoming records without a canonical athlete are ignored
    #[default]
    MergeOnly,

    /// Incoming records without a canonical athlete are appended as new athletes
    InsertNew,
}

impl FromStr for UnmatchedPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "merge_only" => Ok(UnmatchedPolicy::MergeOnly),
            "insert_new" => Ok(UnmatchedPolicy::InsertNew),
            other => Err(format!(
                "unknown unmatched policy: {other} (expected merge-only|insert-new)"
            )),
        }
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationStats {
    pub run_id: String,
    pub policy: MergePolicy,
    pub athlete_count: usize,
    pub updated_athlete_count: usize,
    pub inserted_athlete_count: usize,
    /// Incoming codes with no canonical athlete (MergeOnly)
    pub ignored_codes: Vec<String>,
    /// Dated results across the merged set
    pub total_result_count: usize,
    pub max_event_date: Option<String>,
    pub reconciled_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    pub athletes: Vec<Athlete>,
    pub stats: ReconciliationStats,
}

impl ReconciliationReport {
    pub fn summary(&self) -> String {
        format!(
            "Reconciliation ({}): {} athletes, {} updated, {} inserted, {} ignored, {} results, latest event {}",
            self.stats.policy,
            self.stats.athlete_count,
            self.stats.updated_athlete_count,
            self.stats.inserted_athlete_count,
            self.stats.ignored_codes.len(),
            self.stats.total_result_count,
            self.stats.max_event_date.as_deref().unwrap_or("-")
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    pub policy: MergePolicy,
    pub unmatched: UnmatchedPolicy,
    normalizer: Normalizer,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            policy: MergePolicy::Replace,
            unmatched: UnmatchedPolicy::MergeOnly,
            normalizer: Normalizer::new(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_unmatched(mut self, unmatched: UnmatchedPolicy) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Reconcile raw JSON values, checking both are collections of records first
    pub fn reconcile_values(
        &self,
        canonical: serde_json::Value,
        incoming: serde_json::Value,
    ) -> Result<ReconciliationReport> {
        let canonical = parse_canonical(canonical)?;
        let incoming = parse_incoming(incoming)?;
        Ok(self.reconcile(&canonical, &incoming))
    }

    /// Merge an incoming batch into the canonical set
    ///
    /// Example:
    /// ```
    /// use fis_results::{Athlete, ReconciliationEngine};
    ///
    /// let engine = ReconciliationEngine::new();
    /// let canonical = vec![Athlete::with_code("9531234")];
    ///
    /// let report = engine.reconcile(&canonical, &[]);
    /// assert_eq!(report.athletes, canonical);
    /// assert_eq!(report.stats.updated_athlete_count, 0);
    /// ```
    pub fn reconcile(&self, canonical: &[Athlete], incoming: &[RawAthlete]) -> ReconciliationReport {
        let by_code = self.index_incoming(incoming);

        let mut athletes = Vec::with_capacity(canonical.len());
        let mut updated = 0;

        for athlete in canonical {
            match by_code.get(athlete.fis_code.as_str()) {
                Some(raw) => {
                    let merged = self.merge_athlete(athlete, raw);
                    debug!(
                        fis_code = %merged.fis_code,
                        results = merged.recent_results.len(),
                        "athlete updated"
                    );
                    athletes.push(merged);
                    updated += 1;
                }
                None => athletes.push(athlete.clone()),
            }
        }

        let (inserted, ignored_codes) = self.handle_unmatched(canonical, incoming, &mut athletes);

        let (total_result_count, max_event_date) = result_totals(&athletes);

        let stats = ReconciliationStats {
            run_id: uuid::Uuid::new_v4().to_string(),
            policy: self.policy,
            athlete_count: athletes.len(),
            updated_athlete_count: updated,
            inserted_athlete_count: inserted,
            ignored_codes,
            total_result_count,
            max_event_date,
            reconciled_at: Utc::now(),
        };

        let report = ReconciliationReport { athletes, stats };
        info!("{}", report.summary());
        report
    }

    /// Incoming records by code; a later duplicate code replaces the earlier one
    fn index_incoming<'a>(&self, incoming: &'a [RawAthlete]) -> HashMap<String, &'a RawAthlete> {
        let mut by_code = HashMap::with_capacity(incoming.len());

        for raw in incoming {
            let Some(code) = raw.code() else {
                debug!("incoming record without fis_code skipped");
                continue;
            };
            if by_code.insert(code.clone(), raw).is_some() {
                warn!(fis_code = %code, "duplicate fis_code in incoming batch, keeping the last one");
            }
        }

        by_code
    }

    fn handle_unmatched(
        &self,
        canonical: &[Athlete],
        incoming: &[RawAthlete],
        athletes: &mut Vec<Athlete>,
    ) -> (usize, Vec<String>) {
        let known: HashSet<&str> = canonical.iter().map(|a| a.fis_code.as_str()).collect();

        // Batch order, last duplicate wins (same as the lookup)
        let mut unmatched: Vec<(String, &RawAthlete)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for raw in incoming {
            let Some(code) = raw.code() else { continue };
            if known.contains(code.as_str()) {
                continue;
            }
            match positions.get(&code).copied() {
                Some(pos) => unmatched[pos].1 = raw,
                None => {
                    positions.insert(code.clone(), unmatched.len());
                    unmatched.push((code, raw));
                }
            }
        }

        match self.unmatched {
            UnmatchedPolicy::MergeOnly => {
                for (code, _) in &unmatched {
                    debug!(fis_code = %code, "no canonical athlete, ignored");
                }
                (0, unmatched.into_iter().map(|(code, _)| code).collect())
            }
            UnmatchedPolicy::InsertNew => {
                let inserted = unmatched.len();
                for (code, raw) in unmatched {
                    debug!(fis_code = %code, "new athlete inserted");
                    athletes.push(self.merge_athlete(&Athlete::with_code(code), raw));
                }
                (inserted, Vec::new())
            }
        }
    }

    /// Updated athlete: incoming scalars over prior ones, results per policy
    pub fn merge_athlete(&self, old: &Athlete, new: &RawAthlete) -> Athlete {
        let recent_results = self.merge_results(&old.recent_results, &new.recent_results);

        let latest_points = recent_results
            .iter()
            .map(|r| r.fis_points)
            .find(|p| p.is_finite() && *p > 0.0)
            .or(old.fis_points)
            .unwrap_or(0.0);

        Athlete {
            fis_code: new.code().unwrap_or_else(|| old.fis_code.clone()),
            name_ko: merge_korean_name(old.name_ko.as_deref(), &new.name_ko),
            name_en: coerce::text(&new.name_en).or_else(|| old.name_en.clone()),
            sport: coerce::text(&new.sport).or_else(|| old.sport.clone()),
            sport_display: coerce::text(&new.sport_display).or_else(|| old.sport_display.clone()),
            team: coerce::text(&new.team).or_else(|| old.team.clone()),
            fis_url: coerce::text(&new.fis_url).or_else(|| old.fis_url.clone()),
            birth_date: coerce::text(&new.birth_date).or_else(|| old.birth_date.clone()),
            birth_year: coerce::whole(new.birth_year.as_ref()).or(old.birth_year),
            age: coerce::whole(new.age.as_ref()).or(old.age),
            current_rank: coerce::whole(new.current_rank.as_ref())
                .or(old.current_rank)
                .or(Some(0)),
            fis_points: Some(latest_points),
            recent_results,
            // One result source per athlete: the stale summary copy goes away
            modal_results: None,
            extra: old.extra.clone(),
        }
    }

    /// Merged, deduplicated, sorted result list for one athlete
    pub fn merge_results(&self, old: &[ResultRecord], new: &[RawResult]) -> Vec<ResultRecord> {
        let incoming = new.iter().map(|r| self.normalizer.normalize(r));

        match self.policy {
            MergePolicy::Replace => {
                let mut results = dedupe(incoming, KeyStrategy::Identity).results;
                sort_results(&mut results);
                results
            }
            MergePolicy::Union => {
                let prior = old.iter().cloned().map(|r| self.normalizer.renormalize(r));
                let mut results = dedupe(prior.chain(incoming), KeyStrategy::Event).results;
                results.sort_by(compare_by_date);
                results
            }
        }
    }
}

/// Incoming Korean name over the prior one, except that a Hangul name is
/// never replaced by a romanized fallback
fn merge_korean_name(old: Option<&str>, new: &Option<String>) -> Option<String> {
    match (old, coerce::text(new)) {
        (Some(prior), Some(incoming))
            if coerce::has_hangul(prior) && !coerce::has_hangul(&incoming) =>
        {
            Some(prior.to_string())
        }
        (_, Some(incoming)) => Some(incoming),
        (prior, None) => prior.map(str::to_string),
    }
}

/// Dated result count and the newest event date across a set
pub fn result_totals(athletes: &[Athlete]) -> (usize, Option<String>) {
    let mut count = 0;
    let mut max_date: Option<&str> = None;

    for result in athletes.iter().flat_map(|a| a.recent_results.iter()) {
        if !result.has_date() {
            continue;
        }
        count += 1;
        let date = result.date_str();
        if max_date.map_or(true, |m| date > m) {
            max_date = Some(date);
        }
    }

    (count, max_date.map(str::to_string))
}

// ============================================================================
// TESTS
// ============================================================================
