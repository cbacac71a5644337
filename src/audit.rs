// ✅ Consistency Auditor - regression gate for a canonical record set
//
// Re-derives the expected ordering per event group and reports where the
// stored order disagrees, plus athletes whose legacy summary/modal copy has
// drifted from the profile list. Read-only: it reports, it never fixes.

use crate::model::{Athlete, ResultRecord};
use crate::ordering::{compare_within_event, is_qualification};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default number of issues shown per list in the JSON summary
pub const DEFAULT_PREVIEW_LIMIT: usize = 20;

// ============================================================================
// ISSUES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderIssueKind {
    /// Group starts with a qualification row
    QualificationFirst,
    /// Group order differs from stage + rank order
    StageOrderMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIssue {
    pub fis_code: String,
    pub name: Option<String>,
    pub sport: String,
    /// `date|place|discipline`
    pub key: String,
    pub first_category: String,
    pub kind: OrderIssueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileModalMismatch {
    pub fis_code: String,
    pub name: Option<String>,
    pub profile_count: usize,
    pub modal_count: usize,
}

// ============================================================================
// AUDIT REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub athletes: usize,
    pub sports: BTreeMap<String, usize>,
    pub order_issues: Vec<OrderIssue>,
    pub profile_modal_mismatch: Vec<ProfileModalMismatch>,
}

impl AuditReport {
    /// True when both issue lists are empty
    pub fn passed(&self) -> bool {
        self.order_issues.is_empty() && self.profile_modal_mismatch.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Audit: {} athletes across {} sports, {} order issues, {} profile/modal mismatches",
            self.athletes,
            self.sports.len(),
            self.order_issues.len(),
            self.profile_modal_mismatch.len()
        )
    }

    /// Counts plus a bounded preview of each issue list
    pub fn to_summary(&self, preview_limit: usize) -> AuditSummary {
        AuditSummary {
            athletes: self.athletes,
            sports: self.sports.clone(),
            order_issue_count: self.order_issues.len(),
            profile_modal_mismatch_count: self.profile_modal_mismatch.len(),
            order_issues_preview: self.order_issues.iter().take(preview_limit).cloned().collect(),
            profile_modal_mismatch_preview: self
                .profile_modal_mismatch
                .iter()
                .take(preview_limit)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub athletes: usize,
    pub sports: BTreeMap<String, usize>,
    pub order_issue_count: usize,
    pub profile_modal_mismatch_count: usize,
    pub order_issues_preview: Vec<OrderIssue>,
    pub profile_modal_mismatch_preview: Vec<ProfileModalMismatch>,
}

// ============================================================================
// CONSISTENCY AUDITOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ConsistencyAuditor;

impl ConsistencyAuditor {
    pub fn new() -> Self {
        ConsistencyAuditor
    }

    pub fn audit(&self, athletes: &[Athlete]) -> AuditReport {
        let mut sports: BTreeMap<String, usize> = BTreeMap::new();
        let mut order_issues = Vec::new();
        let mut profile_modal_mismatch = Vec::new();

        for athlete in athletes {
            *sports.entry(athlete.sport_or_unknown().to_string()).or_insert(0) += 1;

            if let Some(mismatch) = self.check_profile_modal(athlete) {
                profile_modal_mismatch.push(mismatch);
            }

            order_issues.extend(self.check_order(athlete));
        }

        AuditReport {
            athletes: athletes.len(),
            sports,
            order_issues,
            profile_modal_mismatch,
        }
    }

    fn check_profile_modal(&self, athlete: &Athlete) -> Option<ProfileModalMismatch> {
        let profile = athlete.recent_results.as_slice();
        let modal = athlete.modal_view();

        if profile == modal {
            return None;
        }

        Some(ProfileModalMismatch {
            fis_code: athlete.fis_code.clone(),
            name: athlete.display_name().map(str::to_string),
            profile_count: profile.len(),
            modal_count: modal.len(),
        })
    }

    /// One issue at most per mixed qualification/main event group
    pub fn check_order(&self, athlete: &Athlete) -> Vec<OrderIssue> {
        let mut issues = Vec::new();

        for (key, rows) in group_by_event(&athlete.recent_results) {
            let has_qual = rows.iter().any(|r| is_qualification(r.stage_text()));
            let has_main = rows.iter().any(|r| !is_qualification(r.stage_text()));
            if !has_qual || !has_main {
                continue;
            }

            let first = rows[0];
            let kind = if is_qualification(first.stage_text()) {
                Some(OrderIssueKind::QualificationFirst)
            } else {
                let mut expected = rows.clone();
                expected.sort_by(|a, b| compare_within_event(a, b));
                if expected != rows {
                    Some(OrderIssueKind::StageOrderMismatch)
                } else {
                    None
                }
            };

            if let Some(kind) = kind {
                issues.push(OrderIssue {
                    fis_code: athlete.fis_code.clone(),
                    name: athlete.display_name().map(str::to_string),
                    sport: athlete.sport_or_unknown().to_string(),
                    key,
                    first_category: first.stage_text().to_string(),
                    kind,
                });
            }
        }

        issues
    }
}

/// Results grouped by `date|place|discipline`, groups in first-seen order
fn group_by_event(results: &[ResultRecord]) -> Vec<(String, Vec<&ResultRecord>)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&ResultRecord>)> = Vec::new();

    for result in results {
        let key = [
            result.date.as_deref().unwrap_or(""),
            result.place.as_deref().unwrap_or(""),
            result.discipline.as_deref().unwrap_or(""),
        ]
        .join("|");

        match positions.get(&key).copied() {
            Some(pos) => groups[pos].1.push(result),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![result]));
            }
        }
    }

    groups
}

// ============================================================================
// TESTS
// ============================================================================
