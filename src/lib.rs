// FIS Results - Core Library
// Normalizer, reconciliation engine and consistency auditor for the
// canonical athlete result set embedded in the site bundle

pub mod error;
pub mod coerce;
pub mod model;
pub mod rules;          // Category code rules (rules as data)
pub mod normalizer;
pub mod ordering;       // Date / stage / rank comparator
pub mod deduplication;
pub mod reconciliation;
pub mod audit;
pub mod freshness;
pub mod export;
pub mod bundle;         // Site bundle I/O (extract, back up, re-embed)
pub mod config;

// Re-export commonly used types
pub use error::ReconcileError;
pub use model::{
    Athlete, ResultRecord, RawAthlete, RawResult,
    parse_canonical, parse_incoming,
};
pub use rules::{
    CategoryCode, CategoryCodeRules, CategoryRule, MatchKind,
};
pub use normalizer::Normalizer;
pub use ordering::{
    StagePriority, compare_results, compare_within_event, sort_results,
};
pub use deduplication::{
    DedupOutcome, EventKey, KeyStrategy, ResultKey, dedupe,
};
pub use reconciliation::{
    MergePolicy, ReconciliationEngine, ReconciliationReport, ReconciliationStats,
    UnmatchedPolicy,
};
pub use audit::{
    AuditReport, AuditSummary, ConsistencyAuditor, OrderIssue, OrderIssueKind,
    ProfileModalMismatch,
};
pub use freshness::{FreshnessSummary, StaleAthlete, summarize_freshness};
pub use export::{ResultRow, result_rows, result_uid};
pub use bundle::{Bundle, BundleMarkers};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
