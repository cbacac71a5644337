// ⚙️ Configuration - TOML file with policy, category rules and bundle markers

use crate::audit::DEFAULT_PREVIEW_LIMIT;
use crate::bundle::BundleMarkers;
use crate::freshness::DEFAULT_STALE_THRESHOLD_DAYS;
use crate::normalizer::Normalizer;
use crate::reconciliation::{MergePolicy, ReconciliationEngine, UnmatchedPolicy};
use crate::rules::{CategoryCodeRules, CategoryRule};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which built-in category precedence list to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePreset {
    #[default]
    Standard,
    WithoutQualification,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: MergePolicy,
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
    #[serde(default)]
    pub category_rules: RulePreset,
    /// JSON file of category rules; wins over the preset
    #[serde(default)]
    pub category_rules_file: Option<PathBuf>,
    /// Inline rules; win over both the file and the preset
    #[serde(default)]
    pub rules: Vec<CategoryRule>,
    #[serde(default = "default_stale_threshold_days")]
    pub stale_threshold_days: i64,
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
    #[serde(default)]
    pub bundle: BundleMarkers,
}

fn default_stale_threshold_days() -> i64 {
    DEFAULT_STALE_THRESHOLD_DAYS
}

fn default_preview_limit() -> usize {
    DEFAULT_PREVIEW_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Config {
            policy: MergePolicy::default(),
            unmatched: UnmatchedPolicy::default(),
            category_rules: RulePreset::default(),
            category_rules_file: None,
            rules: Vec::new(),
            stale_threshold_days: default_stale_threshold_days(),
            preview_limit: default_preview_limit(),
            bundle: BundleMarkers::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.preview_limit == 0 {
            anyhow::bail!("preview_limit must be > 0");
        }

        Ok(config)
    }

    /// Config file when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Config::load(p),
            None => Ok(Config::default()),
        }
    }

    pub fn category_code_rules(&self) -> Result<CategoryCodeRules> {
        if !self.rules.is_empty() {
            return Ok(CategoryCodeRules::from_rules(self.rules.clone()));
        }
        if let Some(path) = &self.category_rules_file {
            return CategoryCodeRules::from_file(path);
        }
        Ok(match self.category_rules {
            RulePreset::Standard => CategoryCodeRules::standard(),
            RulePreset::WithoutQualification => CategoryCodeRules::without_qualification(),
        })
    }

    pub fn engine(&self) -> Result<ReconciliationEngine> {
        let normalizer = Normalizer::with_rules(self.category_code_rules()?);
        Ok(ReconciliationEngine::new()
            .with_policy(self.policy)
            .with_unmatched(self.unmatched)
            .with_normalizer(normalizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CategoryCode;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = write_config("");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.policy, MergePolicy::Replace);
        assert_eq!(config.unmatched, UnmatchedPolicy::MergeOnly);
        assert_eq!(config.stale_threshold_days, 30);
        assert_eq!(config.bundle.start_marker, "ma=[");
    }

    #[test]
    fn test_full_config() {
        let file = write_config(
            r#"
policy = "union"
unmatched = "insert_new"
category_rules = "without_qualification"
stale_threshold_days = 14
preview_limit = 5

[bundle]
start_marker = "athletes=["
end_marker = ";export"
"#,
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.policy, MergePolicy::Union);
        assert_eq!(config.unmatched, UnmatchedPolicy::InsertNew);
        assert_eq!(config.stale_threshold_days, 14);
        assert_eq!(config.bundle.end_marker, ";export");
        assert_eq!(config.category_code_rules().unwrap().code_for("Qualification"), "");

        let engine = config.engine().unwrap();
        assert_eq!(engine.policy, MergePolicy::Union);
    }

    #[test]
    fn test_inline_rules_override_preset() {
        let file = write_config(
            r#"
[[rules]]
id = "nc"
pattern = "national championships"
code = "FIS"
"#,
        );
        let config = Config::load(file.path()).unwrap();
        let rules = config.category_code_rules().unwrap();

        assert_eq!(rules.rule_count(), 1);
        assert_eq!(rules.derive("Korean National Championships"), Some(CategoryCode::Fis));
        assert_eq!(rules.derive("World Cup"), None);
    }

    #[test]
    fn test_zero_preview_limit_rejected() {
        let file = write_config("preview_limit = 0");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let file = write_config(r#"policy = "merge""#);
        assert!(Config::load(file.path()).is_err());
    }
}
