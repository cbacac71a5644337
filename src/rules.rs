// 🏷️ Category Code Rules - Rules as Data
// Free-text category labels → short category codes, first match wins

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// CATEGORY CODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryCode {
    #[serde(rename = "QUA")]
    Qualification,
    #[serde(rename = "WC")]
    WorldCup,
    #[serde(rename = "WSC")]
    WorldChampionships,
    #[serde(rename = "OWG")]
    OlympicWinterGames,
    #[serde(rename = "AWG")]
    AsianWinterGames,
    #[serde(rename = "FEC")]
    FarEastCup,
    #[serde(rename = "FIS")]
    Fis,
}

impl CategoryCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryCode::Qualification => "QUA",
            CategoryCode::WorldCup => "WC",
            CategoryCode::WorldChampionships => "WSC",
            CategoryCode::OlympicWinterGames => "OWG",
            CategoryCode::AsianWinterGames => "AWG",
            CategoryCode::FarEastCup => "FEC",
            CategoryCode::Fis => "FIS",
        }
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Pattern appears anywhere in the label
    #[default]
    Contains,
    /// Whole label equals the pattern
    Equals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Rule ID for tracking
    pub id: String,

    /// Lowercase pattern
    pub pattern: String,

    #[serde(default)]
    pub match_kind: MatchKind,

    pub code: CategoryCode,

    /// Priority (higher = tried first)
    #[serde(default)]
    pub priority: i32,
}

impl CategoryRule {
    pub fn contains(id: &str, pattern: &str, code: CategoryCode, priority: i32) -> Self {
        CategoryRule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            match_kind: MatchKind::Contains,
            code,
            priority,
        }
    }

    pub fn equals(id: &str, pattern: &str, code: CategoryCode, priority: i32) -> Self {
        CategoryRule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            match_kind: MatchKind::Equals,
            code,
            priority,
        }
    }

    /// Case-insensitive match against a label
    pub fn matches(&self, label: &str) -> bool {
        let label_lower = label.to_lowercase();
        let pattern_lower = self.pattern.to_lowercase();

        match self.match_kind {
            MatchKind::Contains => label_lower.contains(&pattern_lower),
            MatchKind::Equals => label_lower == pattern_lower,
        }
    }
}

// ============================================================================
// RULE SET
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCodeRules {
    rules: Vec<CategoryRule>,
}

impl CategoryCodeRules {
    /// Full precedence list, qualification first
    pub fn standard() -> Self {
        let mut rules = vec![
            CategoryRule::contains("qualification", "qualif", CategoryCode::Qualification, 80),
            CategoryRule::equals("qualification-short", "qua", CategoryCode::Qualification, 80),
        ];
        rules.extend(Self::competition_rules());
        Self::from_rules(rules)
    }

    /// Precedence list without the qualification branch
    pub fn without_qualification() -> Self {
        Self::from_rules(Self::competition_rules())
    }

    fn competition_rules() -> Vec<CategoryRule> {
        vec![
            CategoryRule::contains("world-cup", "world cup", CategoryCode::WorldCup, 70),
            CategoryRule::contains(
                "world-championships",
                "world championships",
                CategoryCode::WorldChampionships,
                60,
            ),
            CategoryRule::contains("olympics", "olympic", CategoryCode::OlympicWinterGames, 50),
            CategoryRule::contains("asian-winter", "asian winter", CategoryCode::AsianWinterGames, 40),
            CategoryRule::contains("far-east-cup", "far east cup", CategoryCode::FarEastCup, 30),
            CategoryRule::equals("fis", "fis", CategoryCode::Fis, 20),
        ]
    }

    /// Create rule set from a list of rules; ties keep declaration order
    pub fn from_rules(mut rules: Vec<CategoryRule>) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        CategoryCodeRules { rules }
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read category rules file: {:?}", path.as_ref()))?;

        let rules: Vec<CategoryRule> =
            serde_json::from_str(&content).context("Failed to parse category rules JSON")?;

        Ok(CategoryCodeRules::from_rules(rules))
    }

    /// First matching rule's code
    pub fn derive(&self, label: &str) -> Option<CategoryCode> {
        self.rules
            .iter()
            .find(|rule| rule.matches(label))
            .map(|rule| rule.code)
    }

    /// Code as stored on a result ("" when nothing matched)
    pub fn code_for(&self, label: &str) -> String {
        self.derive(label)
            .map(|code| code.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for CategoryCodeRules {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_standard_precedence() {
        let rules = CategoryCodeRules::standard();

        assert_eq!(rules.code_for("FIS World Cup"), "WC");
        assert_eq!(rules.code_for("Qualification Round"), "QUA");
        assert_eq!(rules.code_for("QUA"), "QUA");
        assert_eq!(rules.code_for("FIS"), "FIS");
        assert_eq!(rules.code_for("Regional Cup"), "");
        assert_eq!(rules.code_for("World Championships"), "WSC");
        assert_eq!(rules.code_for("Olympic Winter Games"), "OWG");
        assert_eq!(rules.code_for("Asian Winter Games"), "AWG");
        assert_eq!(rules.code_for("Far East Cup"), "FEC");
    }

    #[test]
    fn test_qualification_wins_over_competition() {
        let rules = CategoryCodeRules::standard();
        assert_eq!(rules.derive("World Cup Qualification"), Some(CategoryCode::Qualification));
    }

    #[test]
    fn test_fis_requires_exact_label() {
        let rules = CategoryCodeRules::standard();
        assert_eq!(rules.derive("FIS Race"), None);
        assert_eq!(rules.derive("fis"), Some(CategoryCode::Fis));
    }

    #[test]
    fn test_without_qualification_variant() {
        let rules = CategoryCodeRules::without_qualification();

        assert_eq!(rules.code_for("Qualification Round"), "");
        assert_eq!(rules.code_for("World Cup Qualification"), "WC");
        assert_eq!(rules.rule_count(), 6);
    }

    #[test]
    fn test_rule_priority_ordering() {
        let rules = CategoryCodeRules::from_rules(vec![
            CategoryRule::contains("generic", "cup", CategoryCode::FarEastCup, 1),
            CategoryRule::contains("specific", "world cup", CategoryCode::WorldCup, 100),
        ]);

        assert_eq!(rules.rules()[0].id, "specific");
        assert_eq!(rules.derive("World Cup"), Some(CategoryCode::WorldCup));
        assert_eq!(rules.derive("Continental Cup"), Some(CategoryCode::FarEastCup));
    }

    #[test]
    fn test_load_rules_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "wc", "pattern": "world cup", "code": "WC", "priority": 10}},
                {{"id": "fis", "pattern": "fis", "match_kind": "equals", "code": "FIS"}}
            ]"#
        )
        .unwrap();

        let rules = CategoryCodeRules::from_file(file.path()).unwrap();

        assert_eq!(rules.rule_count(), 2);
        assert_eq!(rules.code_for("FIS"), "FIS");
        assert_eq!(rules.code_for("Audi FIS World Cup"), "WC");
    }
}
