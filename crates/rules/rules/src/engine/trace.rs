use serde::{Deserialize, Serialize};

use conduit_core::RuleId;

use super::eval::Evaluation;

/// One of the independent constraints a rule places on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    RecordType,
    TitleKeywords,
    DealStages,
    SelectedUsers,
}

impl Dimension {
    /// Every dimension, in the order they are checked.
    pub const ALL: [Self; 4] = [
        Self::RecordType,
        Self::TitleKeywords,
        Self::DealStages,
        Self::SelectedUsers,
    ];

    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordType => "record_type",
            Self::TitleKeywords => "title_keywords",
            Self::DealStages => "deal_stages",
            Self::SelectedUsers => "selected_users",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating a single rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleTraceResult {
    /// Every constrained dimension was satisfied.
    Matched,
    /// At least one dimension failed.
    NotMatched,
    /// The rule is inactive and was not evaluated.
    Skipped,
}

impl RuleTraceResult {
    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NotMatched => "not_matched",
            Self::Skipped => "skipped",
        }
    }
}

/// Trace entry for a single rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTraceEntry {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub result: RuleTraceResult,
    /// Dimensions the record failed. Empty unless `result` is `not_matched`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_dimensions: Vec<Dimension>,
}

/// Complete trace of an evaluation pass, for audit and the CLI `--explain` view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub included: bool,
    pub matched_rule_ids: Vec<RuleId>,
    /// Number of active rules that were evaluated.
    pub total_rules_evaluated: usize,
    /// Number of inactive rules that were skipped.
    pub total_rules_skipped: usize,
    /// Per-rule entries in rule-set order.
    pub trace: Vec<RuleTraceEntry>,
}

impl EvaluationTrace {
    /// Collapse the trace into the plain evaluation outcome.
    pub fn evaluation(&self) -> Evaluation {
        Evaluation {
            included: self.included,
            matched_rule_ids: self.matched_rule_ids.clone(),
        }
    }
}
