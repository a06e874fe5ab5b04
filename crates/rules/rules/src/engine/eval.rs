use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use conduit_core::RuleId;

use super::record::CandidateRecord;
use super::trace::{Dimension, EvaluationTrace, RuleTraceEntry, RuleTraceResult};
use crate::ir::rule::IngestionRule;

/// Whether a record should be ingested, and which rules admitted it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    pub included: bool,
    /// Every rule that independently matched, in rule-set order.
    pub matched_rule_ids: Vec<RuleId>,
}

/// A record with its title lowercased once for all keyword checks.
struct Prepared<'r> {
    record: &'r CandidateRecord,
    title: String,
}

impl<'r> Prepared<'r> {
    fn new(record: &'r CandidateRecord) -> Self {
        Self {
            record,
            title: record.title.to_lowercase(),
        }
    }

    fn satisfies(&self, rule: &IngestionRule, dimension: Dimension) -> bool {
        match dimension {
            Dimension::RecordType => rule.record_type().admits(self.record.is_external),
            Dimension::TitleKeywords => {
                let keywords = rule.title_keywords();
                keywords.is_empty() || keywords.iter().any(|k| self.title_contains(k))
            }
            Dimension::DealStages => rule.deal_stages().is_none_or(|stages| {
                self.record
                    .deal_stage
                    .as_ref()
                    .is_some_and(|stage| stages.contains(stage))
            }),
            Dimension::SelectedUsers => rule.selected_users().is_none_or(|users| {
                // Iterate the smaller set.
                if users.len() <= self.record.participant_ids.len() {
                    users.iter().any(|u| self.record.participant_ids.contains(u))
                } else {
                    self.record.participant_ids.iter().any(|u| users.contains(u))
                }
            }),
        }
    }

    /// Rules built through a rule set hold lowercase keywords already; a
    /// deserialized rule that skipped normalization may not.
    fn title_contains(&self, keyword: &str) -> bool {
        if keyword.chars().any(char::is_uppercase) {
            self.title.contains(&keyword.to_lowercase())
        } else {
            self.title.contains(keyword)
        }
    }

    fn matches(&self, rule: &IngestionRule) -> bool {
        Dimension::ALL.iter().all(|d| self.satisfies(rule, *d))
    }

    fn failed_dimensions(&self, rule: &IngestionRule) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| !self.satisfies(rule, *d))
            .collect()
    }
}

/// Decide whether `record` should be ingested under `rules`.
///
/// A rule matches when every dimension it constrains is satisfied. The record
/// is included when at least one active rule matches. Inactive rules never
/// match, so an empty or fully inactive rule set excludes every record.
#[instrument(skip_all, fields(title = %record.title))]
pub fn evaluate<'a>(
    record: &CandidateRecord,
    rules: impl IntoIterator<Item = &'a IngestionRule>,
) -> Evaluation {
    let prepared = Prepared::new(record);
    let mut matched_rule_ids = Vec::new();

    for rule in rules {
        if !rule.is_active() {
            debug!(rule = %rule.id(), "skipping inactive rule");
            continue;
        }
        if prepared.matches(rule) {
            debug!(rule = %rule.id(), name = %rule.name(), "rule matched");
            matched_rule_ids.push(rule.id().clone());
        }
    }

    let included = !matched_rule_ids.is_empty();
    debug!(included, matched = matched_rule_ids.len(), "evaluation complete");
    Evaluation {
        included,
        matched_rule_ids,
    }
}

/// Like [`evaluate`], but records why each rule did or did not match.
pub fn explain<'a>(
    record: &CandidateRecord,
    rules: impl IntoIterator<Item = &'a IngestionRule>,
) -> EvaluationTrace {
    let prepared = Prepared::new(record);
    let mut trace = Vec::new();
    let mut matched_rule_ids = Vec::new();
    let mut skipped = 0;

    for rule in rules {
        let (result, failed_dimensions) = if rule.is_active() {
            let failed = prepared.failed_dimensions(rule);
            if failed.is_empty() {
                matched_rule_ids.push(rule.id().clone());
                (RuleTraceResult::Matched, failed)
            } else {
                (RuleTraceResult::NotMatched, failed)
            }
        } else {
            skipped += 1;
            (RuleTraceResult::Skipped, Vec::new())
        };

        trace.push(RuleTraceEntry {
            rule_id: rule.id().clone(),
            rule_name: rule.name().to_owned(),
            result,
            failed_dimensions,
        });
    }

    EvaluationTrace {
        included: !matched_rule_ids.is_empty(),
        matched_rule_ids,
        total_rules_evaluated: trace.len() - skipped,
        total_rules_skipped: skipped,
        trace,
    }
}
