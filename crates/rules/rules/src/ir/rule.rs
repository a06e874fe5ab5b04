use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use conduit_core::{RuleId, UserId};

use super::draft::{NormalizedRuleFields, normalize_keywords, normalize_optional};

/// Which direction of call or meeting a rule admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Only records involving people outside the organization.
    External,
    /// Only records where every participant is internal.
    Internal,
    /// Both directions.
    #[default]
    All,
}

impl RecordType {
    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Internal => "internal",
            Self::All => "all",
        }
    }

    /// Returns `true` if a record with the given direction satisfies this filter.
    pub fn admits(self, is_external: bool) -> bool {
        match self {
            Self::All => true,
            Self::External => is_external,
            Self::Internal => !is_external,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external" => Ok(Self::External),
            "internal" => Ok(Self::Internal),
            "all" => Ok(Self::All),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// A validated ingestion rule owned by a connection's rule set.
///
/// Instances are only produced by [`RuleSet`](super::ruleset::RuleSet), which
/// assigns the id. The id never changes after creation, and edits keep the
/// `is_active` flag untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRule {
    id: RuleId,
    name: String,
    record_type: RecordType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_users: Option<BTreeSet<UserId>>,
    #[serde(default)]
    title_keywords: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deal_stages: Option<BTreeSet<String>>,
    is_active: bool,
}

impl IngestionRule {
    pub(crate) fn from_fields(id: RuleId, fields: NormalizedRuleFields, is_active: bool) -> Self {
        Self {
            id,
            name: fields.name,
            record_type: fields.record_type,
            selected_users: fields.selected_users,
            title_keywords: fields.title_keywords,
            deal_stages: fields.deal_stages,
            is_active,
        }
    }

    /// Replace every field except `id` and `is_active`.
    pub(crate) fn replace_fields(&mut self, fields: NormalizedRuleFields) {
        self.name = fields.name;
        self.record_type = fields.record_type;
        self.selected_users = fields.selected_users;
        self.title_keywords = fields.title_keywords;
        self.deal_stages = fields.deal_stages;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Re-apply normalization to a rule that arrived from outside a rule set
    /// (a deserialized settings payload or snapshot).
    pub(crate) fn renormalize(&mut self) {
        self.name = self.name.trim().to_owned();
        self.title_keywords = normalize_keywords(std::mem::take(&mut self.title_keywords));
        self.selected_users = self.selected_users.take().and_then(normalize_optional);
        self.deal_stages = self.deal_stages.take().and_then(normalize_optional);
    }

    pub fn id(&self) -> &RuleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// SME / attendee whitelist. `None` means no constraint.
    pub fn selected_users(&self) -> Option<&BTreeSet<UserId>> {
        self.selected_users.as_ref()
    }

    /// Lowercased keywords, OR-matched against record titles.
    pub fn title_keywords(&self) -> &BTreeSet<String> {
        &self.title_keywords
    }

    /// Deal-stage whitelist. `None` means no constraint.
    pub fn deal_stages(&self) -> Option<&BTreeSet<String>> {
        self.deal_stages.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}
