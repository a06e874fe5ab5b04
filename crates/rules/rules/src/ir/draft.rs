use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use conduit_core::UserId;

use super::rule::RecordType;
use crate::error::ValidationError;

const fn default_true() -> bool {
    true
}

/// Caller-supplied rule fields, before validation and id assignment.
///
/// Drafts are what a configuration panel (or a YAML rule file) produces.
/// Empty `selected_users` / `deal_stages` mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub name: String,
    #[serde(default)]
    pub record_type: RecordType,
    #[serde(default)]
    pub selected_users: Vec<UserId>,
    #[serde(default)]
    pub title_keywords: Vec<String>,
    #[serde(default)]
    pub deal_stages: Vec<String>,
    /// Initial activation state. Only consulted on creation; edits keep the
    /// existing flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl RuleDraft {
    /// Start a draft with the given name, admitting all record types.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::All,
            selected_users: Vec::new(),
            title_keywords: Vec::new(),
            deal_stages: Vec::new(),
            is_active: true,
        }
    }

    #[must_use]
    pub fn record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.title_keywords.push(keyword.into());
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<UserId>) -> Self {
        self.selected_users.push(user.into());
        self
    }

    #[must_use]
    pub fn deal_stage(mut self, stage: impl Into<String>) -> Self {
        self.deal_stages.push(stage.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

/// The validated, normalized fields of a rule, ready for id assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRuleFields {
    /// Trimmed, non-empty name.
    pub name: String,
    pub record_type: RecordType,
    pub selected_users: Option<BTreeSet<UserId>>,
    /// Lowercased and deduplicated. Whitespace is kept as typed.
    pub title_keywords: BTreeSet<String>,
    pub deal_stages: Option<BTreeSet<String>>,
}

/// Validate and normalize a draft.
///
/// Fails with [`ValidationError::EmptyName`] when the trimmed name is empty.
/// Keywords are lowercased and deduplicated; empty user and deal-stage lists
/// become `None`.
pub fn validate_draft(draft: &RuleDraft) -> Result<NormalizedRuleFields, ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    let selected_users = normalize_optional(draft.selected_users.iter().cloned());

    Ok(NormalizedRuleFields {
        name: name.to_owned(),
        record_type: draft.record_type,
        selected_users,
        title_keywords: normalize_keywords(draft.title_keywords.iter().cloned()),
        deal_stages: normalize_optional(draft.deal_stages.iter().cloned()),
    })
}

/// Lowercase and deduplicate. Only the empty string is dropped, since it is a
/// substring of every title and constrains nothing.
pub(crate) fn normalize_keywords(keywords: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    keywords
        .into_iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect()
}

/// Deduplicate, collapsing an empty list to `None`. Values are compared
/// verbatim against records, so they are not trimmed.
pub(crate) fn normalize_optional<T: Ord>(
    values: impl IntoIterator<Item = T>,
) -> Option<BTreeSet<T>> {
    let set: BTreeSet<T> = values.into_iter().collect();
    (!set.is_empty()).then_some(set)
}
