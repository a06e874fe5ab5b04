use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use conduit_core::RuleId;

use super::draft::{RuleDraft, validate_draft};
use super::rule::IngestionRule;
use crate::error::RuleError;

/// An ordered list of ingestion rules belonging to one connection.
///
/// Rule ids are unique within the set. Order is creation order and is the
/// order in which matches are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<IngestionRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a draft, assign it a fresh id, and append it.
    pub fn create(&mut self, draft: &RuleDraft) -> Result<&IngestionRule, RuleError> {
        let fields = validate_draft(draft)?;
        let mut id = RuleId::generate();
        while self.get(&id).is_some() {
            id = RuleId::generate();
        }
        debug!(rule = %id, name = %fields.name, "creating ingestion rule");
        self.rules
            .push(IngestionRule::from_fields(id, fields, draft.is_active));
        Ok(&self.rules[self.rules.len() - 1])
    }

    /// Replace every field of an existing rule except its id and active flag.
    pub fn update(&mut self, id: &RuleId, draft: &RuleDraft) -> Result<&IngestionRule, RuleError> {
        let fields = validate_draft(draft)?;
        let rule = self.get_mut(id)?;
        rule.replace_fields(fields);
        Ok(rule)
    }

    /// Remove a rule, returning it.
    pub fn delete(&mut self, id: &RuleId) -> Result<IngestionRule, RuleError> {
        let index = self
            .rules
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| RuleError::NotFound(id.clone()))?;
        Ok(self.rules.remove(index))
    }

    /// Flip a rule's active flag, returning the new value.
    pub fn toggle(&mut self, id: &RuleId) -> Result<bool, RuleError> {
        let rule = self.get_mut(id)?;
        let active = !rule.is_active();
        rule.set_active(active);
        Ok(active)
    }

    /// Set a rule's active flag.
    pub fn set_active(&mut self, id: &RuleId, active: bool) -> Result<(), RuleError> {
        self.get_mut(id)?.set_active(active);
        Ok(())
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &RuleId) -> Option<&IngestionRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    fn get_mut(&mut self, id: &RuleId) -> Result<&mut IngestionRule, RuleError> {
        self.rules
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| RuleError::NotFound(id.clone()))
    }

    /// Iterate over every rule in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &IngestionRule> {
        self.rules.iter()
    }

    /// Iterate over the rules with `is_active = true`.
    pub fn active(&self) -> impl Iterator<Item = &IngestionRule> {
        self.rules.iter().filter(|r| r.is_active())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Re-normalize every rule and check the set-level invariants.
    ///
    /// Used when a whole rule list arrives from outside (a settings payload
    /// or a persisted snapshot) instead of through [`create`](Self::create).
    pub fn normalize_and_validate(&mut self) -> Result<(), RuleError> {
        let mut seen = BTreeSet::new();
        for rule in &mut self.rules {
            rule.renormalize();
            if rule.name().is_empty() {
                return Err(crate::error::ValidationError::EmptyName.into());
            }
            if !seen.insert(rule.id().clone()) {
                return Err(RuleError::DuplicateId(rule.id().clone()));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a IngestionRule;
    type IntoIter = std::slice::Iter<'a, IngestionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
