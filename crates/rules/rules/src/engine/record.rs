use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use conduit_core::UserId;

/// A call, meeting, or document offered for ingestion by a source.
///
/// The evaluator has no knowledge of the transport that produced the record;
/// source adapters map their payloads onto this shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// `true` when the record involves people outside the organization.
    pub is_external: bool,
    pub title: String,
    /// Deal stage of the associated opportunity, when the source knows it.
    #[serde(default)]
    pub deal_stage: Option<String>,
    #[serde(default)]
    pub participant_ids: BTreeSet<UserId>,
}

impl CandidateRecord {
    /// Create a record with the given direction and title and no participants.
    pub fn new(is_external: bool, title: impl Into<String>) -> Self {
        Self {
            is_external,
            title: title.into(),
            deal_stage: None,
            participant_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_deal_stage(mut self, stage: impl Into<String>) -> Self {
        self.deal_stage = Some(stage.into());
        self
    }

    #[must_use]
    pub fn with_participant(mut self, user: impl Into<UserId>) -> Self {
        self.participant_ids.insert(user.into());
        self
    }
}
