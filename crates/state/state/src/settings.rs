//! Typed per-provider connection settings.
//!
//! Every connection carries exactly one settings variant, chosen by its
//! provider's category. Each variant embeds the connection's ingestion rule
//! set next to the options specific to that kind of source.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use conduit_provider::ProviderCategory;
use conduit_rules::{RuleError, RuleSet};

const fn default_true() -> bool {
    true
}

/// Discriminant of [`ConnectionSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsKind {
    CallIntelligence,
    Crm,
    Communication,
    Document,
}

impl SettingsKind {
    /// The settings shape a provider of `category` uses.
    pub fn for_category(category: ProviderCategory) -> Self {
        match category {
            ProviderCategory::CallIntelligence | ProviderCategory::Calendar => {
                Self::CallIntelligence
            }
            ProviderCategory::Crm => Self::Crm,
            ProviderCategory::Communication => Self::Communication,
            ProviderCategory::StorageAndWiki | ProviderCategory::Enablement => Self::Document,
        }
    }

    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallIntelligence => "call_intelligence",
            Self::Crm => "crm",
            Self::Communication => "communication",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for SettingsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for call recorders and calendars (calls and meetings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallIntelligenceSettings {
    #[serde(default)]
    pub rules: RuleSet,
    /// Pull transcripts alongside call metadata.
    #[serde(default = "default_true")]
    pub include_transcripts: bool,
}

impl Default for CallIntelligenceSettings {
    fn default() -> Self {
        Self {
            rules: RuleSet::new(),
            include_transcripts: true,
        }
    }
}

/// Settings for CRMs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmSettings {
    #[serde(default)]
    pub rules: RuleSet,
    /// Keep deal stages in sync so rules can filter on them.
    #[serde(default = "default_true")]
    pub sync_deal_stages: bool,
}

impl Default for CrmSettings {
    fn default() -> Self {
        Self {
            rules: RuleSet::new(),
            sync_deal_stages: true,
        }
    }
}

/// Settings for chat platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationSettings {
    #[serde(default)]
    pub rules: RuleSet,
    /// Channels to read. Empty means every channel the account can see.
    #[serde(default)]
    pub channels: BTreeSet<String>,
}

/// Settings for wikis, drives, and enablement libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSettings {
    #[serde(default)]
    pub rules: RuleSet,
    /// Spaces or folders to crawl. Empty means everything.
    #[serde(default)]
    pub spaces: BTreeSet<String>,
}

/// A connection's full settings payload.
///
/// `configure` replaces the whole value at once; there is no partial merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionSettings {
    CallIntelligence(CallIntelligenceSettings),
    Crm(CrmSettings),
    Communication(CommunicationSettings),
    Document(DocumentSettings),
}

impl ConnectionSettings {
    /// Empty settings of the shape matching `category`.
    pub fn default_for(category: ProviderCategory) -> Self {
        match SettingsKind::for_category(category) {
            SettingsKind::CallIntelligence => {
                Self::CallIntelligence(CallIntelligenceSettings::default())
            }
            SettingsKind::Crm => Self::Crm(CrmSettings::default()),
            SettingsKind::Communication => Self::Communication(CommunicationSettings::default()),
            SettingsKind::Document => Self::Document(DocumentSettings::default()),
        }
    }

    pub fn kind(&self) -> SettingsKind {
        match self {
            Self::CallIntelligence(_) => SettingsKind::CallIntelligence,
            Self::Crm(_) => SettingsKind::Crm,
            Self::Communication(_) => SettingsKind::Communication,
            Self::Document(_) => SettingsKind::Document,
        }
    }

    /// The embedded ingestion rules.
    pub fn rules(&self) -> &RuleSet {
        match self {
            Self::CallIntelligence(s) => &s.rules,
            Self::Crm(s) => &s.rules,
            Self::Communication(s) => &s.rules,
            Self::Document(s) => &s.rules,
        }
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        match self {
            Self::CallIntelligence(s) => &mut s.rules,
            Self::Crm(s) => &mut s.rules,
            Self::Communication(s) => &mut s.rules,
            Self::Document(s) => &mut s.rules,
        }
    }

    /// Normalize the embedded rules and check their invariants.
    pub fn normalize_and_validate(&mut self) -> Result<(), RuleError> {
        self.rules_mut().normalize_and_validate()
    }
}

#[cfg(test)]
mod tests {
    use conduit_rules::RuleDraft;

    use super::*;

    #[test]
    fn every_category_maps_to_a_kind() {
        assert_eq!(
            SettingsKind::for_category(ProviderCategory::Calendar),
            SettingsKind::CallIntelligence
        );
        assert_eq!(
            SettingsKind::for_category(ProviderCategory::Enablement),
            SettingsKind::Document
        );
        for category in ProviderCategory::ALL {
            let settings = ConnectionSettings::default_for(category);
            assert_eq!(settings.kind(), SettingsKind::for_category(category));
            assert!(settings.rules().is_empty());
        }
    }

    #[test]
    fn serializes_with_kind_tag() {
        let mut settings = ConnectionSettings::default_for(ProviderCategory::CallIntelligence);
        settings
            .rules_mut()
            .create(&RuleDraft::new("Demos").keyword("demo"))
            .unwrap();

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["kind"], "call_intelligence");
        assert_eq!(json["include_transcripts"], true);
        assert_eq!(json["rules"][0]["name"], "Demos");

        let back: ConnectionSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn deserializes_minimal_payload_with_defaults() {
        let settings: ConnectionSettings =
            serde_json::from_str(r#"{"kind":"crm"}"#).unwrap();
        match settings {
            ConnectionSettings::Crm(crm) => {
                assert!(crm.sync_deal_stages);
                assert!(crm.rules.is_empty());
            }
            other => panic!("unexpected settings: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result = serde_json::from_str::<ConnectionSettings>(r#"{"kind":"ticketing"}"#);
        assert!(result.is_err());
    }
}
