use serde::Deserialize;

use conduit_core::UserId;
use conduit_rules::RecordType;

/// Returns the default value `true` for serde.
const fn default_true() -> bool {
    true
}

/// Top-level YAML rule file containing a list of rules.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlRuleFile {
    /// The list of rules defined in this file.
    pub rules: Vec<YamlRule>,
}

/// A single ingestion rule as represented in YAML.
///
/// ```yaml
/// rules:
///   - name: External demos
///     record_type: external
///     keywords: [demo, walkthrough]
///     users: [alice]
///     deal_stages: [Negotiation]
///     enabled: true
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlRule {
    /// A human-readable name for the rule.
    pub name: String,
    /// Call/meeting direction filter. Defaults to `all`.
    #[serde(default)]
    pub record_type: RecordType,
    /// Title keywords, OR-matched case-insensitively.
    #[serde(default, alias = "title_keywords")]
    pub keywords: Vec<String>,
    /// SME / attendee whitelist.
    #[serde(default, alias = "selected_users")]
    pub users: Vec<UserId>,
    /// Deal-stage whitelist.
    #[serde(default)]
    pub deal_stages: Vec<String>,
    /// Whether the rule starts active. Defaults to `true`.
    #[serde(default = "default_true", alias = "is_active")]
    pub enabled: bool,
}
