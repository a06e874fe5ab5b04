use std::path::Path;

use conduit_rules::{RuleDraft, RuleError, RuleFrontend, validate_draft};

use crate::parser::{YamlRule, YamlRuleFile};

/// A [`RuleFrontend`] implementation that parses YAML rule files into
/// ingestion rule drafts.
///
/// Every draft is validated while parsing, so a file with one bad rule is
/// rejected as a whole before anything reaches a rule set.
pub struct YamlFrontend;

impl RuleFrontend for YamlFrontend {
    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn parse(&self, content: &str) -> Result<Vec<RuleDraft>, RuleError> {
        let file: YamlRuleFile = serde_yaml_ng::from_str(content)
            .map_err(|e| RuleError::Parse(format!("YAML parse error: {e}")))?;
        compile_rules(file, None)
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<RuleDraft>, RuleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RuleError::Parse(format!("cannot read {}: {e}", path.display())))?;

        let file: YamlRuleFile = serde_yaml_ng::from_str(&content).map_err(|e| {
            RuleError::Parse(format!("YAML parse error in {}: {e}", path.display()))
        })?;
        compile_rules(file, Some(path))
    }
}

fn compile_rules(file: YamlRuleFile, path: Option<&Path>) -> Result<Vec<RuleDraft>, RuleError> {
    file.rules
        .into_iter()
        .enumerate()
        .map(|(index, yaml)| compile_rule(index, yaml, path))
        .collect()
}

/// Compile a single `YamlRule` into a validated draft.
fn compile_rule(index: usize, yaml: YamlRule, path: Option<&Path>) -> Result<RuleDraft, RuleError> {
    let draft = RuleDraft {
        name: yaml.name,
        record_type: yaml.record_type,
        selected_users: yaml.users,
        title_keywords: yaml.keywords,
        deal_stages: yaml.deal_stages,
        is_active: yaml.enabled,
    };

    validate_draft(&draft).map_err(|e| {
        let location = path.map_or_else(String::new, |p| format!(" in {}", p.display()));
        RuleError::Parse(format!("rule #{}{location}: {e}", index + 1))
    })?;

    Ok(draft)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use conduit_rules::{CandidateRecord, RecordType, RuleSet, evaluate};

    use super::*;

    const RULES: &str = r"
rules:
  - name: External demos
    record_type: external
    keywords: [Demo, walkthrough]
  - name: Late stage SMEs
    users: [alice, bob]
    deal_stages: [Negotiation]
    enabled: false
  - name: Everything internal
    record_type: internal
";

    #[test]
    fn parses_rules_with_defaults() {
        let drafts = YamlFrontend.parse(RULES).unwrap();
        assert_eq!(drafts.len(), 3);

        assert_eq!(drafts[0].name, "External demos");
        assert_eq!(drafts[0].record_type, RecordType::External);
        assert_eq!(drafts[0].title_keywords, vec!["Demo", "walkthrough"]);
        assert!(drafts[0].is_active);

        assert_eq!(drafts[1].record_type, RecordType::All);
        assert_eq!(drafts[1].selected_users.len(), 2);
        assert!(!drafts[1].is_active);

        assert!(drafts[2].title_keywords.is_empty());
    }

    #[test]
    fn accepts_long_field_names() {
        let yaml = r"
rules:
  - name: Renewals
    title_keywords: [renewal]
    selected_users: [carol]
    is_active: false
";
        let drafts = YamlFrontend.parse(yaml).unwrap();
        assert_eq!(drafts[0].title_keywords, vec!["renewal"]);
        assert_eq!(drafts[0].selected_users[0].as_str(), "carol");
        assert!(!drafts[0].is_active);
    }

    #[test]
    fn drafts_feed_a_rule_set() {
        let mut set = RuleSet::new();
        for draft in YamlFrontend.parse(RULES).unwrap() {
            set.create(&draft).unwrap();
        }
        let record = CandidateRecord::new(true, "Demo for ACME");
        assert!(evaluate(&record, &set).included);
    }

    #[test]
    fn empty_name_rejects_whole_file() {
        let yaml = r#"
rules:
  - name: Fine
  - name: "  "
"#;
        let err = YamlFrontend.parse(yaml).unwrap_err();
        assert!(matches!(err, RuleError::Parse(ref msg) if msg.contains("rule #2")));
    }

    #[test]
    fn unknown_record_type_is_a_parse_error() {
        let yaml = r"
rules:
  - name: Bad
    record_type: sideways
";
        assert!(matches!(
            YamlFrontend.parse(yaml),
            Err(RuleError::Parse(_))
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = r"
rules:
  - name: Typo
    keywrods: [demo]
";
        assert!(YamlFrontend.parse(yaml).is_err());
    }

    #[test]
    fn parse_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rules:\n  - name: \"\"").unwrap();
        let err = YamlFrontend.parse_file(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(&file.path().display().to_string()), "{msg}");
    }

    #[test]
    fn extensions() {
        assert_eq!(YamlFrontend.extensions(), &["yaml", "yml"]);
    }
}
