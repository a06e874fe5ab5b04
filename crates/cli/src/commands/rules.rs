use std::path::PathBuf;

use clap::{Args, Subcommand};

use conduit_core::{RuleId, UserId};
use conduit_rules::{IngestionRule, RecordType, RuleDraft, RuleFrontend};
use conduit_rules_yaml::YamlFrontend;
use conduit_state::ConnectionStore;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List a connection's rules.
    List {
        /// Provider id.
        provider: String,
    },
    /// Add a rule.
    Add {
        /// Provider id.
        provider: String,
        #[command(flatten)]
        fields: RuleFields,
    },
    /// Replace every field of a rule. Its id and on/off state are kept.
    Update {
        /// Provider id.
        provider: String,
        /// Rule id.
        rule: String,
        #[command(flatten)]
        fields: RuleFields,
    },
    /// Delete a rule.
    Delete {
        /// Provider id.
        provider: String,
        /// Rule id.
        rule: String,
    },
    /// Switch a rule on or off.
    Toggle {
        /// Provider id.
        provider: String,
        /// Rule id.
        rule: String,
    },
    /// Add every rule from a YAML file. Nothing is added if any rule is invalid.
    Import {
        /// Provider id.
        provider: String,
        /// Rule file (`.yaml` or `.yml`).
        file: PathBuf,
    },
}

/// Rule fields shared by `add` and `update`.
#[derive(Args, Debug)]
pub struct RuleFields {
    /// Display name.
    #[arg(long)]
    pub name: String,
    /// Which records the rule admits: `external`, `internal`, or `all`.
    #[arg(long, default_value = "all")]
    pub record_type: RecordType,
    /// Title keyword (repeatable). Any one must appear in the title.
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
    /// Participant to whitelist (repeatable).
    #[arg(long = "user")]
    pub users: Vec<String>,
    /// Deal stage to whitelist (repeatable).
    #[arg(long = "deal-stage")]
    pub deal_stages: Vec<String>,
    /// Create the rule switched off.
    #[arg(long)]
    pub inactive: bool,
}

impl RuleFields {
    fn to_draft(&self) -> RuleDraft {
        RuleDraft {
            name: self.name.clone(),
            record_type: self.record_type,
            selected_users: self.users.iter().map(|u| UserId::new(u.as_str())).collect(),
            title_keywords: self.keywords.clone(),
            deal_stages: self.deal_stages.clone(),
            is_active: !self.inactive,
        }
    }
}

pub fn run(
    store: &mut ConnectionStore,
    args: &RulesArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        RulesCommand::List { provider } => {
            let rules: Vec<&IngestionRule> = store.rules(provider)?.iter().collect();
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&rules)?);
                }
                OutputFormat::Text => {
                    println!("{} rules for {provider}:", rules.len());
                    for rule in rules {
                        print_rule(rule);
                    }
                }
            }
        }
        RulesCommand::Add { provider, fields } => {
            let rule = store.create_rule(provider, &fields.to_draft())?;
            report(&rule, "added", format)?;
        }
        RulesCommand::Update {
            provider,
            rule,
            fields,
        } => {
            let rule = store.update_rule(provider, &RuleId::new(rule.as_str()), &fields.to_draft())?;
            report(&rule, "updated", format)?;
        }
        RulesCommand::Delete { provider, rule } => {
            let rule = store.delete_rule(provider, &RuleId::new(rule.as_str()))?;
            report(&rule, "deleted", format)?;
        }
        RulesCommand::Toggle { provider, rule } => {
            let id = RuleId::new(rule.as_str());
            let active = store.toggle_rule(provider, &id)?;
            let state = if active { "enabled" } else { "disabled" };
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "rule_id": id, "is_active": active })
                ),
                OutputFormat::Text => println!("Rule '{id}' {state}."),
            }
        }
        RulesCommand::Import { provider, file } => {
            let drafts = YamlFrontend.parse_file(file)?;
            let added = store.import_rules(provider, &drafts)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&added)?);
                }
                OutputFormat::Text => {
                    println!("Imported {} rules into {provider}:", added.len());
                    for rule in &added {
                        print_rule(rule);
                    }
                }
            }
        }
    }
    Ok(())
}

fn report(rule: &IngestionRule, verb: &str, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rule)?),
        OutputFormat::Text => println!("Rule '{}' {verb} ({}).", rule.name(), rule.id()),
    }
    Ok(())
}

fn print_rule(rule: &IngestionRule) {
    let status = if rule.is_active() { "ON " } else { "OFF" };
    let keywords = join(rule.title_keywords().iter().map(String::as_str));
    let users = rule
        .selected_users()
        .map_or_else(|| "any".to_owned(), |u| join(u.iter().map(UserId::as_str)));
    let stages = rule
        .deal_stages()
        .map_or_else(|| "any".to_owned(), |s| join(s.iter().map(String::as_str)));
    println!(
        "  [{status}] {id} {name} | {record_type} | keywords: {keywords} | users: {users} | stages: {stages}",
        id = rule.id(),
        name = rule.name(),
        record_type = rule.record_type(),
    );
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        "any".to_owned()
    } else {
        joined
    }
}
