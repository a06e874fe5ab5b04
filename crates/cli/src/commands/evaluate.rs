use clap::Args;

use conduit_rules::{CandidateRecord, Dimension, RuleTraceResult};
use conduit_state::ConnectionStore;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Provider id whose rules to apply.
    pub provider: String,
    /// Record title (call or meeting subject, document name).
    #[arg(long)]
    pub title: String,
    /// The record involves people outside the organization.
    #[arg(long)]
    pub external: bool,
    /// Deal stage attached to the record.
    #[arg(long)]
    pub deal_stage: Option<String>,
    /// Participant user id (repeatable).
    #[arg(long = "participant")]
    pub participants: Vec<String>,
    /// Show the per-rule trace, including inactive rules.
    #[arg(long)]
    pub explain: bool,
}

impl EvaluateArgs {
    fn record(&self) -> CandidateRecord {
        let record = CandidateRecord::new(self.external, self.title.as_str());
        let record = match &self.deal_stage {
            Some(stage) => record.with_deal_stage(stage.as_str()),
            None => record,
        };
        self.participants
            .iter()
            .fold(record, |r, p| r.with_participant(p.as_str()))
    }
}

pub fn run(store: &ConnectionStore, args: &EvaluateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let record = args.record();

    if !args.explain {
        let evaluation = store.evaluate(&args.provider, &record)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&evaluation)?),
            OutputFormat::Text => {
                let verdict = if evaluation.included { "INCLUDED" } else { "EXCLUDED" };
                println!("{verdict} by {} rules", evaluation.matched_rule_ids.len());
                for id in &evaluation.matched_rule_ids {
                    println!("  matched: {id}");
                }
            }
        }
        return Ok(());
    }

    let trace = store.explain(&args.provider, &record)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&trace)?),
        OutputFormat::Text => {
            let verdict = if trace.included { "INCLUDED" } else { "EXCLUDED" };
            println!(
                "{verdict} ({evaluated} evaluated, {skipped} skipped)",
                evaluated = trace.total_rules_evaluated,
                skipped = trace.total_rules_skipped,
            );
            for entry in &trace.trace {
                let detail = match entry.result {
                    RuleTraceResult::NotMatched => {
                        let failed: Vec<&str> =
                            entry.failed_dimensions.iter().map(Dimension::as_str).collect();
                        format!(" (failed: {})", failed.join(", "))
                    }
                    RuleTraceResult::Matched | RuleTraceResult::Skipped => String::new(),
                };
                println!(
                    "  [{result}] {name} ({id}){detail}",
                    result = entry.result.as_str(),
                    name = entry.rule_name,
                    id = entry.rule_id,
                );
            }
        }
    }
    Ok(())
}
