//! Conduit CLI
//!
//! Connect third-party providers, manage their ingestion rules, and check how
//! candidate records would be filtered.

mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, error, warn};

use conduit_core::{Classify, ErrorClass};
use conduit_provider::ProviderError;
use conduit_rules::RuleError;
use conduit_state::StoreError;

use crate::config::ConduitConfig;

/// Conduit CLI: manage provider connections and ingestion rules.
#[derive(Parser, Debug)]
#[command(name = "conduit", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        long,
        env = "CONDUIT_CONFIG",
        default_value = "conduit.toml",
        global = true
    )]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse the provider catalog.
    Providers(commands::providers::ProvidersArgs),
    /// Inspect existing connections.
    Connections(commands::connections::ConnectionsArgs),
    /// Connect a provider (reconnecting keeps its rules).
    Connect(commands::connections::ConnectArgs),
    /// Disconnect a provider and delete its rules.
    Disconnect(commands::connections::DisconnectArgs),
    /// Replace a connection's settings from a JSON file.
    Configure(commands::connections::ConfigureArgs),
    /// Manage a connection's ingestion rules.
    Rules(commands::rules::RulesArgs),
    /// Evaluate a candidate record against a connection's rules.
    Evaluate(commands::evaluate::EvaluateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConduitConfig::load(&cli.config)?;
    telemetry::init(&config.logging);
    if !cli.config.exists() {
        debug!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let mut store = config.open_store()?;
    let result = match &cli.command {
        Command::Providers(args) => commands::providers::run(store.registry(), args, &cli.format),
        Command::Connections(args) => commands::connections::list(&store, args, &cli.format),
        Command::Connect(args) => commands::connections::connect(&mut store, args, &cli.format),
        Command::Disconnect(args) => {
            commands::connections::disconnect(&mut store, args, &cli.format)
        }
        Command::Configure(args) => commands::connections::configure(&mut store, args),
        Command::Rules(args) => commands::rules::run(&mut store, args, &cli.format),
        Command::Evaluate(args) => commands::evaluate::run(&store, args, &cli.format),
    };

    if let Err(err) = &result {
        log_failure(err);
        return result;
    }
    store.teardown()?;
    Ok(())
}

/// The class of the first error in the chain that carries one.
fn classify(err: &anyhow::Error) -> Option<ErrorClass> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<StoreError>()
            .map(Classify::class)
            .or_else(|| cause.downcast_ref::<RuleError>().map(Classify::class))
            .or_else(|| cause.downcast_ref::<ProviderError>().map(Classify::class))
    })
}

/// Log a failed command according to how its error is classified.
fn log_failure(err: &anyhow::Error) {
    let Some(class) = classify(err) else {
        return;
    };
    match class {
        ErrorClass::CallerBug => warn!(error = %format_args!("{err:#}"), "command rejected"),
        ErrorClass::Internal => error!(error = %format_args!("{err:#}"), "command failed"),
        ErrorClass::Validation | ErrorClass::Informational => {
            debug!(error = %format_args!("{err:#}"), %class, "command refused");
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use conduit_core::ProviderId;

    use super::*;

    #[test]
    fn classifies_store_rule_and_provider_errors() {
        let err = anyhow::Error::from(StoreError::NotConnected(ProviderId::new("gong")));
        assert_eq!(classify(&err), Some(ErrorClass::CallerBug));

        let err = anyhow::Error::from(RuleError::Parse("rule #1: bad".into()));
        assert_eq!(classify(&err), Some(ErrorClass::Validation));

        let err = anyhow::Error::from(ProviderError::InvalidDefinition("empty id".into()));
        assert_eq!(classify(&err), Some(ErrorClass::Validation));
    }

    #[test]
    fn classification_looks_through_context() {
        let err = Err::<(), _>(StoreError::NotConnected(ProviderId::new("gong")))
            .context("failed to configure")
            .unwrap_err();
        assert_eq!(classify(&err), Some(ErrorClass::CallerBug));
    }

    #[test]
    fn unclassified_errors_are_ignored() {
        assert_eq!(classify(&anyhow::anyhow!("boom")), None);
    }
}
