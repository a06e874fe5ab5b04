use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Subcommand};

use conduit_state::{ConnectMode, Connection, ConnectionSettings, ConnectionStore};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ConnectionsArgs {
    #[command(subcommand)]
    pub command: ConnectionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConnectionsCommand {
    /// List all connections.
    List,
    /// Show one connection, including its settings.
    Show {
        /// Provider id.
        provider: String,
    },
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Provider id (see `conduit providers list`).
    pub provider: String,
    /// Account the user authorized with.
    #[arg(long)]
    pub account: Option<String>,
    /// Reset settings and rules to the provider's defaults.
    #[arg(long, conflicts_with = "exclusive")]
    pub reset: bool,
    /// Fail if the provider is already connected.
    #[arg(long)]
    pub exclusive: bool,
}

impl ConnectArgs {
    fn mode(&self) -> ConnectMode {
        if self.reset {
            ConnectMode::Reset
        } else if self.exclusive {
            ConnectMode::Exclusive
        } else {
            ConnectMode::Reconnect
        }
    }
}

#[derive(Args, Debug)]
pub struct DisconnectArgs {
    /// Provider id.
    pub provider: String,
    /// Confirm deletion of the connection's settings and rules.
    /// Previously ingested data is not touched.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Provider id.
    pub provider: String,
    /// JSON file holding the full settings payload (tagged by `kind`).
    pub settings: PathBuf,
}

pub fn list(
    store: &ConnectionStore,
    args: &ConnectionsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        ConnectionsCommand::List => {
            let connections = store.list_connections();
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&connections)?);
                }
                OutputFormat::Text => {
                    println!("{} connections:", connections.len());
                    for conn in &connections {
                        print_connection(conn);
                    }
                }
            }
        }
        ConnectionsCommand::Show { provider } => {
            let Some(conn) = store.connection(provider) else {
                bail!("provider not connected: {provider}");
            };
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(conn)?);
                }
                OutputFormat::Text => {
                    print_connection(conn);
                    println!("{}", serde_json::to_string_pretty(&conn.settings)?);
                }
            }
        }
    }
    Ok(())
}

pub fn connect(
    store: &mut ConnectionStore,
    args: &ConnectArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let conn = store.connect_with(&args.provider, args.account.clone(), args.mode())?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(conn)?),
        OutputFormat::Text => println!(
            "Connected {} ({} rules).",
            conn.provider_id,
            conn.settings.rules().len()
        ),
    }
    Ok(())
}

pub fn disconnect(
    store: &mut ConnectionStore,
    args: &DisconnectArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if !args.yes {
        let rules = store.rules(&args.provider)?.len();
        bail!(
            "disconnecting {} deletes its settings and {rules} ingestion rules; \
             previously ingested data is kept. Re-run with --yes to confirm.",
            args.provider
        );
    }
    let removed = store.disconnect(&args.provider)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&removed)?),
        OutputFormat::Text => println!("Disconnected {}.", removed.provider_id),
    }
    Ok(())
}

pub fn configure(store: &mut ConnectionStore, args: &ConfigureArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.settings)
        .with_context(|| format!("cannot read {}", args.settings.display()))?;
    let settings: ConnectionSettings = serde_json::from_str(&raw)
        .with_context(|| format!("invalid settings payload in {}", args.settings.display()))?;
    let rules = settings.rules().len();
    store.configure(&args.provider, settings)?;
    println!("Configured {} ({rules} rules).", args.provider);
    Ok(())
}

fn print_connection(conn: &Connection) {
    let account = conn.account_label.as_deref().unwrap_or("-");
    println!(
        "  {provider} | {status} | account: {account} | since: {since} | rules: {rules}",
        provider = conn.provider_id,
        status = conn.status,
        since = conn.connected_at.to_rfc3339(),
        rules = conn.settings.rules().len(),
    );
    if let Some(err) = &conn.last_error {
        println!("    last error: {err}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use conduit_provider::ProviderRegistry;

    use super::*;

    fn store() -> ConnectionStore {
        ConnectionStore::new(Arc::new(ProviderRegistry::builtin()))
    }

    #[test]
    fn connect_flags_pick_mode() {
        let args = ConnectArgs {
            provider: "gong".into(),
            account: None,
            reset: true,
            exclusive: false,
        };
        assert_eq!(args.mode(), ConnectMode::Reset);

        let args = ConnectArgs {
            reset: false,
            exclusive: true,
            ..args
        };
        assert_eq!(args.mode(), ConnectMode::Exclusive);
    }

    #[test]
    fn disconnect_requires_confirmation() {
        let mut store = store();
        store.connect("gong", None).unwrap();

        let args = DisconnectArgs {
            provider: "gong".into(),
            yes: false,
        };
        assert!(disconnect(&mut store, &args, &OutputFormat::Text).is_err());
        assert!(store.connection("gong").is_some());

        let args = DisconnectArgs { yes: true, ..args };
        disconnect(&mut store, &args, &OutputFormat::Text).unwrap();
        assert!(store.connection("gong").is_none());
    }

    #[test]
    fn configure_reads_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slack.json");
        std::fs::write(
            &path,
            r##"{"kind":"communication","channels":["#deals"],"rules":[]}"##,
        )
        .unwrap();

        let mut store = store();
        store.connect("slack", None).unwrap();
        configure(
            &mut store,
            &ConfigureArgs {
                provider: "slack".into(),
                settings: path,
            },
        )
        .unwrap();

        match &store.connection("slack").unwrap().settings {
            ConnectionSettings::Communication(s) => assert!(s.channels.contains("#deals")),
            other => panic!("unexpected settings: {other:?}"),
        }
    }
}
