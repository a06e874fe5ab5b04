use clap::{Args, Subcommand};

use conduit_provider::{Capability, ProviderCategory, ProviderRegistry};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ProvidersArgs {
    #[command(subcommand)]
    pub command: ProvidersCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProvidersCommand {
    /// List connectable providers.
    List {
        /// Only show providers in this category (e.g. `crm`, `call_intelligence`).
        #[arg(long)]
        category: Option<ProviderCategory>,
    },
}

pub fn run(
    registry: &ProviderRegistry,
    args: &ProvidersArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        ProvidersCommand::List { category } => {
            let providers = registry.list(*category);
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&providers)?);
                }
                OutputFormat::Text => {
                    println!("{} providers:", providers.len());
                    for p in providers {
                        let access = if p.supports(Capability::Write) {
                            "rw"
                        } else {
                            "r "
                        };
                        println!(
                            "  [{access}] {id} ({name}) | {category}",
                            id = p.id,
                            name = p.name,
                            category = p.category,
                        );
                    }
                }
            }
        }
    }
    Ok(())
}
