//! Operator CLI: browse listings and print or write `aptos move run` commands.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use marketplace::catalog::{self, ListingSource};
use marketplace::commands;
use marketplace::config::{validate_address, Config};
use marketplace::listing::{filter_projects, fixture_projects, CategoryFilter, ListingDocument, Project};
use marketplace::payload::{MarketFunction, DEFAULT_CREDITS};

#[derive(Parser)]
#[command(name = "ecochain", version, about = "EcoChain marketplace operator tools")]
struct Cli {
    /// Module address; defaults to CONTRACT_ADDRESS
    #[arg(long, global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List marketplace projects
    List {
        /// `all` or one of reforestation, renewable, methane, marine
        #[arg(long, default_value = "all")]
        category: String,
        /// Listing document to read instead of the configured files
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print a single `aptos move run` command
    Command {
        #[arg(value_enum)]
        action: Action,
        /// Project id, e.g. RF-2023-089
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value_t = DEFAULT_CREDITS)]
        credits: u64,
        /// Price per credit in minor units; defaults to the project's listed price
        #[arg(long)]
        price: Option<u64>,
    },
    /// Write marketplace bootstrap scripts for every listed project
    InitScripts {
        #[arg(long, default_value = "marketplace_scripts")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Init,
    Create,
    Purchase,
    Retire,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    let address = cli.address.unwrap_or_else(|| config.contract_address.clone());
    validate_address(&address).map_err(|e| anyhow::anyhow!("{e}"))?;

    match cli.command {
        Command::List { category, file } => {
            let filter: CategoryFilter = category.parse().map_err(|e| anyhow::anyhow!("{e}"))?;
            let projects = load_projects(&config, file).await;
            for p in filter_projects(&projects, filter) {
                println!(
                    "{:<12} {:<14} {:>8.2} {:>8} credits  {} ({})",
                    p.id,
                    p.category.as_str(),
                    p.price as f64 / 100.0,
                    p.credits_available,
                    p.title,
                    p.location
                );
            }
        }
        Command::Command {
            action,
            project,
            credits,
            price,
        } => {
            let line = match action {
                Action::Init => commands::initialize_marketplace(&address),
                Action::Create | Action::Purchase | Action::Retire => {
                    let id = project.context("--project is required for this action")?;
                    let projects = load_projects(&config, None).await;
                    let listed = projects.iter().find(|p| p.id == id);
                    match action {
                        Action::Create => {
                            let Some(listed) = listed else {
                                bail!("project {id} is not listed");
                            };
                            commands::create_project(&address, listed)
                        }
                        _ => {
                            let function = if matches!(action, Action::Purchase) {
                                MarketFunction::PurchaseCredits
                            } else {
                                MarketFunction::RetireCredits
                            };
                            let price = price
                                .or_else(|| listed.map(|p| p.price))
                                .context("--price is required for unlisted projects")?;
                            commands::trade_credits(&address, function, &id, credits, price)
                        }
                    }
                }
            };
            println!("{line}");
        }
        Command::InitScripts { out } => {
            let projects = load_projects(&config, None).await;
            let written = commands::write_init_scripts(&out, &projects, &address)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Wrote {} scripts to {}", written.len(), out.display());
            println!("Run: cd {} && ./initialize_all.sh", out.display());
        }
    }

    Ok(())
}

/// Projects from `file`, else the configured listing files, else the built-in fixtures.
async fn load_projects(config: &Config, file: Option<PathBuf>) -> Vec<Project> {
    let loaded = match &file {
        Some(path) => catalog::load_listing_document(path, path).await,
        None => {
            catalog::load_listing_document(&config.projects_file, &config.projects_fallback_file)
                .await
        }
    };
    if loaded.source == ListingSource::Embedded {
        return fixture_projects();
    }
    match serde_json::from_value::<ListingDocument>(loaded.document) {
        Ok(doc) => doc.projects,
        Err(e) => {
            warn!("Listing document does not match the project model ({e}); using fixtures");
            fixture_projects()
        }
    }
}
