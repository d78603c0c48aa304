// bin/custos.rs - Custos account registry command line
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use custos_auth::{GenesisState, PageRequest};
use custos_common::prelude::*;
use custos_core::{Registry, RegistryConfig};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "custos")]
#[command(
    about = "Custos account registry - inspect and bootstrap account state",
    long_about = None
)]
struct Args {
    /// Configuration file (.toml, .yaml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database path, overrides the configuration
    #[arg(short, long)]
    db_path: Option<String>,

    /// Log level, overrides the configuration
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a genesis document into an empty database
    InitGenesis {
        /// Genesis JSON file
        file: PathBuf,
    },
    /// Export the current state as a genesis document
    ExportGenesis {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the account at a Bech32 address
    Account {
        /// Bech32 address
        address: String,
    },
    /// List accounts in address order
    Accounts {
        /// Maximum number of accounts to print
        #[arg(long, default_value = "100")]
        limit: usize,
    },
    /// Show a module account, creating it on first access
    ModuleAccount {
        /// Module name
        name: String,
    },
    /// Show the auth parameters
    Params,
    /// Print the address derived from a module name
    Address {
        /// Module name
        name: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Config validation failed: {}", e))?;

    // Address derivation needs no database
    if let Command::Address { name } = &args.command {
        let codec = Bech32Codec::new(&config.bech32_prefix)?;
        println!("{}", codec.encode(&CryptoUtils::module_address(name))?);
        return Ok(());
    }

    let registry = Registry::open(config)?;

    match args.command {
        Command::InitGenesis { file } => {
            let state = GenesisState::load(&file)
                .with_context(|| format!("failed to read genesis {}", file.display()))?;
            registry.init_genesis(&state)?;
            tracing::info!("Imported {} accounts from {}", state.accounts.len(), file.display());
        }
        Command::ExportGenesis { output } => {
            let state = registry.export_genesis()?;
            match output {
                Some(path) => {
                    state.save(&path)?;
                    tracing::info!("Wrote genesis to {}", path.display());
                }
                None => println!("{}", state.to_json()?),
            }
        }
        Command::Account { address } => {
            let account = registry.read(|_, ctx| registry.querier().account(ctx, &address))?;
            print_json(&account)?;
        }
        Command::Accounts { limit } => {
            let page = PageRequest { key: None, limit };
            let response = registry.read(|_, ctx| registry.querier().accounts(ctx, &page))?;
            print_json(&response)?;
        }
        Command::ModuleAccount { name } => {
            let macc = registry.module_account(&name)?;
            print_json(&macc)?;
        }
        Command::Params => {
            let params = registry.read(|_, ctx| registry.querier().params(ctx))?;
            print_json(&params)?;
        }
        Command::Address { .. } => {}
    }

    Ok(())
}
