//! Salien minigame farmer.
//!
//! Runs one farming agent per account from an accounts file, sharing a
//! single "best zone" signal between them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use farmer::core::selector::SelectOptions;
use farmer::exit_codes;
use farmer::fleet::run_fleet;
use farmer::io::accounts::load_accounts;
use farmer::io::config::{FarmConfig, load_config, write_config};
use farmer::io::events::TracingSink;
use farmer::io::http::HttpGameApi;
use farmer::logging;
use farmer::select::discover;

#[derive(Parser)]
#[command(
    name = "farmer",
    version,
    about = "Concurrent farming client for the Salien minigame"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config file with default settings.
    Init {
        #[arg(long, default_value = "farmer.toml")]
        config: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Farm with every account in the accounts file until all agents stop.
    Run {
        #[arg(long, default_value = "tokens.txt")]
        accounts: PathBuf,
        #[arg(long, default_value = "farmer.toml")]
        config: PathBuf,
    },
    /// Print the zone an agent would pick right now.
    Select {
        #[arg(long, default_value = "farmer.toml")]
        config: PathBuf,
    },
    /// Validate the accounts file and list its accounts.
    CheckAccounts {
        #[arg(long, default_value = "tokens.txt")]
        accounts: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    let code = match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { config, force } => cmd_init(&config, force),
        Command::Run { accounts, config } => cmd_run(&accounts, &config).await,
        Command::Select { config } => cmd_select(&config).await,
        Command::CheckAccounts { accounts } => cmd_check_accounts(&accounts),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if !force && path.exists() {
        println!("{} already exists", path.display());
        return Ok(exit_codes::OK);
    }
    write_config(path, &FarmConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn http_api(config: &FarmConfig) -> Result<HttpGameApi> {
    HttpGameApi::new(&config.api, config.timings.request_timeout()).context("build http client")
}

async fn cmd_run(accounts: &Path, config: &Path) -> Result<i32> {
    let config = load_config(config)?;
    let sessions = load_accounts(accounts)?;
    let api = Arc::new(http_api(&config)?);

    let stopped = run_fleet(api, sessions, Arc::new(TracingSink), config).await;
    eprintln!("all agents stopped ({} fatal)", stopped.len());
    Ok(exit_codes::STOPPED)
}

async fn cmd_select(config: &Path) -> Result<i32> {
    let config = load_config(config)?;
    let api = http_api(&config)?;
    let options = SelectOptions {
        include_boss: config.farm.supports_boss_encounters,
    };
    match discover(&api, options).await.context("fetch planets")? {
        Some(target) => {
            println!("{target}");
            Ok(exit_codes::OK)
        }
        None => {
            eprintln!("no zone worth joining");
            Ok(exit_codes::NO_ZONE)
        }
    }
}

fn cmd_check_accounts(path: &Path) -> Result<i32> {
    let sessions = load_accounts(path)?;
    for session in &sessions {
        match session.account_id {
            Some(id) => println!("{}\t{id}", session.name),
            None => println!("{}\t-", session.name),
        }
    }
    Ok(exit_codes::OK)
}
