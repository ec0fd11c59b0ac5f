//! `spheron-agent` - deploy AI agents on the Spheron marketplace
//!
//! Thin command-line front end over `spheron-agent-core`: one-shot
//! deployment and escrow commands plus a foreground lease watchdog.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use console::Style;
use spheron_agent_core::ledger::DeploymentLedger;
use spheron_agent_core::{Settings, SpheronPlugin};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

mod cli;

const DEFAULT_LOG_FILTER: &str = "spheron_agent=info,spheron_agent_core=info";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("spheron_agent=debug,spheron_agent_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(settings: Settings) -> Result<SpheronPlugin> {
    SpheronPlugin::from_settings(settings)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Failed to initialize the Spheron gateway")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        let blue = Style::new().blue();
        println!(
            "{} v{} ({})",
            blue.apply_to("spheron-agent"),
            env!("CARGO_PKG_VERSION"),
            env!("GIT_HASH")
        );
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    init_logging(cli.verbose);

    let settings = Settings::resolve(cli.config.as_deref()).context("Failed to load settings")?;
    tracing::debug!(spheron = ?settings.spheron, "Resolved settings");

    match command {
        Commands::Deploy { text, file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => text.join(" "),
            };
            let plugin = connect(settings)?;
            if !cli::deploy::handle_deploy(&plugin, &text).await? {
                std::process::exit(2);
            }
        }

        Commands::Render { config, out } => {
            cli::deploy::handle_render(&config, out.as_deref())?;
        }

        Commands::Inspect { manifest } => {
            cli::deploy::handle_inspect(&manifest)?;
        }

        Commands::Perpetual {
            config,
            deployment_id,
            interval,
            threshold,
        } => {
            let plugin = connect(settings)?;
            cli::perpetual::handle_perpetual(&plugin, &config, deployment_id, interval, threshold)
                .await?;
        }

        Commands::Status { id, json } => {
            cli::status::handle_status(&connect(settings)?, &id, json).await?;
        }

        Commands::Logs { id } => {
            cli::status::handle_logs(&connect(settings)?, &id).await?;
        }

        Commands::Remaining { id } => {
            cli::status::handle_remaining(&connect(settings)?, &id).await?;
        }

        Commands::Close { id } => {
            cli::deploy::handle_close(&connect(settings)?, &id).await?;
        }

        Commands::Update { id, config } => {
            cli::deploy::handle_update(&connect(settings)?, &id, &config).await?;
        }

        Commands::Balance => {
            cli::wallet::handle_balance(&connect(settings)?).await?;
        }

        Commands::Transactions => {
            cli::wallet::handle_transactions(&connect(settings)?).await?;
        }

        Commands::Deposit { amount } => {
            cli::wallet::handle_deposit(&connect(settings)?, &amount).await?;
        }

        Commands::Withdraw { amount } => {
            cli::wallet::handle_withdraw(&connect(settings)?, &amount).await?;
        }

        Commands::History => {
            let ledger = DeploymentLedger::new(settings.storage.ledger_path.clone());
            cli::status::handle_history(&ledger)?;
        }
    }

    Ok(())
}
