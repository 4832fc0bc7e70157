use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::AppConfig;

async fn open(config: &AppConfig, data_dir: &std::path::Path) -> Result<commands::AppContext> {
    commands::AppContext::build(config, data_dir).await
}

#[derive(Debug, Parser)]
#[command(name = "finguide", version, about = "Import mobile-money SMS into FinGuide")]
struct Cli {
    /// Config file. Defaults to the platform config directory.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the stored consent answer and import flag.
    Status,
    /// Grant SMS access, import the inbox and listen for new messages.
    Accept {
        /// Exit after the import instead of waiting for new messages.
        #[arg(long)]
        no_listen: bool,
    },
    /// Decline SMS access.
    Decline,
    /// Run the historical import again.
    Import,
    /// Check whether a message would be treated as financial.
    Check {
        #[arg(long, default_value = "")]
        sender: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Project savings growth with monthly compounding.
    Simulate {
        #[arg(long, default_value = "0")]
        principal: rust_decimal::Decimal,
        #[arg(long, default_value = "0")]
        monthly: rust_decimal::Decimal,
        /// Yearly interest rate in percent.
        #[arg(long)]
        rate: rust_decimal::Decimal,
        #[arg(long)]
        months: u32,
    },
    /// Forget the consent answer and import flag.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let dirs = config::project_dirs()?;
    let config_path = cli
        .config
        .unwrap_or_else(|| dirs.config_dir().join("finguide.toml"));
    let config = AppConfig::load(&config_path)?;
    let data_dir = config.data_dir(dirs.data_dir());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    match cli.command {
        Command::Check { sender, body } => {
            commands::check(&config, &sender, &body);
            Ok(())
        }
        Command::Simulate { principal, monthly, rate, months } => {
            commands::simulate(principal, monthly, rate, months)
        }
        Command::Status => commands::status(&open(&config, &data_dir).await?).await,
        Command::Accept { no_listen } => {
            commands::accept(&open(&config, &data_dir).await?, !no_listen).await
        }
        Command::Decline => commands::decline(&open(&config, &data_dir).await?).await,
        Command::Import => commands::import(&open(&config, &data_dir).await?).await,
        Command::Reset => commands::reset(&open(&config, &data_dir).await?).await,
    }
}
