//! Pacifica CLI
//!
//! Runs one client operation per invocation and prints the result as JSON.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pacifica_core::{Config, Network, PacificaClient};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{AccountCommands, MarketCommands, OrderCommands, PositionCommands, SubaccountCommands};

/// Pacifica perpetual-futures trading client
#[derive(Parser)]
#[command(name = "pacifica")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML, YAML or JSON); environment variables otherwise
    #[arg(short, long, global = true, env = "PACIFICA_CONFIG")]
    config: Option<PathBuf>,

    /// Use the testnet host regardless of configuration
    #[arg(long, global = true)]
    testnet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Public market data
    #[command(subcommand)]
    Market(MarketCommands),

    /// Account, position and order queries
    #[command(subcommand)]
    Account(AccountCommands),

    /// Order placement and cancellation
    #[command(subcommand)]
    Order(OrderCommands),

    /// Position leverage, margin mode and closing
    #[command(subcommand)]
    Position(PositionCommands),

    /// Subaccount management
    #[command(subcommand)]
    Subaccount(SubaccountCommands),

    /// Request a withdrawal
    Withdraw {
        amount: rust_decimal::Decimal,
    },

    /// Show the account, agent wallet and agent public key
    Identity,
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "pacifica_cli=debug,pacifica_core=debug"
    } else {
        "pacifica_cli=info,pacifica_core=info"
    };

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>, testnet: bool) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::from_env().context("failed to load config from environment")?,
    };
    if testnet {
        config.network = Network::Testnet;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_ref(), cli.testnet)?;
    debug!(config = ?config, "Loaded configuration");

    let client = PacificaClient::new(&config)?;

    let output = match cli.command {
        Commands::Market(cmd) => commands::market(&client, cmd).await?,
        Commands::Account(cmd) => commands::account(&client, cmd).await?,
        Commands::Order(cmd) => commands::order(&client, cmd).await?,
        Commands::Position(cmd) => commands::position(&client, cmd).await?,
        Commands::Subaccount(cmd) => commands::subaccount(&client, cmd).await?,
        Commands::Withdraw { amount } => {
            serde_json::to_value(client.request_withdrawal(amount).await?)?
        }
        Commands::Identity => serde_json::json!({
            "account": client.account(),
            "agent_wallet": client.agent_wallet(),
            "signing_scheme": format!("{:?}", client.signing_scheme()).to_lowercase(),
            "public_key": client.signer_public_key(),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
