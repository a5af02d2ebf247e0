//! Walletgen CLI
//!
//! Generates, lists and deletes deterministic Ethereum and Solana wallets
//! backed by a file store. Without a subcommand (or with `shell`) it opens the
//! chain selection menu; each wallet session runs the auto-reset countdown
//! alongside user input and returns to the menu when it ends.

mod landing;
mod reveal;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use walletgen::lifecycle::{ChannelNavigator, NavigationEvent};
use walletgen::storage::FileStore;
use walletgen::{Chain, DeleteOutcome, WalletConfig, WalletController, WalletId};

use landing::Session;
use reveal::RevealSet;

#[derive(Parser)]
#[command(name = "walletgen")]
#[command(about = "Deterministic Ethereum and Solana wallet generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the persisted wallet state
    #[arg(short, long, global = true)]
    storage_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive new wallets
    Generate {
        #[arg(short, long)]
        chain: Chain,
        /// Number of wallets to derive
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// List wallets
    List {
        #[arg(short, long)]
        chain: Chain,
        /// Show private keys
        #[arg(long)]
        reveal: bool,
    },
    /// Delete a wallet by id
    Delete {
        #[arg(short, long)]
        chain: Chain,
        id: WalletId,
    },
    /// Print the recovery phrase
    Mnemonic {
        #[arg(short, long)]
        chain: Chain,
    },
    /// Interactive session, starting at the chain menu unless a chain is given
    Shell {
        #[arg(short, long)]
        chain: Option<Chain>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("walletgen={},walletgen_cli={}", log_level, log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = WalletConfig::from_env().context("Invalid configuration")?;
    if let Some(dir) = cli.storage_dir.clone() {
        config = config.with_storage_dir(dir);
    }
    debug!("Configuration: {:?}", config);

    let backend = Arc::new(
        FileStore::open(&config.storage_dir)
            .with_context(|| format!("Cannot open storage at {}", config.storage_dir.display()))?,
    );

    let open = |chain: Chain| -> Result<Session> {
        let (navigator, rx) = ChannelNavigator::new();
        let controller = WalletController::load(chain, backend.clone(), &config, Arc::new(navigator))
            .with_context(|| format!("Cannot load {} wallets", chain))?;
        Ok((controller, rx))
    };

    let Some(command) = cli.command else {
        return run_landing(open, None).await;
    };

    match command {
        Commands::Generate { chain, count } => {
            let (controller, _rx) = open(chain)?;
            let fresh = controller.mnemonic().await.is_none();
            for _ in 0..count {
                let wallet = controller.generate().await?;
                println!("#{} {} {}", wallet.index(), wallet.id(), wallet.address());
            }
            if fresh && count > 0 {
                info!("Created a new {} mnemonic; run `walletgen mnemonic --chain {}` to back it up", chain, chain);
            }
            controller.shutdown().await;
        }
        Commands::List { chain, reveal } => {
            let (controller, _rx) = open(chain)?;
            let wallets = controller.wallets().await;
            let mut shown = RevealSet::new();
            if reveal {
                for wallet in &wallets {
                    shown.toggle(wallet.id());
                }
            }
            shell::print_wallets(&wallets, &shown);
            controller.shutdown().await;
        }
        Commands::Delete { chain, id } => {
            let (controller, mut rx) = open(chain)?;
            match controller.delete(id).await? {
                DeleteOutcome::NotFound => println!("No {} wallet with id {}", chain, id),
                DeleteOutcome::Removed => println!("Deleted wallet {}", id),
                DeleteOutcome::ResetScheduled => {
                    println!("Deleted wallet {}", id);
                    println!("No wallets left; clearing {} state in {:?}", chain, controller.reset_delay());
                    wait_for_reset(chain, &mut rx).await?;
                    println!("All {} wallets were removed.", chain);
                }
            }
            controller.shutdown().await;
        }
        Commands::Mnemonic { chain } => {
            let (controller, _rx) = open(chain)?;
            match controller.mnemonic().await {
                Some(mnemonic) => println!("{}", mnemonic),
                None => println!("No {} mnemonic yet", chain),
            }
        }
        Commands::Shell { chain } => run_landing(open, chain).await?,
    }

    Ok(())
}

async fn run_landing<F>(open: F, first: Option<Chain>) -> Result<()>
where
    F: Fn(Chain) -> Result<Session>,
{
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let exit = landing::run(open, first, &mut input).await?;
    debug!("Landing menu closed: {:?}", exit);
    Ok(())
}

/// Block until the reset armed by the last delete has completed or failed
async fn wait_for_reset(chain: Chain, rx: &mut UnboundedReceiver<NavigationEvent>) -> Result<()> {
    match rx.recv().await {
        Some(NavigationEvent::Home { .. }) => Ok(()),
        Some(NavigationEvent::ResetFailed { error, .. }) => {
            Err(anyhow::Error::new(error).context(format!("Failed to clear {} wallets", chain)))
        }
        None => bail!("Lost the reset signal for {}", chain),
    }
}
