//! Interactive wallet session for one chain

use std::io::{self, Write};

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use walletgen::lifecycle::NavigationEvent;
use walletgen::{Chain, DeleteOutcome, Wallet, WalletController, WalletId};

use crate::reveal::RevealSet;

/// Wallet selector: an id or a 1-based position in the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Id(WalletId),
    Position(usize),
}

impl Target {
    fn parse(raw: &str) -> Result<Self> {
        if let Some(pos) = raw.strip_prefix('#') {
            let pos: usize = pos.parse().map_err(|_| anyhow!("Invalid position: {}", raw))?;
            if pos == 0 {
                return Err(anyhow!("Positions start at #1"));
            }
            return Ok(Target::Position(pos));
        }
        Ok(Target::Id(raw.parse()?))
    }

    fn resolve(&self, wallets: &[Wallet]) -> Option<WalletId> {
        match *self {
            Target::Id(id) => Some(id),
            Target::Position(pos) => wallets.get(pos - 1).map(Wallet::id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Generate,
    List,
    Delete(Target),
    Toggle(Target),
    Mnemonic,
    Help,
    Back,
}

impl ShellCommand {
    /// Parse one input line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(anyhow!("Too many arguments"));
        }

        let target = |name: &str| -> Result<Target> {
            let raw = arg.ok_or_else(|| anyhow!("Usage: {} <id|#n>", name))?;
            Target::parse(raw)
        };

        let command = match verb {
            "generate" | "g" => ShellCommand::Generate,
            "list" | "ls" => ShellCommand::List,
            "delete" | "rm" => ShellCommand::Delete(target("delete")?),
            "toggle" | "t" => ShellCommand::Toggle(target("toggle")?),
            "mnemonic" => ShellCommand::Mnemonic,
            "help" | "?" => ShellCommand::Help,
            "back" | "exit" | "quit" => ShellCommand::Back,
            other => return Err(anyhow!("Unknown command: {}", other)),
        };

        if arg.is_some() && !matches!(command, ShellCommand::Delete(_) | ShellCommand::Toggle(_)) {
            return Err(anyhow!("{} takes no arguments", verb));
        }

        Ok(Some(command))
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user left with `back`/`exit`
    UserExit,
    /// The context was reset after its last wallet was deleted
    Reset,
    /// Input reached end of file
    InputClosed,
}

/// Run the interactive loop until the user leaves or the context resets
pub async fn run<R>(
    controller: WalletController,
    mut navigation: UnboundedReceiver<NavigationEvent>,
    input: &mut Lines<R>,
) -> Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
{
    let chain = controller.chain();
    let mut reveal = RevealSet::new();

    info!("Starting {} session", chain);
    println!("{} wallets", chain);
    println!("Type 'help' for available commands, 'back' to leave");
    print_wallets(&controller.wallets().await, &reveal);

    let end = loop {
        prompt(&chain.to_string())?;

        tokio::select! {
            Some(event) = navigation.recv() => match event {
                NavigationEvent::Home { chain } => {
                    debug!("Navigation event for {}", chain);
                    println!();
                    println!("All {} wallets were removed. Back to the landing menu.", chain);
                    break SessionEnd::Reset;
                }
                NavigationEvent::ResetFailed { chain, error } => {
                    warn!("Reset of {} failed: {}", chain, error);
                    println!();
                    println!("Error: could not clear {} wallets: {}", chain, error);
                    println!("Generate a wallet to keep using this mnemonic.");
                }
            },
            line = input.next_line() => {
                let Some(line) = line? else {
                    break SessionEnd::InputClosed;
                };

                match ShellCommand::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(ShellCommand::Back)) => break SessionEnd::UserExit,
                    Ok(Some(command)) => {
                        if let Err(e) = execute(&controller, &mut reveal, command).await {
                            println!("Error: {}", e);
                        }
                    }
                    Err(e) => {
                        println!("{}. Type 'help' for available commands.", e);
                    }
                }
            }
        }
    };

    controller.shutdown().await;
    info!("Leaving {} session", chain);
    Ok(end)
}

async fn execute(controller: &WalletController, reveal: &mut RevealSet, command: ShellCommand) -> Result<()> {
    match command {
        ShellCommand::Generate => {
            let wallet = controller.generate().await?;
            println!("Generated wallet #{} {}", wallet.index(), wallet.address());
        }
        ShellCommand::List => print_wallets(&controller.wallets().await, reveal),
        ShellCommand::Delete(target) => {
            let wallets = controller.wallets().await;
            let Some(id) = target.resolve(&wallets) else {
                println!("No wallet at that position");
                return Ok(());
            };
            match controller.delete(id).await? {
                DeleteOutcome::NotFound => println!("No wallet with id {}", id),
                DeleteOutcome::Removed => {
                    reveal.forget(id);
                    println!("Deleted wallet {}", id);
                }
                DeleteOutcome::ResetScheduled => {
                    reveal.forget(id);
                    println!("Deleted wallet {}", id);
                    println!(
                        "No wallets left; everything is cleared in {:?} unless you generate a new one",
                        controller.reset_delay()
                    );
                }
            }
        }
        ShellCommand::Toggle(target) => {
            let wallets = controller.wallets().await;
            match target.resolve(&wallets).and_then(|id| wallets.iter().find(|w| w.id() == id)) {
                Some(wallet) => {
                    reveal.toggle(wallet.id());
                    println!("Private key of {}: {}", wallet.id(), reveal.display_key(wallet));
                }
                None => println!("No such wallet"),
            }
        }
        ShellCommand::Mnemonic => match controller.mnemonic().await {
            Some(mnemonic) => println!("{}", mnemonic),
            None => println!("No mnemonic yet; generate a wallet first"),
        },
        ShellCommand::Help => print_help(),
        ShellCommand::Back => {}
    }
    Ok(())
}

/// Print wallets with their private key masked unless revealed
pub fn print_wallets(wallets: &[Wallet], reveal: &RevealSet) {
    if wallets.is_empty() {
        println!("No wallets");
        return;
    }

    for (pos, wallet) in wallets.iter().enumerate() {
        let label = match wallet.chain() {
            Chain::Ethereum => "Address",
            Chain::Solana => "Public key",
        };
        println!("#{} {} index {} ({})", pos + 1, wallet.id(), wallet.index(), wallet.derivation_path());
        println!("    {:<12}{}", label, wallet.address());
        println!("    {:<12}{}", "Private key", reveal.display_key(wallet));
    }
}

pub(crate) fn prompt(label: &str) -> io::Result<()> {
    print!("{}> ", label);
    io::stdout().flush()
}

fn print_help() {
    println!("Available commands:");
    println!("  generate        - Derive the next wallet");
    println!("  list            - List wallets");
    println!("  delete <id|#n>  - Delete a wallet");
    println!("  toggle <id|#n>  - Show or hide a private key");
    println!("  mnemonic        - Print the recovery phrase");
    println!("  help            - Show this help message");
    println!("  back            - Leave the session");
}
