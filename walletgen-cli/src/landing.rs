//! Top-level chain selection menu
//!
//! Every wallet session returns here, whether the user left it or the
//! context was reset after its last wallet was deleted.

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use walletgen::lifecycle::NavigationEvent;
use walletgen::{Chain, WalletController};

use crate::shell::{self, SessionEnd};

/// A loaded controller with its navigation receiver
pub type Session = (WalletController, UnboundedReceiver<NavigationEvent>);

/// Chains in menu order
const MENU: [Chain; 2] = [Chain::Solana, Chain::Ethereum];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingChoice {
    Open(Chain),
    Quit,
}

impl LandingChoice {
    /// Parse a menu entry number, a chain name or `quit`; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        if let Ok(number) = line.parse::<usize>() {
            return number
                .checked_sub(1)
                .and_then(|i| MENU.get(i))
                .map(|chain| Some(LandingChoice::Open(*chain)))
                .ok_or_else(|| anyhow!("No menu entry {}", number));
        }

        match line.to_ascii_lowercase().as_str() {
            "quit" | "exit" | "q" => Ok(Some(LandingChoice::Quit)),
            name => Ok(Some(LandingChoice::Open(name.parse()?))),
        }
    }
}

/// How the landing loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingExit {
    Quit,
    InputClosed,
}

/// Run the landing menu, opening one session per choice.
///
/// `first` opens a session right away, as if it had been picked from the menu.
pub async fn run<F, R>(open: F, first: Option<Chain>, input: &mut Lines<R>) -> Result<LandingExit>
where
    F: Fn(Chain) -> Result<Session>,
    R: AsyncBufRead + Unpin,
{
    let mut next = first;

    loop {
        if let Some(chain) = next.take() {
            match open(chain) {
                Ok((controller, navigation)) => {
                    let end = shell::run(controller, navigation, input).await?;
                    debug!("{} session ended: {:?}", chain, end);
                    if end == SessionEnd::InputClosed {
                        return Ok(LandingExit::InputClosed);
                    }
                }
                Err(e) => println!("Error: {:#}", e),
            }
        }

        print_menu();
        shell::prompt("walletgen")?;

        let Some(line) = input.next_line().await? else {
            return Ok(LandingExit::InputClosed);
        };

        match LandingChoice::parse(&line) {
            Ok(None) => {}
            Ok(Some(LandingChoice::Quit)) => {
                info!("Leaving walletgen");
                return Ok(LandingExit::Quit);
            }
            Ok(Some(LandingChoice::Open(chain))) => next = Some(chain),
            Err(e) => println!("{}", e),
        }
    }
}

fn print_menu() {
    println!();
    println!("Select a chain:");
    for (i, chain) in MENU.iter().enumerate() {
        println!("  {}) {}", i + 1, chain);
    }
    println!("  q) Quit");
}
