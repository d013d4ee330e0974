//! Foresight CLI - local prediction market orchestration tool
//!
//! Creates, trades and settles prediction market questions against the
//! foresight engine, with state journaled to a local JSON store. The CLI
//! plays the engine's external collaborators: it moves trader collateral,
//! gates resolution on the configured owner and drives the logical clock.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod config;
mod store;

use config::CliConfig;
use store::Store;

#[derive(Parser)]
#[command(name = "foresight")]
#[command(about = "Foresight prediction market CLI - create, trade and settle questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the market store (JSON journal)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Market owner identity (overrides the config file)
    #[arg(long)]
    owner: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Credit collateral to a trader (local faucet)
    Fund {
        /// Trader name
        trader: String,

        /// Collateral amount, e.g. "1000" or "47.5"
        amount: String,
    },

    /// Create a new question seeded with initial liquidity
    Create {
        /// Creator identity funding the initial liquidity
        creator: String,

        /// Question title
        title: String,

        /// Free-form metadata
        #[arg(long, default_value = "")]
        meta: String,

        /// Category label
        #[arg(long, default_value = "")]
        category: String,

        /// Time after which the question may resolve
        #[arg(long)]
        resolve_time: u64,

        /// Number of mutually exclusive outcomes
        #[arg(long, default_value = "2")]
        outcomes: u16,

        /// Initial liquidity seeded on every outcome
        #[arg(long)]
        liquidity: String,

        /// Trading fee percentage (0-100)
        #[arg(long)]
        fee: u64,
    },

    /// Buy outcome shares
    Buy {
        /// Question id
        question: u64,

        /// Trader name
        trader: String,

        /// Outcome index
        outcome: u16,

        /// Collateral deposit
        deposit: String,

        /// Minimum shares to accept (slippage bound)
        #[arg(long, default_value = "0")]
        min_shares: String,
    },

    /// Sell outcome shares back to the market
    Sell {
        /// Question id
        question: u64,

        /// Trader name
        trader: String,

        /// Outcome index
        outcome: u16,

        /// Shares to sell
        shares: String,

        /// Minimum revenue to accept (slippage bound)
        #[arg(long, default_value = "0")]
        min_amount: String,
    },

    /// Show the largest sell the market can absorb
    MaxSell {
        /// Question id
        question: u64,

        /// Outcome index
        outcome: u16,
    },

    /// Show current outcome prices
    Prices {
        /// Question id
        question: u64,
    },

    /// Show question details
    Info {
        /// Question id
        question: u64,
    },

    /// List all questions
    List,

    /// Show a trader's collateral and share balances
    Balance {
        /// Trader name
        trader: String,

        /// Also show share balances for this question
        #[arg(long)]
        question: Option<u64>,
    },

    /// Resolve a question to its winning outcome (owner only)
    Resolve {
        /// Question id
        question: u64,

        /// Winning outcome index
        outcome: u16,

        /// Resolver identity (defaults to the configured owner)
        #[arg(long)]
        resolver: Option<String>,
    },

    /// Redeem winning shares for collateral
    Claim {
        /// Question id
        question: u64,

        /// Trader name
        trader: String,
    },

    /// Advance the market clock
    AdvanceTime {
        /// Seconds to advance
        seconds: u64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config, cli.store, cli.owner)?;

    if cli.verbose {
        println!("{} {}", "Store:".bright_cyan(), config.store_path.display());
        println!("{} {}", "Owner:".bright_cyan(), config.owner);
    }

    let mut store = Store::open(&config.store_path, &config.owner)?;

    match cli.command {
        Commands::Fund { trader, amount } => {
            commands::fund(&mut store, trader, amount)?;
        }
        Commands::Create {
            creator,
            title,
            meta,
            category,
            resolve_time,
            outcomes,
            liquidity,
            fee,
        } => {
            commands::create(
                &mut store,
                creator,
                title,
                meta,
                category,
                resolve_time,
                outcomes,
                liquidity,
                fee,
            )?;
        }
        Commands::Buy {
            question,
            trader,
            outcome,
            deposit,
            min_shares,
        } => {
            commands::buy(&mut store, question, trader, outcome, deposit, min_shares)?;
        }
        Commands::Sell {
            question,
            trader,
            outcome,
            shares,
            min_amount,
        } => {
            commands::sell(&mut store, question, trader, outcome, shares, min_amount)?;
        }
        Commands::MaxSell { question, outcome } => {
            commands::max_sell(&store, question, outcome)?;
        }
        Commands::Prices { question } => {
            commands::prices(&store, question)?;
        }
        Commands::Info { question } => {
            commands::info(&store, question)?;
        }
        Commands::List => {
            commands::list(&store)?;
        }
        Commands::Balance { trader, question } => {
            commands::balance(&store, trader, question)?;
        }
        Commands::Resolve {
            question,
            outcome,
            resolver,
        } => {
            let resolver = resolver.unwrap_or_else(|| config.owner.clone());
            commands::resolve(&mut store, question, outcome, resolver)?;
        }
        Commands::Claim { question, trader } => {
            commands::claim(&mut store, question, trader)?;
        }
        Commands::AdvanceTime { seconds } => {
            commands::advance_time(&mut store, seconds)?;
        }
    }

    Ok(())
}
