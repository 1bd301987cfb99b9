//! Accrual CLI
//!
//! Command-line harness for replaying trading scenarios against the rewards engine.

mod script;

use accrual_core::prelude::*;
use accrual_rewards::{EventRecord, MarketState, Periodicity, RewardsConfig, TradingRewards};
use clap::{Parser, Subcommand};
use script::{address, Op, Script};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "accrual")]
#[command(author = "Accrual Contributors")]
#[command(version)]
#[command(about = "Accrual - proportional trading rewards in constant time", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted scenario and print the outcome
    Simulate {
        /// Configuration file path
        #[arg(short, long, default_value = "accrual.toml", env = "ACCRUAL_CONFIG")]
        config: PathBuf,

        /// Scenario script
        #[arg(short, long)]
        script: PathBuf,

        /// Abort on the first rejected operation
        #[arg(long)]
        strict: bool,
    },

    /// Show the reward window containing a timestamp
    Window {
        /// Configuration file path
        #[arg(short, long, default_value = "accrual.toml", env = "ACCRUAL_CONFIG")]
        config: PathBuf,

        /// Unix timestamp in seconds
        #[arg(long)]
        at: Timestamp,
    },

    /// Version information
    Version,
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<RewardsConfig> {
    if path.exists() {
        Ok(RewardsConfig::load(path)?)
    } else {
        tracing::info!("Config {:?} not found, using defaults", path);
        Ok(RewardsConfig::default())
    }
}

/// Render base units as a decimal token amount
fn format_tokens(amount: Amount) -> String {
    format!("{}.{:018}", amount / ONE_TOKEN, amount % ONE_TOKEN)
}

fn format_time(at: Timestamp) -> String {
    i64::try_from(at)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| at.to_string())
}

#[derive(Debug, Serialize)]
struct AccountSummary {
    label: String,
    address: Address,
    last_volume: Volume,
    pending_reward: Amount,
    balance: Amount,
}

#[derive(Debug, Serialize)]
struct Summary {
    periodicity: Periodicity,
    market: MarketState,
    total_supply: Amount,
    rejected: usize,
    accounts: Vec<AccountSummary>,
    events: Vec<EventRecord>,
}

/// Resolve an optional caller label, falling back to the operator
fn caller_or(caller: Option<&str>, operator: Address) -> Result<Address> {
    caller.map_or(Ok(operator), address)
}

fn apply(engine: &mut TradingRewards, operator: Address, n: usize, op: &Op) -> Result<()> {
    match op {
        Op::Trade {
            at,
            trader,
            notional,
            caller,
        } => {
            let receipt = engine.report_trade(
                caller_or(caller.as_deref(), operator)?,
                address(trader)?,
                *notional as Notional,
                *at,
            )?;
            println!(
                "#{:<3} {} trade   {:<10} {:>+12} window {} credited {}",
                n,
                format_time(*at),
                trader,
                notional,
                receipt.window,
                format_tokens(receipt.credited)
            );
        }
        Op::Claim { at, trader } => {
            let receipt = engine.claim(address(trader)?, *at)?;
            println!(
                "#{:<3} {} claim   {:<10} minted {}",
                n,
                format_time(*at),
                trader,
                format_tokens(receipt.minted)
            );
        }
        Op::SetPeriod { at, length, caller } => {
            let pending =
                engine.request_period_change(caller_or(caller.as_deref(), operator)?, *length, *at)?;
            println!(
                "#{:<3} {} period  length {}s effective {}",
                n,
                format_time(*at),
                pending.length,
                format_time(pending.effective_at)
            );
        }
    }
    Ok(())
}

fn simulate(config: &RewardsConfig, script: &Script, strict: bool) -> anyhow::Result<Summary> {
    let mut engine = TradingRewards::from_config(config)?;
    let operator = config.operator.address()?;
    let mut rejected = 0;

    for (n, op) in script.ops.iter().enumerate() {
        if let Err(err) = apply(&mut engine, operator, n, op) {
            if strict {
                anyhow::bail!("operation #{} at {} rejected: {}", n, op.at(), err);
            }
            tracing::warn!("Operation #{} rejected ({}): {}", n, err.code(), err);
            rejected += 1;
        }
    }

    let accounts = script
        .traders()
        .into_iter()
        // Unresolvable labels were rejected by every operation naming them
        .filter_map(|label| address(&label).ok().map(|who| (label, who)))
        .map(|(label, who)| {
            let account = engine.account(&who);
            AccountSummary {
                label,
                address: who,
                last_volume: account.last_volume,
                pending_reward: account.pending_reward,
                balance: engine.balance_of(&who),
            }
        })
        .collect();

    Ok(Summary {
        periodicity: engine.periodicity(),
        market: engine.market(),
        total_supply: engine.total_supply(),
        rejected,
        accounts,
        events: engine.take_events(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Simulate {
            config,
            script,
            strict,
        } => {
            let config = load_config(&config)?;
            let script = Script::load(&script)?;
            tracing::info!("Replaying {} operations", script.ops.len());

            let summary = simulate(&config, &script, strict)?;
            println!();
            println!("Total supply: {} {}", format_tokens(summary.total_supply), config.token.symbol);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Window { config, at } => {
            let config = load_config(&config)?;
            let engine = TradingRewards::from_config(&config)?;
            let window = engine.current_window(at)?;

            println!("Window: {}", window);
            println!("Start:  {}", format_time(window.start));
            println!("End:    {}", format_time(window.end));
            println!("Length: {}s", window.length());
        }

        Commands::Version => {
            let defaults = RewardsConfig::default();
            println!("Accrual v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Defaults:");
            println!("  Window length: {}s", defaults.period.length);
            println!(
                "  Reward rate:   {} {}/s",
                format_tokens(defaults.reward.rate().per_second()?),
                defaults.token.symbol
            );
            println!("  Decimals:      {}", DECIMALS);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(0), "0.000000000000000000");
        assert_eq!(format_tokens(ONE_TOKEN + 5), "1.000000000000000005");
        assert_eq!(format_tokens(387 * ONE_TOKEN / 1000), "0.387000000000000000");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_simulate_counts_rejections() {
        let config = RewardsConfig::default();
        let script = Script::from_toml_str(
            r#"
            [[op]]
            kind = "trade"
            at = 0
            trader = "alice"
            notional = 100

            [[op]]
            kind = "claim"
            at = 5
            trader = "bob"

            [[op]]
            kind = "claim"
            at = 2592000
            trader = "alice"
            "#,
        )
        .unwrap();

        let summary = simulate(&config, &script, false).unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.accounts.len(), 2);
        assert_eq!(summary.accounts[0].balance, summary.total_supply);
        assert_eq!(summary.total_supply, 2_592_000 * 387 * ONE_TOKEN / 1000);
        assert_eq!(summary.events.len(), 2);

        assert!(simulate(&config, &script, true).is_err());
    }

    #[test]
    fn test_malformed_trader_address_is_a_rejection() {
        let config = RewardsConfig::default();
        let script = Script::from_toml_str(
            r#"
            [[op]]
            kind = "trade"
            at = 0
            trader = "0xdeadbeef"
            notional = 100
            "#,
        )
        .unwrap();

        let summary = simulate(&config, &script, false).unwrap();
        assert_eq!(summary.rejected, 1);
        assert!(summary.accounts.is_empty());
        let err = simulate(&config, &script, true).unwrap_err();
        assert!(err.to_string().contains("malformed address"));
    }
}
