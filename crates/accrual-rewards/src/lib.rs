//! # Accrual Rewards - Proportional Trading Rewards in O(1)
//!
//! Every trader earns a share of a fixed reward-per-second budget equal to
//! their activity over total market activity, pooled per window. No
//! operation ever iterates the trader set.
//!
//! ## Components
//!
//! - **Period Manager** (`period`): window boundaries, deferred length changes
//! - **Market Activity Accumulator** (`accumulator`): time-per-activity index
//!   plus frozen snapshots at window boundaries
//! - **Trader Ledger** (`ledger`): per-trader checkpoints and pending reward
//! - **Reward Token** (`token`) and **Operator Gate** (`auth`): collaborators
//! - **Engine** (`engine`): trade reports, claims, period changes
//!
//! ## Flow
//!
//! ```text
//!   report_trade ─► boundaries ─► accumulator ─► ledger(trader) ─► event
//!   claim        ─► boundaries ─► ledger(trader, closed windows) ─► mint ─► event
//! ```

pub mod accumulator;
pub mod auth;
pub mod config;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod period;
pub mod token;

// Re-exports
pub use accumulator::{MarketAccumulator, MarketState, WindowPhase};
pub use auth::{OperatorGate, Ownership};
pub use config::RewardsConfig;
pub use engine::{ClaimReceipt, SharedRewards, TradeReceipt, TradingRewards};
pub use events::{EventRecord, RewardEvent};
pub use ledger::{TraderAccount, TraderLedger};
pub use period::{PendingPeriod, PeriodChange, PeriodManager, Periodicity};
pub use token::{RewardMinter, RewardToken, TokenInfo};

pub use accrual_core::prelude::*;
