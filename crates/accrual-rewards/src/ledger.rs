//! # Trader Ledger
//!
//! Each trader keeps a checkpoint of the market index and the volume it
//! carried since that checkpoint. Newly earned reward is a pure function of
//! `(volume, checkpoint, reference index)`:
//!
//! - same window as the market's current segment: reference = live index
//! - trader's window has closed: reference = index frozen at that close
//!
//! Claims only settle fully elapsed windows; a claim is not activity and
//! never moves a trader into a new window.

use crate::accumulator::{MarketAccumulator, WindowPhase};
use accrual_core::math;
use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-trader checkpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderAccount {
    /// Earned but not yet minted
    pub pending_reward: Amount,
    /// Own activity within the most recent active window
    pub last_volume: Volume,
    /// Market index the account was last rebased against
    pub checkpoint: IndexValue,
    /// End of the most recent active window; 0 means never traded
    pub last_active_window_end: Timestamp,
}

impl TraderAccount {
    pub fn is_participant(&self) -> bool {
        self.last_active_window_end != 0
    }
}

/// Planned effect of a trade on one account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeSettlement {
    pub trader: Address,
    pub phase: WindowPhase,
    /// Reward credited to `pending_reward` by this trade
    pub credited: Amount,
    pub next: TraderAccount,
}

/// Planned effect of a claim on one account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimSettlement {
    pub trader: Address,
    /// Reward settled by the claim itself
    pub credited: Amount,
    /// Everything owed, to be minted
    pub minted: Amount,
    pub next: TraderAccount,
}

/// All trader accounts, keyed by address
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TraderLedger {
    rate: RewardRate,
    accounts: HashMap<Address, TraderAccount>,
}

impl TraderLedger {
    pub fn new(rate: RewardRate) -> Self {
        Self {
            rate,
            accounts: HashMap::new(),
        }
    }

    pub fn rate(&self) -> RewardRate {
        self.rate
    }

    /// Account of `trader`, zeroed if it never traded
    pub fn account(&self, trader: &Address) -> TraderAccount {
        self.accounts.get(trader).copied().unwrap_or_default()
    }

    pub fn participant_count(&self) -> usize {
        self.accounts.len()
    }

    /// Reward accrued by `account` up to `reference`
    fn accrued(&self, account: &TraderAccount, reference: IndexValue) -> Result<Amount> {
        math::earned(account.last_volume, account.checkpoint, reference, self.rate)
    }

    /// Settle `trader` against the market and rebase it onto this trade.
    ///
    /// `index` is the market index after this report has been applied;
    /// `market` is the accumulator as it was before it.
    pub fn plan_trade(
        &self,
        trader: Address,
        magnitude: Volume,
        window: Window,
        index: IndexValue,
        market: &MarketAccumulator,
    ) -> Result<TradeSettlement> {
        let account = self.account(&trader);
        let phase = WindowPhase::between(window.start, account.last_active_window_end);

        let credited = if account.last_volume == 0 {
            0
        } else {
            let reference = match phase {
                WindowPhase::Continuing => index,
                WindowPhase::Rolled => market.window_close_index(account.last_active_window_end)?,
            };
            self.accrued(&account, reference)?
        };

        let next = TraderAccount {
            pending_reward: account
                .pending_reward
                .checked_add(credited)
                .ok_or(AccrualError::ArithmeticOverflow)?,
            last_volume: phase.pooled(account.last_volume, magnitude)?,
            checkpoint: index,
            last_active_window_end: window.end,
        };

        tracing::debug!(
            "Trade settlement planned for {}: phase {:?}, credited {}, volume {} -> {}",
            trader,
            phase,
            credited,
            account.last_volume,
            next.last_volume
        );

        Ok(TradeSettlement {
            trader,
            phase,
            credited,
            next,
        })
    }

    /// Settle every fully elapsed window of `trader` and drain its balance.
    pub fn plan_claim(
        &self,
        trader: Address,
        window: Window,
        market: &MarketAccumulator,
    ) -> Result<ClaimSettlement> {
        let mut next = self
            .accounts
            .get(&trader)
            .copied()
            .filter(TraderAccount::is_participant)
            .ok_or(AccrualError::NotAParticipant(trader))?;

        let credited = match WindowPhase::between(window.start, next.last_active_window_end) {
            WindowPhase::Continuing => 0,
            WindowPhase::Rolled => {
                let reference = market.window_close_index(next.last_active_window_end)?;
                let credited = self.accrued(&next, reference)?;
                next.checkpoint = reference;
                credited
            }
        };

        let minted = next
            .pending_reward
            .checked_add(credited)
            .ok_or(AccrualError::ArithmeticOverflow)?;
        next.pending_reward = 0;

        Ok(ClaimSettlement {
            trader,
            credited,
            minted,
            next,
        })
    }

    pub fn commit_trade(&mut self, settlement: &TradeSettlement) {
        self.accounts.insert(settlement.trader, settlement.next);
    }

    pub fn commit_claim(&mut self, settlement: &ClaimSettlement) {
        self.accounts.insert(settlement.trader, settlement.next);
    }
}
