//! # Reward Token
//!
//! Conventional fungible-token ledger that realizes claimed rewards.
//! The rewards engine is its single minter.

use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settlement collaborator: credits realized reward to a recipient.
///
/// Trusted and infallible for any amount.
pub trait RewardMinter {
    fn mint(&mut self, recipient: Address, amount: Amount);
}

/// Token definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenInfo {
    fn default() -> Self {
        Self {
            name: "Trading Reward".to_string(),
            symbol: "TRW".to_string(),
            decimals: DECIMALS,
        }
    }
}

/// In-memory balances and supply
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardToken {
    info: TokenInfo,
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl RewardToken {
    pub fn new(info: TokenInfo) -> Self {
        Self {
            info,
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    pub fn info(&self) -> &TokenInfo {
        &self.info
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Move `amount` between holders
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(AccrualError::invalid(format!(
                "insufficient balance: have {}, need {}",
                balance, amount
            )));
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        self.balances.insert(from, balance - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

impl RewardMinter for RewardToken {
    fn mint(&mut self, recipient: Address, amount: Amount) {
        if amount == 0 {
            return;
        }
        let balance = self.balances.entry(recipient).or_insert(0);
        *balance = balance.saturating_add(amount);
        self.total_supply = self.total_supply.saturating_add(amount);
        tracing::debug!(
            "Minted {} {} to {} (supply {})",
            amount,
            self.info.symbol,
            recipient,
            self.total_supply
        );
    }
}
