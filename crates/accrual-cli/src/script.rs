//! Scenario scripts replayed by `accrual simulate`
//!
//! ```toml
//! [[op]]
//! kind = "trade"
//! at = 0
//! trader = "alice"
//! notional = 100000
//!
//! [[op]]
//! kind = "set-period"
//! at = 3600
//! length = 86400
//!
//! [[op]]
//! kind = "claim"
//! at = 2592000
//! trader = "alice"
//! ```

use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One scripted operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Op {
    Trade {
        at: Timestamp,
        trader: String,
        notional: i64,
        /// Reporting caller, the configured operator when omitted
        #[serde(default)]
        caller: Option<String>,
    },
    Claim {
        at: Timestamp,
        trader: String,
    },
    SetPeriod {
        at: Timestamp,
        length: Duration,
        #[serde(default)]
        caller: Option<String>,
    },
}

impl Op {
    pub fn at(&self) -> Timestamp {
        match self {
            Op::Trade { at, .. } | Op::Claim { at, .. } | Op::SetPeriod { at, .. } => *at,
        }
    }

    /// Trader named by the operation, if any
    pub fn trader(&self) -> Option<&str> {
        match self {
            Op::Trade { trader, .. } | Op::Claim { trader, .. } => Some(trader),
            Op::SetPeriod { .. } => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "op", default)]
    pub ops: Vec<Op>,
}

impl Script {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Trader labels in order of first appearance
    pub fn traders(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for trader in self.ops.iter().filter_map(Op::trader) {
            if !seen.iter().any(|known: &String| known == trader) {
                seen.push(trader.to_string());
            }
        }
        seen
    }
}

/// Resolve a label or hex string to an address
pub fn address(label: &str) -> Result<Address> {
    label.parse()
}
