//! Engine configuration types

use crate::token::TokenInfo;
use accrual_core::math;
use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete rewards configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Window layout
    #[serde(default)]
    pub period: PeriodConfig,

    /// Emission rate
    #[serde(default)]
    pub reward: RewardConfig,

    /// Reward token metadata
    #[serde(default)]
    pub token: TokenConfig,

    /// Privileged caller
    #[serde(default)]
    pub operator: OperatorConfig,
}

/// Period settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodConfig {
    /// Unix time at which window 0 starts
    #[serde(default)]
    pub origin: Timestamp,

    /// Window length in seconds
    #[serde(default = "default_period_length")]
    pub length: Duration,
}

fn default_period_length() -> Duration {
    DEFAULT_PERIOD_LENGTH
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            origin: 0,
            length: default_period_length(),
        }
    }
}

/// Reward rate, in tokens per second, as a fraction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_rate_numerator")]
    pub rate_numerator: u64,

    #[serde(default = "default_rate_denominator")]
    pub rate_denominator: u64,
}

fn default_rate_numerator() -> u64 {
    DEFAULT_RATE_NUMERATOR as u64
}

fn default_rate_denominator() -> u64 {
    DEFAULT_RATE_DENOMINATOR as u64
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            rate_numerator: default_rate_numerator(),
            rate_denominator: default_rate_denominator(),
        }
    }
}

impl RewardConfig {
    pub fn rate(&self) -> RewardRate {
        RewardRate::new(self.rate_numerator as u128, self.rate_denominator as u128)
    }
}

/// Token metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_name")]
    pub name: String,

    #[serde(default = "default_token_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_token_name() -> String {
    "Trading Reward".to_string()
}

fn default_token_symbol() -> String {
    "TRW".to_string()
}

fn default_decimals() -> u8 {
    DECIMALS
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_token_name(),
            symbol: default_token_symbol(),
            decimals: default_decimals(),
        }
    }
}

impl From<&TokenConfig> for TokenInfo {
    fn from(config: &TokenConfig) -> Self {
        Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
        }
    }
}

/// Operator settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Label or 64 character hex address of the exchange
    #[serde(default = "default_operator")]
    pub address: String,
}

fn default_operator() -> String {
    "exchange".to_string()
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            address: default_operator(),
        }
    }
}

impl OperatorConfig {
    pub fn address(&self) -> Result<Address> {
        self.address
            .parse()
            .map_err(|e: AccrualError| AccrualError::Config(format!("operator.address: {}", e)))
    }
}

impl RewardsConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AccrualError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AccrualError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period.length == 0 {
            return Err(AccrualError::Config("period.length must be non-zero".into()));
        }
        if self.reward.rate_denominator == 0 {
            return Err(AccrualError::Config(
                "reward.rate_denominator must be non-zero".into(),
            ));
        }
        if self.token.decimals != DECIMALS {
            return Err(AccrualError::Config(format!(
                "token.decimals must be {} to match the accumulator scale",
                DECIMALS
            )));
        }
        if self.operator.address.is_empty() {
            return Err(AccrualError::Config("operator.address must be set".into()));
        }
        self.operator.address()?;
        math::window_emission(self.period.length, self.reward.rate())
            .map_err(|e| AccrualError::Config(e.to_string()))?;
        Ok(())
    }
}
