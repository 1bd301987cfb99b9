//! # Accrual Core
//!
//! Shared building blocks for the Accrual trading rewards engine:
//! - `Address` and the numeric aliases used across the workspace
//! - `AccrualError`, the single error taxonomy of every operation
//! - Checked fixed-point helpers for the time-weighted activity index
//!
//! ## Fixed-point model
//!
//! ```text
//!   index  += elapsed × SCALE / total_volume        (per activity report)
//!   reward  = volume × Δindex × rate_num / rate_den (per settlement)
//! ```
//!
//! `SCALE` equals one whole token, so `volume × Δindex` is directly a number
//! of base-unit-seconds.

pub mod error;
pub mod math;
pub mod types;

pub use error::*;
pub use types::*;

/// Protocol constants
pub mod constants {
    /// Decimal places of the reward token
    pub const DECIMALS: u8 = 18;

    /// One reward token in base units
    pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000; // 10^18

    /// Scale of the activity index; activity magnitudes must stay below it
    pub const ACCUMULATOR_SCALE: u128 = ONE_TOKEN;

    /// Default reward rate: 0.387 tokens per second
    pub const DEFAULT_RATE_NUMERATOR: u128 = 387;
    pub const DEFAULT_RATE_DENOMINATOR: u128 = 1_000;

    /// Default window length: 30 days
    pub const DEFAULT_PERIOD_LENGTH: u64 = 30 * 24 * 3600; // 2,592,000 seconds
}

pub use constants::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{AccrualError, Result};
    pub use crate::types::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_matches_token_unit() {
        assert_eq!(ACCUMULATOR_SCALE, 10u128.pow(DECIMALS as u32));
    }

    #[test]
    fn test_default_period() {
        assert_eq!(DEFAULT_PERIOD_LENGTH, 2_592_000);
    }
}
