//! Core type definitions for Accrual
//!
//! Participants are identified by 32-byte addresses. Quantities use wide
//! unsigned integers so that fixed-point products stay within `u128`.

use crate::error::AccrualError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unix time in seconds, as observed by the host executing an operation
pub type Timestamp = u64;

/// Window length in seconds
pub type Duration = u64;

/// Signed position change reported by the operator
pub type Notional = i128;

/// Unsigned cumulative activity within a window
pub type Volume = u128;

/// Reward token amount in base units (18 decimals)
pub type Amount = u128;

/// Fixed-point accumulator value, scaled by `ACCUMULATOR_SCALE`
pub type IndexValue = u128;

/// Address - identity of a trader, operator or token holder
///
/// Either raw 32 bytes, or derived from a human label with BLAKE3 so that
/// scenarios and tests can refer to participants by name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address {
    bytes: [u8; 32],
}

impl Address {
    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Derive an address from a human readable label
    pub fn from_label(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        Self {
            bytes: *hash.as_bytes(),
        }
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from a 64 character hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self { bytes })
    }

    /// Null address, never a valid trader
    pub const ZERO: Self = Self { bytes: [0u8; 32] };
}

impl FromStr for Address {
    type Err = AccrualError;

    /// `0x`-prefixed or 64 character strings must be valid hex addresses;
    /// anything else is treated as a label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_form = match s.strip_prefix("0x") {
            Some(stripped) => Some(stripped),
            None if s.len() == 64 => Some(s),
            None => None,
        };
        match hex_form {
            Some(hex) => Self::from_hex(hex)
                .map_err(|e| AccrualError::invalid(format!("malformed address {:?}: {}", s, e))),
            None if s.is_empty() => Err(AccrualError::invalid("empty address")),
            None => Ok(Self::from_label(s)),
        }
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

impl TryFrom<String> for Address {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

/// Reward emitted per second to the whole market, as a fraction of one token
///
/// The default is 387/1000 tokens per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRate {
    pub numerator: u128,
    pub denominator: u128,
}

impl RewardRate {
    pub const fn new(numerator: u128, denominator: u128) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Base units emitted per second (rounded down)
    pub fn per_second(&self) -> crate::error::Result<Amount> {
        if self.denominator == 0 {
            return Err(AccrualError::invalid("reward rate denominator is zero"));
        }
        crate::constants::ONE_TOKEN
            .checked_mul(self.numerator)
            .map(|scaled| scaled / self.denominator)
            .ok_or(AccrualError::ArithmeticOverflow)
    }
}

impl Default for RewardRate {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_RATE_NUMERATOR,
            crate::constants::DEFAULT_RATE_DENOMINATOR,
        )
    }
}

/// Half-open window `[start, end)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Window {
    pub const fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Check whether a timestamp falls within this window
    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at < self.end
    }

    pub fn length(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_label_is_stable() {
        assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    }

    #[test]
    fn test_address_parse() {
        let alice = Address::from_label("alice");
        let parsed: Address = alice.to_hex().parse().unwrap();
        assert_eq!(parsed, alice);

        let labelled: Address = "alice".parse().unwrap();
        assert_eq!(labelled, alice);

        let prefixed: Address = format!("0x{}", alice.to_hex()).parse().unwrap();
        assert_eq!(prefixed, alice);
    }

    #[test]
    fn test_address_parse_rejects_malformed_hex() {
        // Looks like an address but is not one: never silently hashed as a label
        let typo = format!("{}zz", &Address::from_label("alice").to_hex()[..62]);
        assert!(matches!(
            typo.parse::<Address>(),
            Err(AccrualError::InvalidArgument(_))
        ));
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xnot-hex".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serializes_as_hex() {
        let alice = Address::from_label("alice");
        let json = serde_json::to_string(&alice).unwrap();
        assert_eq!(json, format!("\"{}\"", alice.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, alice);
    }

    #[test]
    fn test_default_rate() {
        let rate = RewardRate::default();
        assert_eq!(rate.per_second().unwrap(), 387_000_000_000_000_000);
    }

    #[test]
    fn test_rate_per_second_is_checked() {
        assert!(RewardRate::new(1, 0).per_second().is_err());
        assert_eq!(
            RewardRate::new(u128::MAX, 1).per_second(),
            Err(AccrualError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_window_contains() {
        let window = Window::new(100, 200);
        assert!(window.contains(100));
        assert!(window.contains(199));
        assert!(!window.contains(200));
        assert_eq!(window.length(), 100);
        assert_eq!(Window::new(200, 100).length(), 0);
    }
}
