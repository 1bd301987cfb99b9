//! Error types for Accrual operations

use crate::types::Address;
use thiserror::Error;

/// Result type alias for Accrual operations
pub type Result<T> = std::result::Result<T, AccrualError>;

/// Errors that can abort an Accrual operation
///
/// Every error is raised before any state is committed, so a failed
/// operation leaves the engine exactly as it found it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccrualError {
    /// Caller does not hold the operator role
    #[error("Unauthorized caller: {caller}")]
    Unauthorized { caller: Address },

    /// Argument outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Claim by an address with no recorded activity
    #[error("Not a participant: {0}")]
    NotAParticipant(Address),

    /// Checked fixed-point arithmetic exceeded its width
    #[error("Arithmetic overflow in fixed-point computation")]
    ArithmeticOverflow,

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AccrualError {
    /// Get the error code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 1001,
            Self::InvalidArgument(_) => 1002,
            Self::NotAParticipant(_) => 1003,
            Self::ArithmeticOverflow => 1004,
            Self::Config(_) => 2001,
        }
    }

    /// Core operations never retry internally; retrying is up to the caller.
    pub fn is_recoverable(&self) -> bool {
        false
    }

    /// Shorthand for `InvalidArgument`
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
