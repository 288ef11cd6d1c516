//! Error types for vault operations.
//!
//! This module provides structured error types for the Fortress library,
//! enabling precise error handling and recovery strategies.

use std::fmt;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum FortressErrorCode {
    /// Feature not implemented
    Unimplemented = 1000,
    /// Network/provider layer error
    Network = 2000,
    /// Validation failed
    Validation = 3000,
    /// Funds would not cover fee and dust floor
    InsufficientFunds = 4000,
    /// No spendable inputs available
    NoSpendableInputs = 4001,
    /// Wallet declined to sign
    SigningRejected = 5000,
    /// Connected identity is not the configured rescuer
    RescuerMismatch = 5001,
    /// Operation not permitted in the current vault state
    InvalidState = 6000,
    /// Serialization error
    Serialization = 7000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Comprehensive error type for Fortress operations.
#[derive(Debug)]
pub enum FortressError {
    /// Feature not implemented yet.
    Unimplemented(&'static str),

    /// Network or provider request failed.
    Network(String),

    /// A request parameter failed validation. Never retried.
    Validation {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Post-fee remainder would fall below the dust floor.
    InsufficientFunds {
        /// Satoshis needed to complete the transaction
        required: u64,
        /// Satoshis actually available
        available: u64,
    },

    /// No UTXOs available to fund the transaction.
    NoSpendableInputs {
        /// Address that was queried
        address: String,
    },

    /// The signing wallet rejected the request. Surfaced verbatim, no retry.
    SigningRejected(String),

    /// Connected identity's hash does not match the stored rescuer hash.
    RescuerMismatch,

    /// Operation is not permitted in the current vault state.
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
        /// Current state name
        state: &'static str,
    },

    /// Serialization/deserialization error.
    Serialization(String),

    /// Internal/unexpected error.
    Internal(String),
}

impl FortressError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> FortressErrorCode {
        match self {
            Self::Unimplemented(_) => FortressErrorCode::Unimplemented,
            Self::Network(_) => FortressErrorCode::Network,
            Self::Validation { .. } => FortressErrorCode::Validation,
            Self::InsufficientFunds { .. } => FortressErrorCode::InsufficientFunds,
            Self::NoSpendableInputs { .. } => FortressErrorCode::NoSpendableInputs,
            Self::SigningRejected(_) => FortressErrorCode::SigningRejected,
            Self::RescuerMismatch => FortressErrorCode::RescuerMismatch,
            Self::InvalidState { .. } => FortressErrorCode::InvalidState,
            Self::Serialization(_) => FortressErrorCode::Serialization,
            Self::Internal(_) => FortressErrorCode::Internal,
        }
    }

    /// Get the error message as an owned String (useful for FFI).
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true if this error is potentially recoverable by retrying.
    ///
    /// Validation and signing failures are final; only transient transport
    /// problems qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Create a network error from any error type.
    pub fn network<E: std::error::Error>(err: E) -> Self {
        Self::Network(err.to_string())
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an insufficient-funds error naming the shortfall.
    pub fn insufficient_funds(required: u64, available: u64) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// The shortfall in satoshis, if this is an insufficient-funds error.
    pub fn shortfall(&self) -> Option<u64> {
        match self {
            Self::InsufficientFunds {
                required,
                available,
            } => Some(required.saturating_sub(*available)),
            _ => None,
        }
    }
}

impl fmt::Display for FortressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unimplemented(label) => write!(f, "{} is not implemented yet", label),
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::Validation { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
            Self::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "insufficient funds: need {} sats, have {} sats (short {})",
                    required,
                    available,
                    required.saturating_sub(*available)
                )
            }
            Self::NoSpendableInputs { address } => {
                write!(f, "no spendable UTXOs for {}", address)
            }
            Self::SigningRejected(msg) => write!(f, "signing rejected: {}", msg),
            Self::RescuerMismatch => {
                write!(
                    f,
                    "connected wallet does not match the configured rescuer"
                )
            }
            Self::InvalidState { operation, state } => {
                write!(f, "{} is not permitted while the vault is {}", operation, state)
            }
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for FortressError {}

impl From<serde_json::Error> for FortressError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            FortressError::RescuerMismatch.code(),
            FortressErrorCode::RescuerMismatch
        );
        assert_eq!(FortressErrorCode::Validation as i32, 3000);
    }

    #[test]
    fn insufficient_funds_names_the_shortfall() {
        let err = FortressError::insufficient_funds(10_000, 9_400);
        assert_eq!(err.shortfall(), Some(600));
        assert!(err.to_string().contains("short 600"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn only_network_errors_retry() {
        assert!(FortressError::Network("timeout".into()).is_retryable());
        assert!(!FortressError::SigningRejected("user declined".into()).is_retryable());
        assert!(!FortressError::validation("amount", "below dust").is_retryable());
    }
}
