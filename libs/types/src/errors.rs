//! Error taxonomy shared by the offering contracts
//!
//! Contract-specific errors live next to their contracts; this module holds
//! the category every one of them maps onto and the numeric failures raised
//! by fixed-point helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Broad classification of a rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caller lacks the required capability
    Authorization,
    /// Account not approved, or unknown compliance class
    Compliance,
    /// Operation invalid for the current lifecycle state
    State,
    /// Amount or time outside the permitted window
    Bound,
    /// The payment or distribution asset transfer failed
    ExternalTransfer,
    /// Checked arithmetic failed
    Arithmetic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Compliance => "compliance",
            ErrorCategory::State => "state",
            ErrorCategory::Bound => "bound",
            ErrorCategory::ExternalTransfer => "external-transfer",
            ErrorCategory::Arithmetic => "arithmetic",
        };
        f.write_str(name)
    }
}

/// Fixed-point arithmetic failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Division by zero")]
    DivisionByZero,
}

impl NumericError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Arithmetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::ExternalTransfer.to_string(), "external-transfer");
        assert_eq!(ErrorCategory::Bound.to_string(), "bound");
    }

    #[test]
    fn test_numeric_error_display() {
        assert_eq!(NumericError::Overflow.to_string(), "Arithmetic overflow");
        assert_eq!(NumericError::DivisionByZero.category(), ErrorCategory::Arithmetic);
    }
}
