//! # Error Types
//!
//! Every failure the core can report. All variants are deterministic
//! outcomes of pure computation: retrying with the same inputs yields the
//! same error.

use thiserror::Error;

use crate::pack_sizes::MAX_PACK_SIZES;

/// Error returned by the packing engine and the pack-size store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackingError {
    /// The requested item count is negative.
    #[error("items must be a non-negative integer, got {0}")]
    InvalidItemCount(i64),

    /// The pack-size set violates cardinality or positivity rules.
    #[error("pack sizes must contain between 1 and {max} positive integers: {0}", max = MAX_PACK_SIZES)]
    InvalidPackSizes(PackSizeViolation),

    /// No non-negative combination of the pack sizes sums to the item count.
    #[error("cannot pack {items} items exactly with the provided pack sizes")]
    CannotFulfillExactly {
        /// The requested item count.
        items: i64,
    },

    /// The dynamic-programming tables for this item count could not be allocated.
    #[error("item count {items} is too large to compute")]
    CapacityExceeded {
        /// The requested item count.
        items: i64,
    },

    /// Reconstruction hit an amount with no recorded choice.
    ///
    /// Indicates a defect in the engine, not a property of the input.
    #[error("reconstruction failed with {remaining} items unaccounted for")]
    Reconstruction {
        /// Amount left when the walk stopped.
        remaining: usize,
    },
}

/// The specific rule a rejected pack-size set broke.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackSizeViolation {
    /// No pack sizes were supplied.
    #[error("no pack sizes provided")]
    Empty,

    /// A pack size was zero or negative.
    #[error("pack size {0} is not positive")]
    NonPositive(i64),

    /// More distinct pack sizes than allowed.
    #[error("more than {max} distinct pack sizes")]
    TooMany {
        /// The configured maximum.
        max: usize,
    },
}

impl PackingError {
    /// Whether this error is caused by the caller's input rather than by the engine.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Reconstruction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pack_sizes_message_names_limit_and_reason() {
        let err = PackingError::InvalidPackSizes(PackSizeViolation::NonPositive(-5));
        let msg = err.to_string();
        assert!(msg.contains("between 1 and 10"), "got: {msg}");
        assert!(msg.contains("-5"), "got: {msg}");
    }

    #[test]
    fn cannot_fulfill_message_names_items() {
        let err = PackingError::CannotFulfillExactly { items: 263 };
        assert!(err.to_string().contains("263"));
    }

    #[test]
    fn reconstruction_is_not_an_input_error() {
        assert!(!PackingError::Reconstruction { remaining: 3 }.is_input_error());
        assert!(PackingError::InvalidItemCount(-1).is_input_error());
        assert!(PackingError::CannotFulfillExactly { items: 7 }.is_input_error());
    }
}
