//! # Pack Size Set
//!
//! The validated, canonical form of a pack-size configuration. Both the
//! engine and the store build a [`PackSizeSet`] through the same
//! constructor, so they accept and reject exactly the same inputs.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{PackSizeViolation, PackingError};

/// Maximum number of distinct pack sizes.
pub const MAX_PACK_SIZES: usize = 10;

/// Built-in pack sizes used when nothing else is configured.
pub const DEFAULT_PACK_SIZES: [i64; 5] = [250, 500, 1000, 2000, 5000];

/// 1 to [`MAX_PACK_SIZES`] distinct positive pack sizes in ascending order.
///
/// Immutable once built; a new configuration is a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PackSizeSet(Vec<i64>);

impl PackSizeSet {
    /// Validate and normalize a candidate list of pack sizes.
    ///
    /// Duplicates are collapsed before the cardinality check, so
    /// `[250, 250, 500]` is a valid two-member set.
    pub fn new(candidate: &[i64]) -> Result<Self, PackingError> {
        if candidate.is_empty() {
            return Err(PackingError::InvalidPackSizes(PackSizeViolation::Empty));
        }

        let mut unique = BTreeSet::new();
        for &size in candidate {
            if size <= 0 {
                return Err(PackingError::InvalidPackSizes(
                    PackSizeViolation::NonPositive(size),
                ));
            }
            unique.insert(size);
            if unique.len() > MAX_PACK_SIZES {
                return Err(PackingError::InvalidPackSizes(PackSizeViolation::TooMany {
                    max: MAX_PACK_SIZES,
                }));
            }
        }

        Ok(Self(unique.into_iter().collect()))
    }

    /// Pack sizes in ascending order.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// The smallest pack size.
    pub fn smallest(&self) -> i64 {
        // Non-empty by construction.
        self.0[0]
    }

    /// The largest pack size.
    pub fn largest(&self) -> i64 {
        self.0[self.0.len() - 1]
    }

    /// Number of distinct pack sizes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a set has at least one member.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `size` is a member of the set.
    pub fn contains(&self, size: i64) -> bool {
        self.0.binary_search(&size).is_ok()
    }

    /// Copy the sizes out as an owned vector.
    pub fn to_vec(&self) -> Vec<i64> {
        self.0.clone()
    }
}

impl Default for PackSizeSet {
    fn default() -> Self {
        Self(DEFAULT_PACK_SIZES.to_vec())
    }
}

impl TryFrom<Vec<i64>> for PackSizeSet {
    type Error = PackingError;

    fn try_from(value: Vec<i64>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl std::fmt::Display for PackSizeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
