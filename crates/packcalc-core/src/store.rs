//! # Pack-Size Store
//!
//! Holds the single current [`PackSizeSet`]. Readers get independent
//! snapshots; writers replace the whole set atomically after validation.
//!
//! The lock is `parking_lot::RwLock`: shared for `read`, exclusive for
//! `replace`, never held across validation or `.await` points, and not
//! poisoned by a panicking holder.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PackingError;
use crate::pack_sizes::PackSizeSet;

/// Read/replace access to the current pack-size configuration.
pub trait PackSizeStore: Send + Sync {
    /// Snapshot of the current set in ascending order.
    fn read(&self) -> PackSizeSet;

    /// Validate `candidate` and, if valid, make it the current set.
    ///
    /// Returns the committed set. On error the previous set is untouched.
    fn replace(&self, candidate: &[i64]) -> Result<PackSizeSet, PackingError>;
}

/// In-memory store. Clones share the same underlying cell.
#[derive(Debug, Clone)]
pub struct MemoryPackSizeStore {
    current: Arc<RwLock<PackSizeSet>>,
}

impl MemoryPackSizeStore {
    /// Create a store holding the built-in default pack sizes.
    pub fn new() -> Self {
        Self::with_set(PackSizeSet::default())
    }

    /// Create a store seeded with `initial`, validated like [`PackSizeStore::replace`].
    pub fn with_sizes(initial: &[i64]) -> Result<Self, PackingError> {
        Ok(Self::with_set(PackSizeSet::new(initial)?))
    }

    /// Create a store seeded with an already-validated set.
    pub fn with_set(initial: PackSizeSet) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }
}

impl Default for MemoryPackSizeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PackSizeStore for MemoryPackSizeStore {
    fn read(&self) -> PackSizeSet {
        self.current.read().clone()
    }

    fn replace(&self, candidate: &[i64]) -> Result<PackSizeSet, PackingError> {
        let normalized = PackSizeSet::new(candidate)?;
        *self.current.write() = normalized.clone();
        Ok(normalized)
    }
}
