//! # packcalc-core — Exact Pack Distribution
//!
//! Computes the smallest number of fixed-size packs that together hold
//! exactly the requested number of items, and owns the mutable pack-size
//! configuration that feeds the computation.
//!
//! ## Components
//!
//! - [`calculator`]: the packing engine. A pure function of
//!   `(items, pack sizes)`: unbounded coin-change dynamic program with
//!   reconstruction, O(N×k) time and O(N) space.
//! - [`store`]: the pack-size store. A single owned cell behind a
//!   shared-read/exclusive-write lock, exposing `read` and `replace`.
//! - [`pack_sizes`]: the validated [`PackSizeSet`] shared by both, so the
//!   engine and the store accept exactly the same inputs.
//! - [`distribution`]: the [`PackDistribution`] result type.
//!
//! ## Crate Policy
//!
//! - Leaf of the workspace DAG: no I/O, no logging, no async.
//! - Every invalid or infeasible input is an ordinary [`PackingError`];
//!   nothing in this crate panics on caller input.
//! - No floating point in the computation.

pub mod calculator;
pub mod distribution;
pub mod error;
pub mod pack_sizes;
pub mod store;

pub use calculator::{calculate_packs, calculate_with_set, DpCalculator, PackCalculator};
pub use distribution::PackDistribution;
pub use error::{PackSizeViolation, PackingError};
pub use pack_sizes::{PackSizeSet, DEFAULT_PACK_SIZES, MAX_PACK_SIZES};
pub use store::{MemoryPackSizeStore, PackSizeStore};
