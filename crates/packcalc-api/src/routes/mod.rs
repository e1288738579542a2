//! # API Route Modules
//!
//! - `health`: liveness probe with a server timestamp.
//! - `pack_sizes`: read and replace the configured pack sizes.
//! - `calculate`: minimal exact pack distribution for an order.
//! - `ui`: embedded single-page browser client.

pub mod calculate;
pub mod health;
pub mod pack_sizes;
pub mod ui;
