//! # hifreq-core
//! Foundation types and traits for the hifreq decay stream.
//!
//! - [`units`] — quantity strings with explicit units (`"10 kBq"`, `"1 us"`)
//! - [`properties`] — key-value configuration sets consumed at initialization
//! - [`random`] — the seeded pseudo-random source shared by all sampling
//! - [`types`] — particles, vertices and output events
//! - [`traits`] — collaborator contracts (per-decay and vertex generators)
//! - [`registry`] — name-to-handle dictionaries with lazy initialization

pub mod constants;
pub mod error;
pub mod properties;
pub mod random;
pub mod registry;
pub mod traits;
pub mod types;
pub mod units;
