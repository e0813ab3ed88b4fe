//! Integration test suite for hifreq.
//!
//! This crate drives the stream engine end to end with real and stub
//! collaborators and checks the windowing invariants under randomized
//! configurations.

pub mod helpers;
