//! Test module for determinism, integration and property tests.
//!
//! This module exercises whole matches through the public engine API:
//! - **Determinism tests**: same seed, clock and calls produce identical state
//! - **Integration tests**: full matches from lobby to outcome
//! - **Property tests**: invariants over generated inputs
//! - **Helper functions**: fleets, clocks and battle-ready matches
//!
//! # Test Structure
//!
//! - `determinism.rs`: replay and seed tests
//! - `integration.rs`: end-to-end scenarios
//! - `properties.rs`: `proptest` invariants
//! - `helpers.rs`: test setup utilities and factory functions

mod helpers;

// Re-export for convenience
pub use helpers::*;
