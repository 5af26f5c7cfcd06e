//! # Skillbound Library
//!
//! This library exposes the skillbound command implementations for testing
//! and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod error;
pub mod logging;

// Re-export skillbound_core for convenience
pub use skillbound_core;
