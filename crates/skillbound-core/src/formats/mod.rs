//! # Formats Module
//!
//! Serialization formats for skillbound ledgers.
//!
//! This module contains:
//! - Binary snapshot format (header + checksum + postcard)
//! - The serde snapshot model, also used by the binary for JSON export
//!
//! Note: File I/O stays in the app layer (apps/skillbound).
//! This module only handles format conversion (pure transformations).

mod persistence;

pub use persistence::*;
