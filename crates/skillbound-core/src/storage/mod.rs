//! # Storage Module
//!
//! Disk-backed ledger persistence using redb.
//!
//! Uses redb embedded database for:
//! - ACID transactions (a save is one write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - One table per logical ledger table

mod redb_ledger;

pub use redb_ledger::RedbLedger;
