//! Errors surfaced by the command-line layer.

use skillbound_core::LedgerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no ledger at {0}; run `skillbound init` first")]
    NotInitialized(PathBuf),

    #[error("ledger already exists at {0}; pass --force to replace it")]
    AlreadyInitialized(PathBuf),
}
