//! # CLI Commands
//!
//! Each command loads the ledger, runs one core operation and, for
//! state-changing commands, saves the ledger only if the operation succeeded.
//! Commands return their result as JSON so callers and tests can inspect it;
//! [`emit`] renders it for the terminal.

use crate::error::CliError;
use serde_json::{Value, json};
use skillbound_core::formats::{export_snapshot, import_snapshot};
use skillbound_core::storage::RedbLedger;
use skillbound_core::{Holder, IdentityId, Ledger, LedgerConfig};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// BACKENDS
// =============================================================================

/// Where a ledger is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Single snapshot file (postcard + header).
    File,
    /// redb database, one table per ledger table.
    Redb,
}

impl FromStr for Backend {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(CliError::InvalidArgument(format!(
                "unknown backend '{other}' (expected file or redb)"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Redb => f.write_str("redb"),
        }
    }
}

/// A ledger location and its backend.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    backend: Backend,
}

impl Store {
    /// Parse `backend` ("file" or "redb") and pair it with `path`.
    pub fn new(path: impl Into<PathBuf>, backend: &str) -> Result<Self, CliError> {
        Ok(Self::with_backend(path, backend.parse()?))
    }

    pub fn with_backend(path: impl Into<PathBuf>, backend: Backend) -> Self {
        Self {
            path: path.into(),
            backend,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a ledger has been saved here.
    pub fn exists(&self) -> Result<bool, CliError> {
        if !self.path.exists() {
            return Ok(false);
        }
        match self.backend {
            Backend::File => Ok(true),
            Backend::Redb => Ok(RedbLedger::open(&self.path)?.load()?.is_some()),
        }
    }

    /// Load the ledger; fails if none has been initialized.
    pub fn load(&self) -> Result<Ledger, CliError> {
        if !self.path.exists() {
            return Err(CliError::NotInitialized(self.path.clone()));
        }
        match self.backend {
            Backend::File => {
                let bytes = std::fs::read(&self.path)?;
                Ok(import_snapshot(&bytes)?)
            }
            Backend::Redb => RedbLedger::open(&self.path)?
                .load()?
                .ok_or_else(|| CliError::NotInitialized(self.path.clone())),
        }
    }

    /// Persist the ledger, replacing what was stored.
    pub fn save(&self, ledger: &Ledger) -> Result<(), CliError> {
        match self.backend {
            Backend::File => {
                let bytes = export_snapshot(ledger)?;
                let tmp = self.path.with_extension("tmp");
                std::fs::write(&tmp, &bytes)?;
                std::fs::rename(&tmp, &self.path)?;
            }
            Backend::Redb => RedbLedger::open(&self.path)?.save(ledger)?,
        }
        tracing::debug!(path = %self.path.display(), backend = %self.backend, "ledger saved");
        Ok(())
    }

    /// Load, apply `op`, and save only if `op` succeeded.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Ledger) -> Result<T, CliError>,
    ) -> Result<T, CliError> {
        let mut ledger = self.load()?;
        let out = op(&mut ledger)?;
        self.save(&ledger)?;
        Ok(out)
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Print a command result as pretty JSON or as plain text.
pub fn emit(value: &Value, json_mode: bool) -> Result<(), CliError> {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(value)?);
        return Ok(());
    }
    match value {
        Value::Object(map) => {
            for (key, field) in map {
                println!("{key}: {}", plain(field));
            }
        }
        Value::Array(items) => {
            for item in items {
                println!("{}", plain(item));
            }
        }
        other => println!("{}", plain(other)),
    }
    Ok(())
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", plain(v)))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Create a new ledger.
///
/// Settings come from `config` (JSON `LedgerConfig`) if given; `authority`
/// overrides the configured authority.
pub fn cmd_init(
    store: &Store,
    force: bool,
    config: Option<&Path>,
    authority: Option<&str>,
) -> Result<Value, CliError> {
    if store.exists()? && !force {
        return Err(CliError::AlreadyInitialized(store.path.clone()));
    }
    if force && store.path.exists() {
        std::fs::remove_file(&store.path)?;
    }

    let mut settings = match config {
        Some(path) => serde_json::from_str::<LedgerConfig>(&std::fs::read_to_string(path)?)?,
        None => LedgerConfig::default(),
    };
    if let Some(authority) = authority {
        settings.authority = Holder::new(authority);
    }

    let ledger = Ledger::new(settings)?;
    store.save(&ledger)?;
    tracing::info!(
        path = %store.path.display(),
        authority = %ledger.authority(),
        "ledger initialized"
    );
    Ok(json!({ "authority": ledger.authority().as_str(), "skills": ledger.skill_count() }))
}

pub fn cmd_mint(store: &Store, holder: &str, occupation: &str) -> Result<Value, CliError> {
    let id: IdentityId = store.mutate(|ledger| Ok(ledger.mint(Holder::new(holder), occupation)?))?;
    tracing::info!(%id, holder, "identity minted");
    Ok(json!({ "id": id.0, "holder": holder }))
}

pub fn cmd_burn(store: &Store, caller: &str, id: u64) -> Result<Value, CliError> {
    store.mutate(|ledger| Ok(ledger.burn(&Holder::new(caller), IdentityId(id))?))?;
    tracing::info!(id, caller, "identity burned");
    Ok(json!({ "burned": id }))
}

/// Submit one batch of four raw points.
pub fn cmd_evaluate(
    store: &Store,
    caller: &str,
    rater: u64,
    subject: u64,
    points: &[u8],
) -> Result<Value, CliError> {
    let scores = store.mutate(|ledger| {
        Ok(ledger.evaluate(&Holder::new(caller), IdentityId(rater), IdentityId(subject), points)?)
    })?;
    tracing::info!(rater, subject, ?points, ?scores, "evaluation recorded");
    Ok(json!({ "rater": rater, "subject": subject, "normalized": scores.to_vec() }))
}

pub fn cmd_assessment(store: &Store, subject: u64, skill: usize) -> Result<Value, CliError> {
    let ledger = store.load()?;
    let value = ledger.assessment(IdentityId(subject), skill)?;
    let history = ledger.assessment_history(IdentityId(subject), skill)?;
    Ok(json!({ "subject": subject, "skill": skill, "assessment": value, "count": history.len() }))
}

pub fn cmd_set_scores(
    store: &Store,
    caller: &str,
    id: u64,
    scores: &[u8],
) -> Result<Value, CliError> {
    store.mutate(|ledger| Ok(ledger.set_scores(&Holder::new(caller), IdentityId(id), scores)?))?;
    tracing::info!(id, ?scores, "score overrides set");
    Ok(json!({ "id": id, "scores": scores }))
}

pub fn cmd_score(store: &Store, id: u64, skill: usize) -> Result<Value, CliError> {
    let ledger = store.load()?;
    Ok(json!({ "id": id, "skill": skill, "score": ledger.score(IdentityId(id), skill)? }))
}

pub fn cmd_occupation(store: &Store, id: u64) -> Result<Value, CliError> {
    let ledger = store.load()?;
    Ok(json!({ "id": id, "occupation": ledger.occupation(IdentityId(id)) }))
}

pub fn cmd_set_occupation(
    store: &Store,
    caller: &str,
    id: u64,
    text: &str,
) -> Result<Value, CliError> {
    store.mutate(|ledger| Ok(ledger.set_occupation(&Holder::new(caller), IdentityId(id), text)?))?;
    tracing::info!(id, caller, "occupation updated");
    Ok(json!({ "id": id, "occupation": text }))
}

pub fn cmd_skills(store: &Store) -> Result<Value, CliError> {
    let ledger = store.load()?;
    let skills: Vec<Value> = ledger
        .catalog()
        .iter()
        .map(|skill| json!({ "index": skill.index.get(), "name": skill.name }))
        .collect();
    Ok(Value::Array(skills))
}

pub fn cmd_set_base_locator(store: &Store, caller: &str, value: &str) -> Result<Value, CliError> {
    store.mutate(|ledger| Ok(ledger.set_catalog_base_locator(&Holder::new(caller), value)?))?;
    tracing::info!(value, "base locator set");
    Ok(json!({ "base_locator": value }))
}

pub fn cmd_locator(store: &Store, id: u64) -> Result<Value, CliError> {
    let ledger = store.load()?;
    Ok(json!({ "id": id, "locator": ledger.identity_locator(IdentityId(id))? }))
}

pub fn cmd_transfer_authority(
    store: &Store,
    caller: &str,
    new_holder: &str,
) -> Result<Value, CliError> {
    store.mutate(|ledger| {
        Ok(ledger.transfer_authority(&Holder::new(caller), Holder::new(new_holder))?)
    })?;
    tracing::info!(from = caller, to = new_holder, "authority transferred");
    Ok(json!({ "authority": new_holder }))
}

pub fn cmd_stats(store: &Store, rater: u64, skill: usize) -> Result<Value, CliError> {
    let ledger = store.load()?;
    let stats = ledger.stats(IdentityId(rater), skill)?;
    let points = ledger.point_history(IdentityId(rater), skill)?;
    Ok(json!({
        "rater": rater,
        "skill": skill,
        "average": stats.average(),
        "std_deviation": stats.std_deviation(),
        "points": points,
    }))
}

pub fn cmd_status(store: &Store) -> Result<Value, CliError> {
    let ledger = store.load()?;
    Ok(serde_json::to_value(ledger.status())?)
}

/// Write the ledger to `output` as a binary snapshot or as JSON.
pub fn cmd_export(store: &Store, output: &Path, format: &str) -> Result<Value, CliError> {
    let ledger = store.load()?;
    let bytes = match format {
        "snapshot" => export_snapshot(&ledger)?,
        "json" => serde_json::to_vec_pretty(&ledger.snapshot())?,
        other => {
            return Err(CliError::InvalidArgument(format!(
                "unknown export format '{other}' (expected snapshot or json)"
            )));
        }
    };
    std::fs::write(output, &bytes)?;
    tracing::info!(output = %output.display(), format, bytes = bytes.len(), "ledger exported");
    Ok(json!({ "output": output.display().to_string(), "bytes": bytes.len() }))
}

/// Replace the stored ledger with a binary snapshot.
pub fn cmd_import(store: &Store, input: &Path) -> Result<Value, CliError> {
    let ledger = import_snapshot(&std::fs::read(input)?)?;
    store.save(&ledger)?;
    let status = ledger.status();
    tracing::info!(input = %input.display(), identities = status.live_identities, "ledger imported");
    Ok(serde_json::to_value(status)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing() {
        assert_eq!(Backend::from_str("file").ok(), Some(Backend::File));
        assert_eq!(Backend::from_str("redb").ok(), Some(Backend::Redb));
        assert!(Backend::from_str("sqlite").is_err());
    }

    #[test]
    fn plain_rendering() {
        assert_eq!(plain(&json!("text")), "text");
        assert_eq!(plain(&json!(5)), "5");
        assert_eq!(plain(&json!({ "a": 1, "b": "x" })), "a=1 b=x");
    }
}
