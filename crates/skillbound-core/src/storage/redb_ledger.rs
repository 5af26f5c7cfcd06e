//! redb store with one table per logical ledger table.
//!
//! | Table         | Key              | Value                 |
//! |---------------|------------------|-----------------------|
//! | `stats`       | (rater, skill)   | (average, std dev)    |
//! | `points`      | (rater, skill)   | raw points, in order  |
//! | `assessments` | (subject, skill) | normalized scores     |
//! | `scores`      | (id, skill)      | override value        |
//! | `occupations` | id               | text                  |
//! | `identities`  | id               | holder                |
//! | `meta`        | "ledger"         | postcard(`MetaRecord`)|

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::formats::{AssessmentEntry, LedgerSnapshot, StatsEntry};
use crate::ledger::Ledger;
use crate::primitives::SKILL_COUNT;
use crate::stats::EvaluationStats;
use crate::{Holder, IdentityId, SkillIndex};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const STATS: TableDefinition<(u64, u8), (u16, u16)> = TableDefinition::new("stats");
const POINTS: TableDefinition<(u64, u8), &[u8]> = TableDefinition::new("points");
const ASSESSMENTS: TableDefinition<(u64, u8), &[u8]> = TableDefinition::new("assessments");
const SCORES: TableDefinition<(u64, u8), u8> = TableDefinition::new("scores");
const OCCUPATIONS: TableDefinition<u64, &str> = TableDefinition::new("occupations");
const IDENTITIES: TableDefinition<u64, &str> = TableDefinition::new("identities");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

const META_KEY: &str = "ledger";

/// Scalar ledger state stored under `meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetaRecord {
    config: LedgerConfig,
    next_identity: u64,
    evaluations: u64,
}

/// A ledger persisted in a redb database file.
pub struct RedbLedger {
    db: Database,
}

impl std::fmt::Debug for RedbLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbLedger").finish_non_exhaustive()
    }
}

impl RedbLedger {
    /// Open the database at `path`, creating the file if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)?;
        Ok(Self { db })
    }

    /// Replace the stored ledger with `ledger` in one write transaction.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let snapshot = ledger.snapshot();
        let meta = postcard::to_allocvec(&MetaRecord {
            config: snapshot.config,
            next_identity: snapshot.next_identity,
            evaluations: snapshot.evaluations,
        })?;

        let txn = self.db.begin_write()?;
        txn.delete_table(STATS)?;
        txn.delete_table(POINTS)?;
        txn.delete_table(ASSESSMENTS)?;
        txn.delete_table(SCORES)?;
        txn.delete_table(OCCUPATIONS)?;
        txn.delete_table(IDENTITIES)?;
        {
            let mut stats = txn.open_table(STATS)?;
            let mut points = txn.open_table(POINTS)?;
            for entry in &snapshot.stats {
                let key = (entry.rater.0, entry.skill.get() as u8);
                stats.insert(key, (entry.stats.average(), entry.stats.std_deviation()))?;
                points.insert(key, entry.points.as_slice())?;
            }

            let mut assessments = txn.open_table(ASSESSMENTS)?;
            for entry in &snapshot.assessments {
                let key = (entry.subject.0, entry.skill.get() as u8);
                assessments.insert(key, entry.scores.as_slice())?;
            }

            let mut scores = txn.open_table(SCORES)?;
            for (id, values) in &snapshot.scores {
                for (skill, value) in values.iter().enumerate() {
                    scores.insert((id.0, skill as u8), *value)?;
                }
            }

            let mut occupations = txn.open_table(OCCUPATIONS)?;
            for (id, text) in &snapshot.occupations {
                occupations.insert(id.0, text.as_str())?;
            }

            let mut identities = txn.open_table(IDENTITIES)?;
            for (id, holder) in &snapshot.identities {
                identities.insert(id.0, holder.as_str())?;
            }

            let mut meta_table = txn.open_table(META)?;
            meta_table.insert(META_KEY, meta.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Load the stored ledger; `None` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Ledger>> {
        let txn = self.db.begin_read()?;

        let meta: MetaRecord = {
            let table = match txn.open_table(META) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(err) => return Err(err.into()),
            };
            let Some(bytes) = table.get(META_KEY)? else {
                return Ok(None);
            };
            postcard::from_bytes(bytes.value())?
        };

        let mut histories: BTreeMap<(u64, u8), Vec<u8>> = BTreeMap::new();
        if let Some(table) = open_optional(&txn, POINTS)? {
            for row in table.iter()? {
                let (key, value) = row?;
                histories.insert(key.value(), value.value().to_vec());
            }
        }

        let mut stats = Vec::new();
        if let Some(table) = open_optional(&txn, STATS)? {
            for row in table.iter()? {
                let (key, value) = row?;
                let (rater, skill) = key.value();
                let (average, std_deviation) = value.value();
                let points = histories.remove(&(rater, skill)).ok_or_else(|| {
                    LedgerError::Format(format!("no point history for rater {rater} skill {skill}"))
                })?;
                stats.push(StatsEntry {
                    rater: IdentityId(rater),
                    skill: SkillIndex::new(skill as usize)?,
                    stats: EvaluationStats::from_stored(average, std_deviation),
                    points,
                });
            }
        }
        if let Some(((rater, skill), _)) = histories.first_key_value() {
            return Err(LedgerError::Format(format!(
                "no statistics for rater {rater} skill {skill}"
            )));
        }

        let mut assessments = Vec::new();
        if let Some(table) = open_optional(&txn, ASSESSMENTS)? {
            for row in table.iter()? {
                let (key, value) = row?;
                let (subject, skill) = key.value();
                assessments.push(AssessmentEntry {
                    subject: IdentityId(subject),
                    skill: SkillIndex::new(skill as usize)?,
                    scores: value.value().to_vec(),
                });
            }
        }

        let mut scores: BTreeMap<IdentityId, [u8; SKILL_COUNT]> = BTreeMap::new();
        if let Some(table) = open_optional(&txn, SCORES)? {
            for row in table.iter()? {
                let (key, value) = row?;
                let (id, skill) = key.value();
                let skill = SkillIndex::new(skill as usize)?;
                scores.entry(IdentityId(id)).or_default()[skill.get()] = value.value();
            }
        }

        let mut occupations = Vec::new();
        if let Some(table) = open_optional(&txn, OCCUPATIONS)? {
            for row in table.iter()? {
                let (key, value) = row?;
                occupations.push((IdentityId(key.value()), value.value().to_string()));
            }
        }

        let mut identities = Vec::new();
        if let Some(table) = open_optional(&txn, IDENTITIES)? {
            for row in table.iter()? {
                let (key, value) = row?;
                identities.push((IdentityId(key.value()), Holder::new(value.value())));
            }
        }

        let snapshot = LedgerSnapshot {
            config: meta.config,
            next_identity: meta.next_identity,
            identities,
            stats,
            assessments,
            scores: scores.into_iter().collect(),
            occupations,
            evaluations: meta.evaluations,
        };
        Ledger::from_snapshot(snapshot).map(Some)
    }
}

/// Open a table that may not have been created yet.
fn open_optional<K: redb::Key + 'static, V: redb::Value + 'static>(
    txn: &redb::ReadTransaction,
    table: TableDefinition<K, V>,
) -> Result<Option<redb::ReadOnlyTable<K, V>>> {
    match txn.open_table(table) {
        Ok(table) => Ok(Some(table)),
        Err(TableError::TableDoesNotExist(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> Ledger {
        let root = Holder::new("root");
        let mut ledger = Ledger::new(LedgerConfig::with_authority(root.clone()))
            .unwrap_or_else(|_| unreachable!("valid config"));
        let a = ledger.mint(Holder::new("alice"), "pilot").unwrap_or(IdentityId(0));
        let b = ledger.mint(Holder::new("bob"), "").unwrap_or(IdentityId(0));
        for points in [[5u8, 6, 7, 8], [7, 2, 9, 2], [9, 1, 4, 4]] {
            assert!(ledger.evaluate(&root, a, b, &points).is_ok());
            assert!(ledger.evaluate(&root, b, a, &points).is_ok());
        }
        assert!(ledger.set_scores(&root, a, &[9, 8, 7, 6]).is_ok());
        ledger
    }

    #[test]
    fn empty_database_loads_none() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!("tempdir"));
        let store = RedbLedger::open(dir.path().join("empty.redb"));
        let loaded = store.and_then(|s| s.load());
        assert!(matches!(loaded, Ok(None)));
    }

    #[test]
    fn save_then_load_preserves_everything() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!("tempdir"));
        let path = dir.path().join("ledger.redb");
        let ledger = populated();

        let store = RedbLedger::open(&path).unwrap_or_else(|e| unreachable!("open: {e}"));
        assert_eq!(store.save(&ledger), Ok(()));
        drop(store);

        let reopened = RedbLedger::open(&path).unwrap_or_else(|e| unreachable!("reopen: {e}"));
        let loaded = reopened.load();
        let loaded = loaded.ok().flatten().unwrap_or_else(|| unreachable!("ledger saved"));
        assert_eq!(loaded.snapshot(), ledger.snapshot());
        assert_eq!(loaded.score(IdentityId(1), 3), Ok(6));
    }

    #[test]
    fn second_save_replaces_first() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!("tempdir"));
        let store = RedbLedger::open(dir.path().join("ledger.redb"))
            .unwrap_or_else(|e| unreachable!("open: {e}"));

        assert_eq!(store.save(&populated()), Ok(()));
        let fresh = Ledger::new(LedgerConfig::default()).unwrap_or_else(|_| unreachable!("valid"));
        assert_eq!(store.save(&fresh), Ok(()));

        let loaded = store.load().ok().flatten().unwrap_or_else(|| unreachable!("saved"));
        assert_eq!(loaded.status().live_identities, 0);
        assert_eq!(loaded.status().rater_skill_pairs, 0);
    }
}
