//! Binary snapshot format.
//!
//! ```text
//! +-------+---------+------------------+---------------------+
//! | magic | version | checksum (u64 LE) | postcard(snapshot)  |
//! | SKLB  |   u8    |   over payload    |                     |
//! +-------+---------+------------------+---------------------+
//! ```
//!
//! Decoding replays every point history and refuses a snapshot whose stored
//! statistics disagree with the replay.

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::identity::{AcceptAll, SoulboundRegistry};
use crate::ledger::Ledger;
use crate::primitives::SKILL_COUNT;
use crate::stats::{EvaluationStats, RaterSkillRecord};
use crate::{Holder, IdentityId, SkillIndex};
use serde::{Deserialize, Serialize};

/// File magic.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"SKLB";

/// Current snapshot version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Magic + version + checksum.
pub const HEADER_LEN: usize = 4 + 1 + 8;

/// Statistics and point history of one (rater, skill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub rater: IdentityId,
    pub skill: SkillIndex,
    pub stats: EvaluationStats,
    pub points: Vec<u8>,
}

/// Assessment history of one (subject, skill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentEntry {
    pub subject: IdentityId,
    pub skill: SkillIndex,
    pub scores: Vec<u8>,
}

/// Complete, ordered copy of a ledger's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub config: LedgerConfig,
    pub next_identity: u64,
    pub identities: Vec<(IdentityId, Holder)>,
    pub stats: Vec<StatsEntry>,
    pub assessments: Vec<AssessmentEntry>,
    pub scores: Vec<(IdentityId, [u8; SKILL_COUNT])>,
    pub occupations: Vec<(IdentityId, String)>,
    pub evaluations: u64,
}

impl Ledger<SoulboundRegistry<AcceptAll>> {
    /// Copy the full state in deterministic key order.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            config: self.config(),
            next_identity: self.registry.next_id(),
            identities: self
                .registry
                .identities()
                .map(|(id, holder)| (id, holder.clone()))
                .collect(),
            stats: self
                .stats
                .records()
                .map(|(rater, skill, record)| StatsEntry {
                    rater,
                    skill,
                    stats: record.stats(),
                    points: record.points().to_vec(),
                })
                .collect(),
            assessments: self
                .assessments
                .histories()
                .map(|(subject, skill, scores)| AssessmentEntry {
                    subject,
                    skill,
                    scores: scores.to_vec(),
                })
                .collect(),
            scores: self.scores.entries().map(|(id, s)| (id, *s)).collect(),
            occupations: self
                .occupations
                .entries()
                .map(|(id, text)| (id, text.to_string()))
                .collect(),
            evaluations: self.evaluations,
        }
    }

    /// Rebuild a ledger, validating every entry.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self> {
        let registry =
            SoulboundRegistry::restore(snapshot.identities, snapshot.next_identity, AcceptAll)?;
        let mut ledger = Ledger::with_registry(snapshot.config, registry)?;

        for entry in snapshot.stats {
            let record = RaterSkillRecord::restore(&entry.points, entry.stats)?;
            ledger.stats.import(entry.rater, entry.skill, record);
        }
        for entry in snapshot.assessments {
            ledger.assessments.import(entry.subject, entry.skill, entry.scores);
        }
        for (id, scores) in snapshot.scores {
            ledger.scores.set_scores(id, scores);
        }
        for (id, text) in snapshot.occupations {
            ledger.occupations.set_occupation(id, text);
        }
        ledger.evaluations = snapshot.evaluations;
        Ok(ledger)
    }
}

/// Encode a ledger into the binary snapshot format.
pub fn export_snapshot(ledger: &Ledger) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(&ledger.snapshot())?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SNAPSHOT_MAGIC);
    bytes.push(SNAPSHOT_VERSION);
    bytes.extend_from_slice(&checksum(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode and validate a binary snapshot.
pub fn import_snapshot(bytes: &[u8]) -> Result<Ledger> {
    if bytes.len() < HEADER_LEN {
        return Err(LedgerError::Format(format!(
            "snapshot is {} bytes, header needs {}",
            bytes.len(),
            HEADER_LEN
        )));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..4] != SNAPSHOT_MAGIC {
        return Err(LedgerError::Format("bad magic".to_string()));
    }
    if header[4] != SNAPSHOT_VERSION {
        return Err(LedgerError::Format(format!(
            "unsupported snapshot version {}",
            header[4]
        )));
    }
    let mut stored = [0u8; 8];
    stored.copy_from_slice(&header[5..HEADER_LEN]);
    if u64::from_le_bytes(stored) != checksum(payload) {
        return Err(LedgerError::Format("checksum mismatch".to_string()));
    }

    let snapshot: LedgerSnapshot = postcard::from_bytes(payload)?;
    Ledger::from_snapshot(snapshot)
}

/// Payload checksum (FNV-1a 64).
#[cfg(not(feature = "crypto-hash"))]
#[must_use]
pub fn checksum(data: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    data.iter()
        .fold(OFFSET, |hash, &byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

/// Payload checksum (first 8 bytes of BLAKE3).
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn checksum(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
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
        let b = ledger.mint(Holder::new("bob"), "chef").unwrap_or(IdentityId(0));
        for points in [[5u8, 6, 7, 8], [7, 6, 9, 2], [9, 1, 4, 4]] {
            assert!(ledger.evaluate(&root, a, b, &points).is_ok());
        }
        assert!(ledger.set_scores(&root, b, &[1, 2, 3, 4]).is_ok());
        assert!(ledger.set_catalog_base_locator(&root, "ids/").is_ok());
        ledger
    }

    #[test]
    fn export_is_deterministic() {
        let ledger = populated();
        let first = export_snapshot(&ledger);
        let second = export_snapshot(&ledger);
        assert!(first.is_ok());
        assert_eq!(first, second);
    }

    #[test]
    fn import_restores_state() {
        let ledger = populated();
        let restored = export_snapshot(&ledger).and_then(|bytes| import_snapshot(&bytes));
        let restored = restored.unwrap_or_else(|e| unreachable!("import failed: {e}"));

        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert_eq!(restored.assessment(IdentityId(2), 0), ledger.assessment(IdentityId(2), 0));
        assert_eq!(restored.stats(IdentityId(1), 2), ledger.stats(IdentityId(1), 2));
        assert_eq!(restored.base_locator(), "ids/");
        assert_eq!(restored.status(), ledger.status());
    }

    #[test]
    fn header_is_checked() {
        let bytes = export_snapshot(&populated()).unwrap_or_default();

        assert!(matches!(import_snapshot(&bytes[..3]), Err(LedgerError::Format(_))));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(import_snapshot(&bad_magic), Err(LedgerError::Format(_))));

        let mut bad_version = bytes.clone();
        bad_version[4] = 9;
        assert!(matches!(import_snapshot(&bad_version), Err(LedgerError::Format(_))));

        let mut corrupted = bytes;
        if let Some(last) = corrupted.last_mut() {
            *last ^= 0xFF;
        }
        assert_eq!(
            import_snapshot(&corrupted).map(|_| ()),
            Err(LedgerError::Format("checksum mismatch".to_string()))
        );
    }

    #[test]
    fn tampered_statistics_are_refused() {
        let mut snapshot = populated().snapshot();
        snapshot.stats[0].points.push(10);
        assert!(matches!(
            Ledger::from_snapshot(snapshot),
            Err(LedgerError::Format(_))
        ));
    }

    #[test]
    fn out_of_range_skill_is_refused() {
        // (subject, skill, scores) laid out as an AssessmentEntry
        let bytes = postcard::to_allocvec(&(2u64, 7u8, vec![50u8]))
            .unwrap_or_else(|_| unreachable!("tuple encodes"));
        assert!(postcard::from_bytes::<AssessmentEntry>(&bytes).is_err());

        let valid = postcard::to_allocvec(&(2u64, 3u8, vec![50u8]))
            .unwrap_or_else(|_| unreachable!("tuple encodes"));
        let entry = postcard::from_bytes::<AssessmentEntry>(&valid);
        assert_eq!(entry.ok().map(|e| e.skill.get()), Some(3));
    }
}
