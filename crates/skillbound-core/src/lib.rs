//! # Skillbound Core
//!
//! Deterministic peer-evaluation ledger for non-transferable identities.
//!
//! Holders of an identity rate one another from 1 to 10 across four fixed
//! skills. Each raw point is normalized against the rater's own history
//! (50 = the rater's average) and accumulated against the rated subject.
//!
//! ## Constraints
//!
//! - No floating point: every statistic is integer arithmetic with truncation.
//! - `BTreeMap` only, for deterministic iteration and export.
//! - Every state-changing operation is all-or-nothing.
//!
//! ## Layout
//!
//! - [`arithmetic`]: checked and truncating integer primitives
//! - [`catalog`]: the immutable four-skill catalog
//! - [`stats`]: per (rater, skill) running statistics and normalization
//! - [`assessment`]: per (subject, skill) normalized score history
//! - [`registry`]: score overrides and occupations
//! - [`identity`] / [`authority`]: collaborator traits and defaults
//! - [`ledger`]: the orchestrating state machine
//! - [`formats`] / [`storage`]: snapshot bytes and the redb store

pub mod arithmetic;
pub mod assessment;
pub mod authority;
pub mod catalog;
pub mod config;
pub mod error;
pub mod formats;
pub mod identity;
pub mod ledger;
pub mod primitives;
pub mod registry;
pub mod stats;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use authority::{Authority, AuthorityGate};
pub use catalog::{Skill, SkillCatalog};
pub use config::{LedgerConfig, NarrowingPolicy, ZeroVariancePolicy};
pub use error::{LedgerError, Result};
pub use identity::{AcceptAll, IdentityRegistry, ReceiverPolicy, SoulboundRegistry};
pub use ledger::{Ledger, LedgerStatus};
pub use stats::EvaluationStats;

// =============================================================================
// CORE TYPES
// =============================================================================

/// Opaque handle of one registered identity.
///
/// Issued by the identity registry; the ledger only uses it as a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityId(pub u64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account able to hold at most one identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Holder(String);

impl Holder {
    /// Create a holder from an account name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the account name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raw rating in `[MIN_POINT, MAX_POINT]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct RawPoint(u8);

impl RawPoint {
    /// Validate a raw rating.
    pub fn new(value: u8) -> Result<Self> {
        if (primitives::MIN_POINT..=primitives::MAX_POINT).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LedgerError::OutOfRange(format!(
                "raw point {} not in [{}, {}]",
                value,
                primitives::MIN_POINT,
                primitives::MAX_POINT
            )))
        }
    }

    /// Get the rating value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RawPoint {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

/// Index into the skill catalog, always below `SKILL_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct SkillIndex(u8);

impl SkillIndex {
    /// Validate a skill index.
    pub fn new(index: usize) -> Result<Self> {
        if index < primitives::SKILL_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(LedgerError::OutOfRange(format!(
                "skill index {} not below {}",
                index,
                primitives::SKILL_COUNT
            )))
        }
    }

    /// All skill indexes in catalog order.
    pub fn all() -> impl Iterator<Item = SkillIndex> {
        (0..primitives::SKILL_COUNT as u8).map(SkillIndex)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for SkillIndex {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value as usize)
    }
}

impl fmt::Display for SkillIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
