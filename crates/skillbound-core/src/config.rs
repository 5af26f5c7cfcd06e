//! # Configuration
//!
//! Initialization parameters of a ledger. Loaded from JSON by the binary;
//! the core only deals with the typed value.

use crate::catalog::{DEFAULT_SKILL_NAMES, SkillCatalog};
use crate::error::Result;
use crate::Holder;
use serde::{Deserialize, Serialize};

/// What to do when a rater's prior standard deviation is zero.
///
/// Zero deviation happens on a rater's first submission for a skill and
/// whenever every prior point for that skill was identical.
/// `Reject` is what the raw arithmetic does; `Neutral` is the default so
/// that a rater's first submission can succeed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Score the point as neutral (50).
    #[default]
    Neutral,
    /// Fail the whole batch with `DivisionByZero`.
    Reject,
}

/// What to do with a normalized score outside `[0, 255]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrowingPolicy {
    /// Keep the low 8 bits (two's complement), as the raw arithmetic does.
    #[default]
    Wrap,
    /// Saturate to `[0, MAX_NORMALIZED_SCORE]`.
    Clamp,
    /// Fail the whole batch with `NarrowingOverflow`.
    Reject,
}

/// Ledger initialization parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Account allowed to evaluate and override scores.
    pub authority: Holder,
    /// Names of the four skills, in index order.
    pub skill_names: Vec<String>,
    /// Prefix of identity locators.
    pub base_locator: String,
    pub zero_variance: ZeroVariancePolicy,
    pub narrowing: NarrowingPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            authority: Holder::new("authority"),
            skill_names: DEFAULT_SKILL_NAMES.iter().map(|s| s.to_string()).collect(),
            base_locator: String::new(),
            zero_variance: ZeroVariancePolicy::default(),
            narrowing: NarrowingPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Default configuration with the given authority.
    #[must_use]
    pub fn with_authority(authority: Holder) -> Self {
        Self {
            authority,
            ..Self::default()
        }
    }

    /// Check the configuration and build its skill catalog.
    pub fn catalog(&self) -> Result<SkillCatalog> {
        SkillCatalog::new(&self.skill_names)
    }
}
