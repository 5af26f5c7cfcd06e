//! # Ledger
//!
//! The evaluation state machine. Owns every table and is mutated only
//! through the operations below.
//!
//! Each operation either completes or returns an error with no change.
//! `evaluate` computes all four skill updates against the current state
//! before applying any of them, so a failure on the last skill leaves the
//! first three untouched.

use crate::assessment::AssessmentLedger;
use crate::authority::{Authority, AuthorityGate};
use crate::catalog::{Skill, SkillCatalog};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::identity::{IdentityRegistry, SoulboundRegistry};
use crate::primitives::SKILL_COUNT;
use crate::registry::{OccupationRegistry, ScoreRegistry};
use crate::stats::{EvaluationStats, Normalizer, StagedPoint, StatsTracker};
use crate::{Holder, IdentityId, RawPoint, SkillIndex};
use serde::{Deserialize, Serialize};

/// Summary counters of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatus {
    pub authority: Holder,
    pub identities_minted: u64,
    pub live_identities: u64,
    pub evaluations: u64,
    pub assessments_recorded: u64,
    pub rater_skill_pairs: u64,
    pub score_overrides: u64,
}

/// Peer-evaluation ledger over an identity registry.
#[derive(Debug, Clone)]
pub struct Ledger<R = SoulboundRegistry> {
    pub(crate) registry: R,
    pub(crate) authority: Authority,
    pub(crate) catalog: SkillCatalog,
    pub(crate) base_locator: String,
    pub(crate) normalizer: Normalizer,
    pub(crate) stats: StatsTracker,
    pub(crate) assessments: AssessmentLedger,
    pub(crate) scores: ScoreRegistry,
    pub(crate) occupations: OccupationRegistry,
    /// Completed evaluation batches.
    pub(crate) evaluations: u64,
}

impl Ledger<SoulboundRegistry> {
    /// Create an empty ledger with the default in-memory registry.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        Self::with_registry(config, SoulboundRegistry::new())
    }
}

impl<R: IdentityRegistry> Ledger<R> {
    /// Create an empty ledger over an existing registry.
    pub fn with_registry(config: LedgerConfig, registry: R) -> Result<Self> {
        let catalog = config.catalog()?;
        Ok(Self {
            registry,
            authority: Authority::new(config.authority),
            catalog,
            base_locator: config.base_locator,
            normalizer: Normalizer {
                zero_variance: config.zero_variance,
                narrowing: config.narrowing,
            },
            stats: StatsTracker::new(),
            assessments: AssessmentLedger::new(),
            scores: ScoreRegistry::new(),
            occupations: OccupationRegistry::new(),
            evaluations: 0,
        })
    }

    /// Configuration equivalent to this ledger's current settings.
    #[must_use]
    pub fn config(&self) -> LedgerConfig {
        LedgerConfig {
            authority: self.authority.holder().clone(),
            skill_names: self.catalog.iter().map(|s| s.name.clone()).collect(),
            base_locator: self.base_locator.clone(),
            zero_variance: self.normalizer.zero_variance,
            narrowing: self.normalizer.narrowing,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    // =========================================================================
    // IDENTITIES
    // =========================================================================

    /// Issue an identity to `to` and record its occupation.
    ///
    /// Open to any caller; fails if `to` already holds an identity.
    pub fn mint(&mut self, to: Holder, occupation: &str) -> Result<IdentityId> {
        let id = self.registry.mint(to)?;
        self.occupations.set_occupation(id, occupation);
        Ok(id)
    }

    /// Destroy the caller's identity. Its ledger history is kept.
    pub fn burn(&mut self, caller: &Holder, id: IdentityId) -> Result<()> {
        self.registry.burn(caller, id)
    }

    /// Identities never move; this only reports why.
    pub fn transfer(&mut self, caller: &Holder, id: IdentityId, to: &Holder) -> Result<()> {
        self.registry.transfer(caller, id, to)
    }

    pub fn owner_of(&self, id: IdentityId) -> Result<&Holder> {
        self.registry.owner_of(id)
    }

    pub fn balance_of(&self, holder: &Holder) -> u64 {
        self.registry.balance_of(holder)
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Submit one rating per skill from `rater` about `subject`.
    ///
    /// Authority only. Returns the four normalized scores appended to the
    /// subject's assessment history.
    pub fn evaluate(
        &mut self,
        caller: &Holder,
        rater: IdentityId,
        subject: IdentityId,
        points: &[u8],
    ) -> Result<[u8; SKILL_COUNT]> {
        self.authority.require_authority(caller, "evaluate")?;
        if points.len() != SKILL_COUNT {
            return Err(LedgerError::OutOfRange(format!(
                "evaluation needs {} points, got {}",
                SKILL_COUNT,
                points.len()
            )));
        }
        self.registry.require_minted(rater)?;
        self.registry.require_minted(subject)?;

        let mut staged = Vec::with_capacity(SKILL_COUNT);
        for (skill, &point) in SkillIndex::all().zip(points) {
            let point = RawPoint::new(point)?;
            staged.push(self.stats.stage(&self.normalizer, rater, skill, point)?);
        }

        let mut normalized = [0u8; SKILL_COUNT];
        for update in staged {
            let skill = update.skill;
            let score = self.stats.apply(update);
            self.assessments.record_assessment(subject, skill, score);
            normalized[skill.get()] = score;
        }
        self.evaluations = self.evaluations.saturating_add(1);
        Ok(normalized)
    }

    /// Submit a single-skill rating as the rater's own holder.
    pub fn record(
        &mut self,
        caller: &Holder,
        rater: IdentityId,
        subject: IdentityId,
        skill: usize,
        point: u8,
    ) -> Result<u8> {
        let skill = SkillIndex::new(skill)?;
        let point = RawPoint::new(point)?;
        if self.registry.owner_of(rater)? != caller {
            return Err(LedgerError::not_owner(caller, "rate as this identity"));
        }
        self.registry.require_minted(subject)?;

        let staged: StagedPoint = self.stats.stage(&self.normalizer, rater, skill, point)?;
        let score = self.stats.apply(staged);
        self.assessments.record_assessment(subject, skill, score);
        Ok(score)
    }

    /// Mean normalized score received, or 50 when never rated.
    pub fn assessment(&self, subject: IdentityId, skill: usize) -> Result<u8> {
        Ok(self.assessments.aggregate(subject, SkillIndex::new(skill)?))
    }

    /// Normalized scores received, in arrival order.
    pub fn assessment_history(&self, subject: IdentityId, skill: usize) -> Result<&[u8]> {
        Ok(self.assessments.history(subject, SkillIndex::new(skill)?))
    }

    /// A rater's current statistics for a skill.
    pub fn stats(&self, rater: IdentityId, skill: usize) -> Result<EvaluationStats> {
        Ok(self.stats.stats(rater, SkillIndex::new(skill)?))
    }

    /// Raw points a rater has submitted for a skill.
    pub fn point_history(&self, rater: IdentityId, skill: usize) -> Result<&[u8]> {
        Ok(self.stats.points(rater, SkillIndex::new(skill)?))
    }

    // =========================================================================
    // SCORE OVERRIDES AND OCCUPATIONS
    // =========================================================================

    /// Overwrite all four score overrides of an identity. Authority only.
    pub fn set_scores(&mut self, caller: &Holder, id: IdentityId, scores: &[u8]) -> Result<()> {
        self.authority.require_authority(caller, "set scores")?;
        let scores: [u8; SKILL_COUNT] = scores.try_into().map_err(|_| {
            LedgerError::OutOfRange(format!(
                "score override needs {} values, got {}",
                SKILL_COUNT,
                scores.len()
            ))
        })?;
        self.scores.set_scores(id, scores);
        Ok(())
    }

    /// Score override, or 0 if never set.
    pub fn score(&self, id: IdentityId, skill: usize) -> Result<u8> {
        Ok(self.scores.score(id, SkillIndex::new(skill)?))
    }

    /// Occupation text, or the empty string.
    #[must_use]
    pub fn occupation(&self, id: IdentityId) -> &str {
        self.occupations.occupation(id)
    }

    /// Overwrite an occupation. Only the identity's own holder may; the
    /// authority gets `NotOwner` here even though it can set other
    /// administrative values such as score overrides.
    pub fn set_occupation(&mut self, caller: &Holder, id: IdentityId, text: &str) -> Result<()> {
        if self.registry.owner_of(id)? != caller {
            return Err(LedgerError::not_owner(caller, "set occupation"));
        }
        self.occupations.set_occupation(id, text);
        Ok(())
    }

    // =========================================================================
    // CATALOG AND METADATA
    // =========================================================================

    pub fn skill(&self, index: usize) -> Result<&Skill> {
        self.catalog.skill(index)
    }

    #[must_use]
    pub fn skill_count(&self) -> usize {
        self.catalog.len()
    }

    #[must_use]
    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    /// Set the prefix of identity locators. Authority only.
    pub fn set_catalog_base_locator(&mut self, caller: &Holder, value: &str) -> Result<()> {
        self.authority.require_authority(caller, "set base locator")?;
        self.base_locator = value.to_string();
        Ok(())
    }

    #[must_use]
    pub fn base_locator(&self) -> &str {
        &self.base_locator
    }

    /// Base locator followed by the decimal id; empty when no base is set.
    pub fn identity_locator(&self, id: IdentityId) -> Result<String> {
        self.registry.require_minted(id)?;
        if self.base_locator.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}{}", self.base_locator, id))
    }

    // =========================================================================
    // AUTHORITY
    // =========================================================================

    #[must_use]
    pub fn authority(&self) -> &Holder {
        self.authority.holder()
    }

    pub fn transfer_authority(&mut self, caller: &Holder, new_holder: Holder) -> Result<()> {
        self.authority.transfer_authority(caller, new_holder)
    }

    #[must_use]
    pub fn status(&self) -> LedgerStatus {
        LedgerStatus {
            authority: self.authority.holder().clone(),
            identities_minted: self.registry.minted_count(),
            live_identities: self.registry.total_supply(),
            evaluations: self.evaluations,
            assessments_recorded: self.assessments.total_recorded() as u64,
            rater_skill_pairs: self.stats.len() as u64,
            score_overrides: self.scores.len() as u64,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
