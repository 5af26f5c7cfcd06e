//! # Evaluation Statistics
//!
//! Running average and standard deviation per (rater, skill), and the
//! normalization of a raw point against the rater's prior statistics.
//!
//! ## Arithmetic
//!
//! All integer, all truncating:
//!
//! ```text
//! avg'  = (avg * n + p) / (n + 1)
//! var'  = sum(|x - avg'|^2 for x in history) / (n + 1)
//! sd'   = isqrt(var')
//! score = 50 -/+ (|p - avg| * 10 / sd)
//! ```
//!
//! The average is rebuilt from the previous truncated average rather than
//! from the exact sum, so it drifts with the order of submissions. Replaying
//! a history in order always reproduces the same statistics.

use crate::arithmetic;
use crate::config::{NarrowingPolicy, ZeroVariancePolicy};
use crate::error::{LedgerError, Result};
use crate::primitives::{DEVIATION_SCALE, MAX_NORMALIZED_SCORE, NEUTRAL_SCORE};
use crate::{IdentityId, RawPoint, SkillIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// STATISTICS
// =============================================================================

/// Average and standard deviation of one rater's points for one skill.
///
/// Both are zero before the first point. They are only ever produced by
/// folding a point history; there is no setter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    average: u16,
    std_deviation: u16,
}

impl EvaluationStats {
    /// Raw values read back from storage. Only trusted after
    /// `RaterSkillRecord::restore` has compared them with a replay.
    pub(crate) fn from_stored(average: u16, std_deviation: u16) -> Self {
        Self {
            average,
            std_deviation,
        }
    }

    #[must_use]
    pub fn average(&self) -> u16 {
        self.average
    }

    #[must_use]
    pub fn std_deviation(&self) -> u16 {
        self.std_deviation
    }
}

/// Point history of one (rater, skill) and the statistics derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaterSkillRecord {
    stats: EvaluationStats,
    points: Vec<u8>,
}

impl RaterSkillRecord {
    #[must_use]
    pub fn stats(&self) -> EvaluationStats {
        self.stats
    }

    /// Raw points in submission order.
    #[must_use]
    pub fn points(&self) -> &[u8] {
        &self.points
    }

    /// Rebuild a record by folding every point in order.
    pub fn replay(points: &[u8]) -> Result<Self> {
        let mut record = Self::default();
        for &point in points {
            record = record.with_point(RawPoint::new(point)?)?;
        }
        Ok(record)
    }

    /// Rebuild a record and check it against persisted statistics.
    pub fn restore(points: &[u8], stats: EvaluationStats) -> Result<Self> {
        let record = Self::replay(points)?;
        if record.stats != stats {
            return Err(LedgerError::Format(format!(
                "stored statistics {:?} disagree with replayed {:?}",
                stats, record.stats
            )));
        }
        Ok(record)
    }

    /// The record after appending `point`. `self` is left untouched.
    pub fn with_point(&self, point: RawPoint) -> Result<Self> {
        let prior_count = self.points.len() as u64;
        let count = arithmetic::add(prior_count, 1)?;

        let prior_sum = arithmetic::mul(self.stats.average as u64, prior_count)?;
        let sum = arithmetic::add(prior_sum, point.value() as u64)?;
        let average = arithmetic::div(sum, count)?;

        let mut points = Vec::with_capacity(self.points.len() + 1);
        points.extend_from_slice(&self.points);
        points.push(point.value());

        // Full recomputation against the new average, every time
        let mut squares = 0u64;
        for &x in &points {
            let deviation = arithmetic::abs_diff(x as u64, average);
            squares = arithmetic::add(squares, arithmetic::mul(deviation, deviation)?)?;
        }
        let variance = arithmetic::div(squares, count)?;

        Ok(Self {
            stats: EvaluationStats {
                average: arithmetic::to_u16(average)?,
                std_deviation: arithmetic::to_u16(arithmetic::isqrt(variance))?,
            },
            points,
        })
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Policies applied when turning a raw point into a normalized score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    pub zero_variance: ZeroVariancePolicy,
    pub narrowing: NarrowingPolicy,
}

impl Normalizer {
    /// Score `point` against the rater's prior statistics.
    ///
    /// `rater` and `skill` only label a `DivisionByZero` failure.
    pub fn normalize(
        &self,
        prior: EvaluationStats,
        point: RawPoint,
        rater: IdentityId,
        skill: SkillIndex,
    ) -> Result<u8> {
        if prior.std_deviation == 0 {
            return match self.zero_variance {
                ZeroVariancePolicy::Neutral => Ok(NEUTRAL_SCORE),
                ZeroVariancePolicy::Reject => Err(LedgerError::DivisionByZero {
                    rater,
                    skill: skill.get(),
                }),
            };
        }

        let average = prior.average as u64;
        let raw = point.value() as u64;
        let distance = arithmetic::mul(arithmetic::abs_diff(raw, average), DEVIATION_SCALE)?;
        let delta = arithmetic::div(distance, prior.std_deviation as u64)? as i64;

        let score = if raw < average {
            NEUTRAL_SCORE as i64 - delta
        } else {
            NEUTRAL_SCORE as i64 + delta
        };
        self.narrow(score)
    }

    fn narrow(&self, score: i64) -> Result<u8> {
        match self.narrowing {
            NarrowingPolicy::Wrap => Ok(score as u8),
            NarrowingPolicy::Clamp => Ok(score.clamp(0, MAX_NORMALIZED_SCORE as i64) as u8),
            NarrowingPolicy::Reject => {
                u8::try_from(score).map_err(|_| LedgerError::NarrowingOverflow(score))
            }
        }
    }
}

// =============================================================================
// TRACKER
// =============================================================================

/// A computed but not yet applied statistics update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPoint {
    pub rater: IdentityId,
    pub skill: SkillIndex,
    /// Score computed from the rater's statistics before this point.
    pub normalized: u8,
    record: RaterSkillRecord,
}

/// Statistics for every (rater, skill) that has submitted at least one point.
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    records: BTreeMap<(IdentityId, SkillIndex), RaterSkillRecord>,
}

impl StatsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current statistics; zero when the rater has no history for the skill.
    #[must_use]
    pub fn stats(&self, rater: IdentityId, skill: SkillIndex) -> EvaluationStats {
        self.records
            .get(&(rater, skill))
            .map(RaterSkillRecord::stats)
            .unwrap_or_default()
    }

    /// Point history of a rater for a skill; empty when none.
    #[must_use]
    pub fn points(&self, rater: IdentityId, skill: SkillIndex) -> &[u8] {
        self.records
            .get(&(rater, skill))
            .map(RaterSkillRecord::points)
            .unwrap_or(&[])
    }

    /// Normalize `point` and compute the updated record without applying it.
    pub fn stage(
        &self,
        normalizer: &Normalizer,
        rater: IdentityId,
        skill: SkillIndex,
        point: RawPoint,
    ) -> Result<StagedPoint> {
        let current = self.records.get(&(rater, skill));
        let prior = current.map(RaterSkillRecord::stats).unwrap_or_default();
        let normalized = normalizer.normalize(prior, point, rater, skill)?;
        let record = match current {
            Some(record) => record.with_point(point)?,
            None => RaterSkillRecord::default().with_point(point)?,
        };
        Ok(StagedPoint {
            rater,
            skill,
            normalized,
            record,
        })
    }

    /// Apply a staged update.
    pub fn apply(&mut self, staged: StagedPoint) -> u8 {
        self.records.insert((staged.rater, staged.skill), staged.record);
        staged.normalized
    }

    /// Normalize and apply in one step. Returns the normalized score.
    pub fn record(
        &mut self,
        normalizer: &Normalizer,
        rater: IdentityId,
        skill: SkillIndex,
        point: RawPoint,
    ) -> Result<u8> {
        let staged = self.stage(normalizer, rater, skill, point)?;
        Ok(self.apply(staged))
    }

    /// All records in key order.
    pub fn records(&self) -> impl Iterator<Item = (IdentityId, SkillIndex, &RaterSkillRecord)> {
        self.records
            .iter()
            .map(|((rater, skill), record)| (*rater, *skill, record))
    }

    /// Insert a restored record.
    pub fn import(&mut self, rater: IdentityId, skill: SkillIndex, record: RaterSkillRecord) {
        self.records.insert((rater, skill), record);
    }

    /// Number of (rater, skill) pairs with history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn point(value: u8) -> RawPoint {
        RawPoint::new(value).unwrap_or_else(|_| unreachable!("valid test point"))
    }

    fn skill(index: usize) -> SkillIndex {
        SkillIndex::new(index).unwrap_or_else(|_| unreachable!("valid test skill"))
    }

    fn stats_of(points: &[u8]) -> EvaluationStats {
        RaterSkillRecord::replay(points)
            .map(|r| r.stats())
            .unwrap_or_default()
    }

    #[test]
    fn first_point_sets_average_and_zero_deviation() {
        let stats = stats_of(&[7]);
        assert_eq!(stats.average(), 7);
        assert_eq!(stats.std_deviation(), 0);
    }

    #[test]
    fn repeated_point_keeps_zero_deviation() {
        let stats = stats_of(&[4, 4, 4, 4, 4, 4]);
        assert_eq!(stats.average(), 4);
        assert_eq!(stats.std_deviation(), 0);
    }

    #[test]
    fn five_seven_nine_sequence() {
        let two = stats_of(&[5, 7]);
        assert_eq!(two.average(), 6);
        assert_eq!(two.std_deviation(), 1);

        let three = stats_of(&[5, 7, 9]);
        assert_eq!(three.average(), 7);
        // variance (4 + 0 + 4) / 3 = 2, isqrt(2) = 1
        assert_eq!(three.std_deviation(), 1);
    }

    #[test]
    fn average_reconstruction_truncates() {
        // (1 + 2) / 2 = 1, then (1 * 2 + 2) / 3 = 1; the exact mean would be 5/3
        let stats = stats_of(&[1, 2, 2]);
        assert_eq!(stats.average(), 1);
        // deviations 0, 1, 1 -> 2 / 3 = 0
        assert_eq!(stats.std_deviation(), 0);
    }

    #[test]
    fn average_depends_on_order() {
        // (5 * 2 + 10) / 3 = 6 against (10 * 2 + 1) / 3 = 7
        assert_eq!(stats_of(&[1, 10, 10]).average(), 6);
        assert_eq!(stats_of(&[10, 10, 1]).average(), 7);
    }

    #[test]
    fn replay_rejects_out_of_range_points() {
        assert!(matches!(
            RaterSkillRecord::replay(&[5, 0]),
            Err(LedgerError::OutOfRange(_))
        ));
    }

    #[test]
    fn restore_detects_mismatched_stats() {
        let good = stats_of(&[5, 7]);
        assert!(RaterSkillRecord::restore(&[5, 7], good).is_ok());
        assert!(matches!(
            RaterSkillRecord::restore(&[5, 7, 9], good),
            Err(LedgerError::Format(_))
        ));
    }

    #[test]
    fn normalize_above_and_below_average() {
        let normalizer = Normalizer::default();
        let prior = stats_of(&[5, 7]);

        let above = normalizer.normalize(prior, point(9), IdentityId(1), skill(0));
        assert_eq!(above, Ok(80));

        let below = normalizer.normalize(prior, point(4), IdentityId(1), skill(0));
        assert_eq!(below, Ok(30));

        let equal = normalizer.normalize(prior, point(6), IdentityId(1), skill(0));
        assert_eq!(equal, Ok(50));
    }

    #[test]
    fn normalize_truncates_toward_zero() {
        // prior [2, 6]: avg 4, var 4, sd 2
        let prior = stats_of(&[2, 6]);
        assert_eq!(prior.std_deviation(), 2);
        let normalizer = Normalizer::default();
        // (5 - 4) * 10 / 2 = 5
        assert_eq!(normalizer.normalize(prior, point(5), IdentityId(1), skill(0)), Ok(55));
        // (4 - 1) * 10 / 2 = 15
        assert_eq!(normalizer.normalize(prior, point(1), IdentityId(1), skill(0)), Ok(35));
    }

    #[test]
    fn zero_deviation_policies() {
        let prior = stats_of(&[5]);
        let neutral = Normalizer::default();
        assert_eq!(neutral.normalize(prior, point(9), IdentityId(1), skill(2)), Ok(50));

        let strict = Normalizer {
            zero_variance: ZeroVariancePolicy::Reject,
            ..Normalizer::default()
        };
        assert_eq!(
            strict.normalize(prior, point(9), IdentityId(1), skill(2)),
            Err(LedgerError::DivisionByZero {
                rater: IdentityId(1),
                skill: 2
            })
        );
    }

    #[test]
    fn narrowing_policies_below_zero() {
        let prior = stats_of(&[8, 10]);
        assert_eq!(prior.average(), 9);
        assert_eq!(prior.std_deviation(), 1);
        // 50 - (9 - 1) * 10 / 1 = -30
        let wrap = Normalizer::default();
        assert_eq!(wrap.normalize(prior, point(1), IdentityId(1), skill(0)), Ok(226));

        let clamp = Normalizer {
            narrowing: NarrowingPolicy::Clamp,
            ..Normalizer::default()
        };
        assert_eq!(clamp.normalize(prior, point(1), IdentityId(1), skill(0)), Ok(0));

        let reject = Normalizer {
            narrowing: NarrowingPolicy::Reject,
            ..Normalizer::default()
        };
        assert_eq!(
            reject.normalize(prior, point(1), IdentityId(1), skill(0)),
            Err(LedgerError::NarrowingOverflow(-30))
        );
    }

    #[test]
    fn clamp_caps_above_hundred() {
        // prior [1, 3]: avg 2, sd 1; 50 + (10 - 2) * 10 = 130
        let prior = stats_of(&[1, 3]);
        let clamp = Normalizer {
            narrowing: NarrowingPolicy::Clamp,
            ..Normalizer::default()
        };
        assert_eq!(clamp.normalize(prior, point(10), IdentityId(1), skill(0)), Ok(100));
        assert_eq!(
            Normalizer::default().normalize(prior, point(10), IdentityId(1), skill(0)),
            Ok(130)
        );
    }

    #[test]
    fn stage_does_not_mutate_tracker() {
        let tracker = StatsTracker::new();
        let staged = tracker.stage(&Normalizer::default(), IdentityId(1), skill(0), point(5));
        assert!(staged.is_ok());
        assert!(tracker.is_empty());
        assert_eq!(tracker.stats(IdentityId(1), skill(0)), EvaluationStats::default());
    }

    #[test]
    fn record_uses_prior_statistics() {
        let mut tracker = StatsTracker::new();
        let normalizer = Normalizer::default();
        let rater = IdentityId(1);

        let scores: Vec<_> = [5, 7, 9]
            .into_iter()
            .map(|p| tracker.record(&normalizer, rater, skill(0), point(p)))
            .collect();

        assert_eq!(scores, vec![Ok(50), Ok(50), Ok(80)]);
        assert_eq!(tracker.points(rater, skill(0)), &[5, 7, 9]);
        assert_eq!(tracker.stats(rater, skill(0)).average(), 7);
        assert_eq!(tracker.stats(rater, skill(0)).std_deviation(), 1);
        assert!(tracker.points(rater, skill(1)).is_empty());
    }
}
