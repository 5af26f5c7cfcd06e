//! # Assessment Ledger
//!
//! Append-only normalized scores received per (subject, skill).

use crate::arithmetic;
use crate::primitives::NEUTRAL_SCORE;
use crate::{IdentityId, SkillIndex};
use std::collections::BTreeMap;

/// Normalized score histories, keyed by subject and skill.
#[derive(Debug, Clone, Default)]
pub struct AssessmentLedger {
    histories: BTreeMap<(IdentityId, SkillIndex), Vec<u8>>,
}

impl AssessmentLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a normalized score to the subject's history.
    pub fn record_assessment(&mut self, subject: IdentityId, skill: SkillIndex, score: u8) {
        self.histories.entry((subject, skill)).or_default().push(score);
    }

    /// Truncating mean of the history, or the neutral score when empty.
    #[must_use]
    pub fn aggregate(&self, subject: IdentityId, skill: SkillIndex) -> u8 {
        arithmetic::mean_u8(self.history(subject, skill)).unwrap_or(NEUTRAL_SCORE)
    }

    /// Scores received in arrival order.
    #[must_use]
    pub fn history(&self, subject: IdentityId, skill: SkillIndex) -> &[u8] {
        self.histories
            .get(&(subject, skill))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total scores recorded across all subjects and skills.
    #[must_use]
    pub fn total_recorded(&self) -> usize {
        self.histories.values().map(Vec::len).sum()
    }

    pub fn histories(&self) -> impl Iterator<Item = (IdentityId, SkillIndex, &[u8])> {
        self.histories
            .iter()
            .map(|((subject, skill), scores)| (*subject, *skill, scores.as_slice()))
    }

    /// Replace a history wholesale when restoring from storage.
    pub fn import(&mut self, subject: IdentityId, skill: SkillIndex, scores: Vec<u8>) {
        if scores.is_empty() {
            self.histories.remove(&(subject, skill));
        } else {
            self.histories.insert((subject, skill), scores);
        }
    }
}
