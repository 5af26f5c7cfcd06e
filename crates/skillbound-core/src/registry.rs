//! # Score and Occupation Registries
//!
//! Administratively asserted values, kept apart from the crowd-derived
//! assessment history. Permission checks live in the ledger.

use crate::primitives::SKILL_COUNT;
use crate::{IdentityId, SkillIndex};
use std::collections::BTreeMap;

/// One override value per (identity, skill); last write wins.
#[derive(Debug, Clone, Default)]
pub struct ScoreRegistry {
    scores: BTreeMap<IdentityId, [u8; SKILL_COUNT]>,
}

impl ScoreRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite all four scores of an identity.
    pub fn set_scores(&mut self, id: IdentityId, scores: [u8; SKILL_COUNT]) {
        self.scores.insert(id, scores);
    }

    /// Stored override, or 0 if never set.
    #[must_use]
    pub fn score(&self, id: IdentityId, skill: SkillIndex) -> u8 {
        self.scores
            .get(&id)
            .map(|scores| scores[skill.get()])
            .unwrap_or(0)
    }

    pub fn entries(&self) -> impl Iterator<Item = (IdentityId, &[u8; SKILL_COUNT])> {
        self.scores.iter().map(|(id, scores)| (*id, scores))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Free-text occupation per identity.
#[derive(Debug, Clone, Default)]
pub struct OccupationRegistry {
    occupations: BTreeMap<IdentityId, String>,
}

impl OccupationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the occupation of an identity.
    pub fn set_occupation(&mut self, id: IdentityId, text: impl Into<String>) {
        self.occupations.insert(id, text.into());
    }

    /// Stored occupation, or the empty string.
    #[must_use]
    pub fn occupation(&self, id: IdentityId) -> &str {
        self.occupations.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn entries(&self) -> impl Iterator<Item = (IdentityId, &str)> {
        self.occupations.iter().map(|(id, text)| (*id, text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(index: usize) -> SkillIndex {
        SkillIndex::new(index).unwrap_or_else(|_| unreachable!("valid test skill"))
    }

    #[test]
    fn unset_score_is_zero() {
        let registry = ScoreRegistry::new();
        assert_eq!(registry.score(IdentityId(1), skill(2)), 0);
    }

    #[test]
    fn set_scores_overwrites_without_trace() {
        let mut registry = ScoreRegistry::new();
        registry.set_scores(IdentityId(1), [10, 20, 30, 40]);
        assert_eq!(registry.score(IdentityId(1), skill(2)), 30);

        registry.set_scores(IdentityId(1), [1, 2, 3, 4]);
        let all: Vec<u8> = SkillIndex::all()
            .map(|s| registry.score(IdentityId(1), s))
            .collect();
        assert_eq!(all, vec![1, 2, 3, 4]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn occupation_defaults_to_empty() {
        let mut registry = OccupationRegistry::new();
        assert_eq!(registry.occupation(IdentityId(1)), "");

        registry.set_occupation(IdentityId(1), "carpenter");
        registry.set_occupation(IdentityId(1), "welder");
        assert_eq!(registry.occupation(IdentityId(1)), "welder");
    }
}
