//! # Skill Catalog
//!
//! The immutable ordered list of the four skills every identity is rated on.

use crate::error::{LedgerError, Result};
use crate::primitives::SKILL_COUNT;
use crate::SkillIndex;
use serde::{Deserialize, Serialize};

/// Names used when no configuration overrides them.
pub const DEFAULT_SKILL_NAMES: [&str; SKILL_COUNT] =
    ["Technical", "Communication", "Leadership", "Collaboration"];

/// One skill definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub index: SkillIndex,
    pub name: String,
}

/// Exactly four skills, indexed 0 to 3, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCatalog {
    skills: Vec<Skill>,
}

impl Default for SkillCatalog {
    fn default() -> Self {
        Self {
            skills: SkillIndex::all()
                .zip(DEFAULT_SKILL_NAMES)
                .map(|(index, name)| Skill {
                    index,
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}

impl SkillCatalog {
    /// Build a catalog from exactly four non-empty names.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.len() != SKILL_COUNT {
            return Err(LedgerError::OutOfRange(format!(
                "catalog needs {} skills, got {}",
                SKILL_COUNT,
                names.len()
            )));
        }
        let mut skills = Vec::with_capacity(SKILL_COUNT);
        for (index, name) in SkillIndex::all().zip(names) {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(LedgerError::OutOfRange(format!(
                    "skill {} has an empty name",
                    index
                )));
            }
            skills.push(Skill {
                index,
                name: name.to_string(),
            });
        }
        Ok(Self { skills })
    }

    /// Look up a skill by index.
    pub fn skill(&self, index: usize) -> Result<&Skill> {
        let index = SkillIndex::new(index)?;
        self.skills
            .get(index.get())
            .ok_or_else(|| LedgerError::OutOfRange(format!("skill index {}", index)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// All skills in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter()
    }
}
