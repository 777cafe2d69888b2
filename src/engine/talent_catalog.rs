use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::attributes::GenerationError;
use crate::model::talent::Talent;

/// Fixed pool of talents, loaded once.
#[derive(Debug, Clone, Default)]
pub struct TalentCatalog {
    talents: Vec<Talent>,
}

impl TalentCatalog {
    pub fn new(talents: Vec<Talent>) -> Self {
        Self { talents }
    }

    pub fn all(&self) -> &[Talent] {
        &self.talents
    }

    pub fn len(&self) -> usize {
        self.talents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.talents.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Talent> {
        self.talents.iter().find(|talent| talent.name == name)
    }

    /// Draws `count` distinct talents, uniformly and without replacement.
    pub fn sample(&self, count: usize, rng: &mut impl Rng) -> Result<Vec<&Talent>, GenerationError> {
        if count > self.talents.len() {
            return Err(GenerationError::InsufficientPool {
                requested: count,
                available: self.talents.len(),
            });
        }
        Ok(self.talents.choose_multiple(rng, count).collect())
    }
}
