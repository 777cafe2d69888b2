use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::talent_catalog::TalentCatalog;
use crate::engine::wealth::compute_wealth;
use crate::model::attributes::{Attribute, AttributeSet};
use crate::model::city::City;
use crate::model::talent::Talent;

pub const POINT_BUDGET: u32 = 15;
pub const ATTRIBUTE_CAP: i32 = 20;
pub const TALENT_DRAW: usize = 3;

/// Talent handed out when generation fails altogether.
pub const FALLBACK_TALENT: &str = "平平无奇";
pub const FALLBACK_STAT: i32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("no cities to choose a birthplace from")]
    EmptyPool,
    #[error("talent pool has {available} entries but {requested} were requested")]
    InsufficientPool { requested: usize, available: usize },
}

/// A freshly rolled character: attributes, talent names and birth city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub attributes: AttributeSet,
    pub talents: Vec<String>,
    pub city: String,
}

impl Allocation {
    pub fn fallback(default_city: &str) -> Self {
        Self {
            attributes: AttributeSet::uniform(FALLBACK_STAT),
            talents: vec![FALLBACK_TALENT.to_string()],
            city: default_city.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeGenerator {
    pub point_budget: u32,
    pub attribute_cap: i32,
    pub talent_count: usize,
}

impl Default for AttributeGenerator {
    fn default() -> Self {
        Self {
            point_budget: POINT_BUDGET,
            attribute_cap: ATTRIBUTE_CAP,
            talent_count: TALENT_DRAW,
        }
    }
}

impl AttributeGenerator {
    /// Hands out the point budget one point at a time to appearance,
    /// intelligence or physique, never past the cap.
    pub fn allocate_points(&self, rng: &mut impl Rng) -> AttributeSet {
        let mut attributes = AttributeSet::default();
        let mut remaining = self.point_budget;

        while remaining > 0 {
            // Drawing among open attributes == redrawing whenever a capped one comes up.
            let open: Vec<Attribute> = Attribute::ALLOCATABLE
                .into_iter()
                .filter(|attribute| attributes.get(*attribute) < self.attribute_cap)
                .collect();
            let Some(&attribute) = open.choose(rng) else {
                break;
            };
            attributes.add(attribute, 1);
            remaining -= 1;
        }

        attributes
    }

    /// Rolls a full character from the local talent pool.
    pub fn generate(
        &self,
        cities: &[City],
        catalog: &TalentCatalog,
        rng: &mut impl Rng,
    ) -> Result<Allocation, GenerationError> {
        let attributes = self.allocate_points(rng);
        let talents = catalog.sample(self.talent_count, rng)?;
        self.finish(attributes, cities, &talents, rng)
    }

    /// Rolls attributes and city, but uses talents supplied from elsewhere.
    pub fn generate_with_talents(
        &self,
        cities: &[City],
        talents: &[Talent],
        rng: &mut impl Rng,
    ) -> Result<Allocation, GenerationError> {
        let attributes = self.allocate_points(rng);
        let talents: Vec<&Talent> = talents.iter().collect();
        self.finish(attributes, cities, &talents, rng)
    }

    fn finish(
        &self,
        mut attributes: AttributeSet,
        cities: &[City],
        talents: &[&Talent],
        rng: &mut impl Rng,
    ) -> Result<Allocation, GenerationError> {
        let city = cities.choose(rng).ok_or(GenerationError::EmptyPool)?;
        attributes.wealth = compute_wealth(city, rng);

        // Effects are not clamped here; the session clamps when it stores them.
        for talent in talents {
            attributes.apply_effect(&talent.effect);
        }

        Ok(Allocation {
            attributes,
            talents: talents.iter().map(|talent| talent.name.clone()).collect(),
            city: city.city.clone(),
        })
    }
}
