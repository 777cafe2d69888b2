use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::city::City;

/// Outcome of the birth wealth roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WealthBucket {
    Wealthy,
    Poor,
    Normal,
    VeryPoor,
    VeryWealthy,
}

impl WealthBucket {
    pub fn delta(self) -> i32 {
        match self {
            WealthBucket::Wealthy => 5,
            WealthBucket::Poor => -3,
            WealthBucket::Normal => 0,
            WealthBucket::VeryPoor => -5,
            WealthBucket::VeryWealthy => 10,
        }
    }
}

/// Maps a roll in `[0, 1)` onto the city's buckets.
///
/// Intervals are closed-open and laid out wealthy, poor, normal, very poor;
/// whatever probability they leave uncovered is very wealthy.
pub fn bucket_for_roll(city: &City, roll: f64) -> WealthBucket {
    let ordered = [
        (city.wealthy_chance, WealthBucket::Wealthy),
        (city.poor_chance, WealthBucket::Poor),
        (city.normal_chance, WealthBucket::Normal),
        (city.very_poor_chance, WealthBucket::VeryPoor),
    ];

    let mut threshold = 0.0;
    for (chance, bucket) in ordered {
        threshold += chance;
        if roll < threshold {
            return bucket;
        }
    }
    WealthBucket::VeryWealthy
}

pub fn compute_wealth(city: &City, rng: &mut impl Rng) -> i32 {
    bucket_for_roll(city, rng.gen::<f64>()).delta()
}
