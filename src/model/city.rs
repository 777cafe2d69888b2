use serde::{Deserialize, Serialize};

/// Birth city with its wealth distribution.
///
/// The aliases are the column headers of the original city spreadsheet, so an
/// export keyed by them loads unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(alias = "城市名称")]
    pub city: String,
    #[serde(alias = "出现土豪几率")]
    pub wealthy_chance: f64,
    #[serde(alias = "出现穷鬼几率")]
    pub poor_chance: f64,
    #[serde(alias = "正常几率")]
    pub normal_chance: f64,
    #[serde(alias = "特别穷几率")]
    pub very_poor_chance: f64,
    /// Informational only: the wealth roll gives whatever the first four leave over.
    #[serde(alias = "特别富贵的几率", default)]
    pub very_wealthy_chance: f64,
}

impl City {
    /// Chances in bucket order: wealthy, poor, normal, very poor, very wealthy.
    pub fn new(name: impl Into<String>, chances: [f64; 5]) -> Self {
        let [wealthy, poor, normal, very_poor, very_wealthy] = chances;
        Self {
            city: name.into(),
            wealthy_chance: wealthy,
            poor_chance: poor,
            normal_chance: normal,
            very_poor_chance: very_poor,
            very_wealthy_chance: very_wealthy,
        }
    }
}
