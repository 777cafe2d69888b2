use serde::{Deserialize, Serialize};

use crate::model::attributes::Effect;

/// A named modifier applied to the attributes once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talent {
    pub name: String,
    #[serde(default)]
    pub effect: Effect,
}

impl Talent {
    pub fn new(name: impl Into<String>, effect: Effect) -> Self {
        Self {
            name: name.into(),
            effect,
        }
    }
}
