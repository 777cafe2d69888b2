use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four character traits. Serialized with the in-game label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    #[serde(rename = "颜值", alias = "appearance")]
    Appearance,
    #[serde(rename = "智力", alias = "intelligence")]
    Intelligence,
    #[serde(rename = "体质", alias = "physique", alias = "physical")]
    Physique,
    #[serde(rename = "家境", alias = "wealth")]
    Wealth,
}

/// Attribute deltas carried by a talent.
pub type Effect = BTreeMap<Attribute, i32>;

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Appearance,
        Attribute::Intelligence,
        Attribute::Physique,
        Attribute::Wealth,
    ];

    /// Attributes that receive the random point budget. Wealth comes from the city.
    pub const ALLOCATABLE: [Attribute; 3] = [
        Attribute::Appearance,
        Attribute::Intelligence,
        Attribute::Physique,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Attribute::Appearance => "颜值",
            Attribute::Intelligence => "智力",
            Attribute::Physique => "体质",
            Attribute::Wealth => "家境",
        }
    }

    /// Field name used by session state patches.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Appearance => "appearance",
            Attribute::Intelligence => "intelligence",
            Attribute::Physique => "physique",
            Attribute::Wealth => "wealth",
        }
    }

    /// Accepts the label or the field name (`physical` included).
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|attr| attr.label() == name || attr.key() == name)
            .or_else(|| (name == "physical").then_some(Attribute::Physique))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four attribute values of a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(rename = "颜值", alias = "appearance", default)]
    pub appearance: i32,
    #[serde(rename = "智力", alias = "intelligence", default)]
    pub intelligence: i32,
    #[serde(rename = "体质", alias = "physique", alias = "physical", default)]
    pub physique: i32,
    #[serde(rename = "家境", alias = "wealth", default)]
    pub wealth: i32,
}

impl AttributeSet {
    pub fn uniform(value: i32) -> Self {
        Self {
            appearance: value,
            intelligence: value,
            physique: value,
            wealth: value,
        }
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Appearance => self.appearance,
            Attribute::Intelligence => self.intelligence,
            Attribute::Physique => self.physique,
            Attribute::Wealth => self.wealth,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut i32 {
        match attribute {
            Attribute::Appearance => &mut self.appearance,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Physique => &mut self.physique,
            Attribute::Wealth => &mut self.wealth,
        }
    }

    pub fn add(&mut self, attribute: Attribute, delta: i32) {
        let value = self.get_mut(attribute);
        *value = value.saturating_add(delta);
    }

    /// Adds every delta of `effect`. No clamping.
    pub fn apply_effect(&mut self, effect: &Effect) {
        for (attribute, delta) in effect {
            self.add(*attribute, *delta);
        }
    }

    /// Sum of the point-allocated attributes (wealth excluded).
    pub fn allocated_total(&self) -> i32 {
        Attribute::ALLOCATABLE
            .into_iter()
            .map(|attribute| self.get(attribute))
            .sum()
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for attribute in Attribute::ALL {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}: {}", attribute.label(), self.get(attribute))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_labels() {
        let set = AttributeSet {
            appearance: 1,
            intelligence: 2,
            physique: 3,
            wealth: -5,
        };
        let json = serde_json::to_value(set).unwrap();
        assert_eq!(json["颜值"], 1);
        assert_eq!(json["体质"], 3);
        assert_eq!(json["家境"], -5);
    }

    #[test]
    fn deserializes_english_aliases() {
        let set: AttributeSet =
            serde_json::from_str(r#"{"appearance": 4, "physical": 7, "家境": 10}"#).unwrap();
        assert_eq!(set.appearance, 4);
        assert_eq!(set.intelligence, 0);
        assert_eq!(set.physique, 7);
        assert_eq!(set.wealth, 10);
    }

    #[test]
    fn effect_accumulates_without_clamping() {
        let mut set = AttributeSet::uniform(19);
        let mut effect = Effect::new();
        effect.insert(Attribute::Appearance, 3);
        effect.insert(Attribute::Wealth, -25);
        set.apply_effect(&effect);
        assert_eq!(set.appearance, 22);
        assert_eq!(set.wealth, -6);
    }

    #[test]
    fn parse_accepts_labels_and_keys() {
        assert_eq!(Attribute::parse("智力"), Some(Attribute::Intelligence));
        assert_eq!(Attribute::parse("physical"), Some(Attribute::Physique));
        assert_eq!(Attribute::parse("luck"), None);
    }
}
