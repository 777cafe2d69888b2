use log::warn;
use thiserror::Error;

use crate::model::attributes::{Attribute, Effect};
use crate::model::talent::Talent;

const EFFECT_OPEN: char = '（';
const EFFECT_CLOSE: char = '）';
const CLAUSE_SEPARATORS: [char; 2] = ['，', ','];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TalentParseError {
    #[error("talent `{0}` has no `（` before its effects")]
    MissingDelimiter(String),
    #[error("talent `{0}` has no name")]
    EmptyName(String),
}

/// Parses `"名称（属性+N）"` or `"名称（属性+N，属性-M）"` into a talent.
///
/// Clauses naming no known attribute, or with an unreadable number, are
/// dropped with a warning. Only a missing `（` (or an empty name) fails.
pub fn parse_talent(raw: &str) -> Result<Talent, TalentParseError> {
    let raw = raw.trim();
    let Some((name, rest)) = raw.split_once(EFFECT_OPEN) else {
        return Err(TalentParseError::MissingDelimiter(raw.to_string()));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(TalentParseError::EmptyName(raw.to_string()));
    }

    let body = rest.split(EFFECT_CLOSE).next().unwrap_or(rest);
    let mut effect = Effect::new();
    for clause in body.split(CLAUSE_SEPARATORS).map(str::trim) {
        if clause.is_empty() {
            continue;
        }
        let Some(attribute) = Attribute::ALL
            .into_iter()
            .find(|attribute| clause.contains(attribute.label()))
        else {
            warn!("Talent `{name}`: no known attribute in `{clause}`, skipping");
            continue;
        };

        let number: String = clause
            .replace(attribute.label(), "")
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '＋' => '+',
                '－' => '-',
                other => other,
            })
            .collect();
        match number.parse::<i32>() {
            Ok(delta) => {
                effect.insert(attribute, delta);
            }
            Err(err) => warn!("Talent `{name}`: cannot read `{number}` for {attribute}: {err}"),
        }
    }

    Ok(Talent::new(name, effect))
}
