use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::narrative_event::CharacterEffects;

/// What the client receives after an event has been applied to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    pub brief_description: String,
    pub content: String,
    pub effects: Value,
    /// Age at which the event was recorded, as text.
    pub age: String,
    pub triggers: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_effects: Option<CharacterEffects>,
}
