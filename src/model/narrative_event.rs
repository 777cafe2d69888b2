use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored life event, rendered as `{age}岁：{content}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub age: u32,
    pub content: String,
}

impl EventRecord {
    pub fn render(&self) -> String {
        format!("{}岁：{}", self.age, self.content)
    }
}

/// Event proposed by the event workflow.
/// This does NOT mutate state directly; see `engine::apply_event`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    #[serde(default)]
    pub brief_description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "empty_object")]
    pub effects: Value,
    #[serde(default = "empty_object")]
    pub triggers: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_effects: Option<CharacterEffects>,
}

impl LifeEvent {
    /// Name of the character this event introduces, if any.
    pub fn character_name(&self) -> Option<&str> {
        self.character_effects
            .as_ref()?
            .character
            .as_ref()
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterEffects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterRef {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `output` object of the event workflow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventEnvelope {
    #[serde(default)]
    pub events: Vec<LifeEvent>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default() {
        let event: LifeEvent = serde_json::from_str(r#"{"content": "考上了重点高中"}"#).unwrap();
        assert_eq!(event.content, "考上了重点高中");
        assert!(event.brief_description.is_empty());
        assert_eq!(event.effects, empty_object());
        assert_eq!(event.character_name(), None);
    }

    #[test]
    fn character_name_is_read_from_effects() {
        let event: LifeEvent = serde_json::from_str(
            r#"{"content": "新同桌", "characterEffects": {"character": {"name": " 小红 ", "relation": "同学"}}}"#,
        )
        .unwrap();
        assert_eq!(event.character_name(), Some("小红"));
    }
}
