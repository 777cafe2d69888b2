use std::collections::{BTreeSet, VecDeque};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::GameConfig;
use crate::model::attributes::{Attribute, AttributeSet};
use crate::model::message::{
    split_age_tag, split_message_body, MessageRecord, DEFAULT_MESSAGE_TIME,
};
use crate::model::narrative_event::EventRecord;

pub const DEFAULT_PLAYER_NAME: &str = "新玩家";
pub const DEFAULT_SEX: &str = "男";

/// Separator between rendered history entries in a snapshot.
const HISTORY_SEPARATOR: &str = "；";

/// A full snapshot of the session sent to the workflow API.
/// Every scalar is text; this is the only place numbers become strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub name: String,
    pub sex: String,
    pub age: String,
    pub appearance: String,
    pub intelligence: String,
    #[serde(rename = "physical")]
    pub physique: String,
    pub wealth: String,
    pub city: String,
    pub character: String,
    /// Unlocked characters, sorted and comma-joined.
    pub characters: String,
    pub talents: Vec<String>,
    pub events: String,
    pub messages: String,
}

/// One play-through: the character, who they know, and what happened.
#[derive(Debug, Clone)]
pub struct GameState {
    defaults: GameConfig,

    pub name: String,
    pub sex: String,
    age: u32,
    stats: AttributeSet,
    pub city: String,

    /// Character currently being talked to; empty when none.
    pub character: String,
    characters: BTreeSet<String>,
    talents: Vec<String>,
    events: VecDeque<EventRecord>,
    messages: VecDeque<MessageRecord>,

    max_history: usize,
    max_stats: i32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let mut state = Self {
            defaults: config.clone(),
            name: DEFAULT_PLAYER_NAME.to_string(),
            sex: DEFAULT_SEX.to_string(),
            age: config.initial_age,
            stats: AttributeSet::default(),
            city: config.default_city.clone(),
            character: String::new(),
            characters: BTreeSet::new(),
            talents: Vec::new(),
            events: VecDeque::new(),
            messages: VecDeque::new(),
            max_history: config.max_history,
            max_stats: config.max_stats,
        };
        state.set_stats(AttributeSet::uniform(config.initial_stats));
        state
    }

    /// Back to construction-time defaults.
    pub fn reset(&mut self) {
        let defaults = self.defaults.clone();
        *self = Self::new(&defaults);
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub fn stat(&self, attribute: Attribute) -> i32 {
        self.stats.get(attribute)
    }

    /// Stores `value` clamped to `[0, max_stats]`.
    pub fn set_stat(&mut self, attribute: Attribute, value: i32) {
        *self.stats.get_mut(attribute) = value.min(self.max_stats).max(0);
    }

    pub fn set_stats(&mut self, stats: AttributeSet) {
        for attribute in Attribute::ALL {
            self.set_stat(attribute, stats.get(attribute));
        }
    }

    pub fn characters(&self) -> impl Iterator<Item = &str> {
        self.characters.iter().map(String::as_str)
    }

    pub fn has_character(&self, name: &str) -> bool {
        self.characters.contains(name)
    }

    pub fn add_character(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.characters.insert(name.to_string());
        }
    }

    pub fn remove_character(&mut self, name: &str) -> bool {
        self.characters.remove(name.trim())
    }

    pub fn talents(&self) -> &[String] {
        &self.talents
    }

    pub fn set_talents(&mut self, talents: Vec<String>) {
        self.talents = talents;
    }

    pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
        self.events.iter()
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageRecord> {
        self.messages.iter()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Applies a loosely typed patch field by field.
    ///
    /// Never fails: values that cannot be coerced are logged and skipped,
    /// unknown keys are ignored.
    pub fn update_state(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            match key.as_str() {
                "character" => {
                    self.character = if is_falsy(value) {
                        String::new()
                    } else {
                        value_text(value)
                    };
                }
                "characters" => self.merge_characters(value),
                "talents" => match value {
                    Value::Array(items) => {
                        self.talents = items.iter().filter_map(talent_name).collect();
                    }
                    other => warn!("Ignoring talents patch that is not a list: {other}"),
                },
                "events" => {
                    if let Value::String(text) = value {
                        self.add_event(text);
                    }
                }
                "messages" => {
                    if let Value::String(text) = value {
                        self.add_message(text);
                    }
                }
                "appearance" | "intelligence" | "physique" | "physical" | "wealth" => {
                    let Some(attribute) = Attribute::parse(key) else {
                        continue;
                    };
                    match coerce_int(value) {
                        Some(number) => self.set_stat(attribute, saturate_i32(number)),
                        None => warn!("Ignoring {key}={value}: not an integer"),
                    }
                }
                "age" => match coerce_int(value).and_then(|n| u32::try_from(n).ok()) {
                    Some(age) => self.age = age,
                    None => warn!("Ignoring age={value}: not a non-negative integer"),
                },
                "max_history" => match coerce_int(value).and_then(|n| usize::try_from(n).ok()) {
                    Some(limit) => {
                        self.max_history = limit;
                        truncate_front(&mut self.events, limit);
                        truncate_front(&mut self.messages, limit);
                    }
                    None => warn!("Ignoring max_history={value}"),
                },
                "max_stats" => match coerce_int(value) {
                    Some(limit) if limit >= 0 => {
                        self.max_stats = saturate_i32(limit);
                        let stats = self.stats;
                        self.set_stats(stats);
                    }
                    _ => warn!("Ignoring max_stats={value}"),
                },
                "name" | "sex" | "city" => {
                    if value.is_null() || value.is_array() || value.is_object() {
                        warn!("Ignoring non-scalar {key}={value}");
                        continue;
                    }
                    let text = value_text(value);
                    match key.as_str() {
                        "name" => self.name = text,
                        "sex" => self.sex = text,
                        _ => self.city = text,
                    }
                }
                _ => debug!("Ignoring unknown state field `{key}`"),
            }
        }
    }

    /// Records an event at the current age.
    ///
    /// References to the previous year are moved to the current one, then a
    /// leading `{age}岁：` is dropped.
    pub fn add_event(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let current = format!("{}岁", self.age);
        let mut content = text.to_string();
        if let Some(previous) = self.age.checked_sub(1) {
            content = content
                .replace(&format!("{previous} 岁"), &current)
                .replace(&format!("{previous}岁"), &current);
        }

        // The stored record carries the age; drop a leading tag so it renders once.
        let content = content
            .strip_prefix(current.as_str())
            .and_then(|rest| rest.strip_prefix(['：', ':']))
            .unwrap_or(&content)
            .trim();
        if content.is_empty() {
            return;
        }

        let record = EventRecord {
            age: self.age,
            content: content.to_string(),
        };
        push_bounded(&mut self.events, record, self.max_history);
    }

    /// Records a chat message, normalising it to
    /// `{age}岁 {sender}: [{content}] [{time}]`.
    pub fn add_message(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let record = if let Some((tagged_age, body)) = split_age_tag(text) {
            let parts = split_message_body(body);
            MessageRecord {
                age: self.current_if_stale(tagged_age),
                sender: parts.sender,
                content: parts.content,
                time: parts.time,
            }
        } else {
            let parts = split_message_body(text);
            let time = if parts.bracketed {
                parts.time
            } else {
                Some(DEFAULT_MESSAGE_TIME.to_string())
            };
            MessageRecord {
                age: self.age,
                sender: parts.sender,
                content: parts.content,
                time,
            }
        };

        if record.content.is_empty() {
            return;
        }
        push_bounded(&mut self.messages, record, self.max_history);
    }

    /// Records an already structured chat line at the current age.
    pub fn record_message(&mut self, sender: &str, content: &str, time: Option<&str>) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        let record = MessageRecord {
            age: self.age,
            sender: sender.trim().to_string(),
            content: content.to_string(),
            time: Some(
                time.map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(DEFAULT_MESSAGE_TIME)
                    .to_string(),
            ),
        };
        push_bounded(&mut self.messages, record, self.max_history);
    }

    pub fn get_parameters(&self) -> ParameterSnapshot {
        let events = self
            .events
            .iter()
            .filter(|event| !event.content.trim().is_empty())
            .map(EventRecord::render)
            .collect::<Vec<_>>()
            .join(HISTORY_SEPARATOR);
        let messages = self
            .messages
            .iter()
            .filter(|message| !message.content.trim().is_empty())
            .map(MessageRecord::render)
            .collect::<Vec<_>>()
            .join(HISTORY_SEPARATOR);

        ParameterSnapshot {
            name: self.name.clone(),
            sex: self.sex.clone(),
            age: self.age.to_string(),
            appearance: self.stats.appearance.to_string(),
            intelligence: self.stats.intelligence.to_string(),
            physique: self.stats.physique.to_string(),
            wealth: self.stats.wealth.to_string(),
            city: self.city.clone(),
            character: self.character.clone(),
            characters: self.characters.iter().cloned().collect::<Vec<_>>().join(","),
            talents: self.talents.clone(),
            events,
            messages,
        }
    }

    fn merge_characters(&mut self, value: &Value) {
        match value {
            Value::String(list) => {
                for name in list.split(',') {
                    self.add_character(name);
                }
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(name) => self.add_character(name),
                        Value::Object(_) => self.merge_characters(item),
                        other => warn!("Ignoring character entry {other}"),
                    }
                }
            }
            Value::Object(record) => {
                if let Some(name) = record.get("name").and_then(Value::as_str) {
                    self.add_character(name);
                }
            }
            Value::Null => {}
            other => warn!("Ignoring characters patch {other}"),
        }
    }

    /// A tag one year behind comes from a late response and belongs to now.
    fn current_if_stale(&self, tagged_age: u32) -> u32 {
        if tagged_age.checked_add(1) == Some(self.age) {
            self.age
        } else {
            tagged_age
        }
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, item: T, limit: usize) {
    history.push_back(item);
    truncate_front(history, limit);
}

fn truncate_front<T>(history: &mut VecDeque<T>, limit: usize) {
    while history.len() > limit {
        history.pop_front();
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn talent_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Object(record) => record.get("name").and_then(Value::as_str).map(String::from),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(fields) => fields,
            other => panic!("patch must be an object, got {other}"),
        }
    }

    #[test]
    fn new_state_uses_config_defaults() {
        let state = GameState::default();
        let params = state.get_parameters();
        assert_eq!(params.name, "新玩家");
        assert_eq!(params.sex, "男");
        assert_eq!(params.age, "14");
        assert_eq!(params.appearance, "10");
        assert_eq!(params.physique, "10");
        assert_eq!(params.city, "北京");
        assert_eq!(params.characters, "");
        assert!(params.talents.is_empty());
        assert_eq!(params.events, "");
        assert_eq!(params.messages, "");
    }

    #[test]
    fn reset_restores_default_snapshot() {
        let config = GameConfig {
            initial_age: 18,
            ..GameConfig::default()
        };
        let mut state = GameState::new(&config);
        let fresh = state.get_parameters();

        state.update_state(&patch(json!({
            "name": "小李", "age": 30, "appearance": 3, "characters": "小红,小明",
            "talents": ["过目不忘"], "character": "小红", "max_history": 2
        })));
        state.add_event("搬家了");
        state.add_message("小红: 你好");
        assert_ne!(state.get_parameters(), fresh);

        state.reset();
        assert_eq!(state.get_parameters(), fresh);
        assert_eq!(state.max_history(), 30);
    }

    #[test]
    fn stats_are_clamped() {
        let mut state = GameState::default();
        state.update_state(&patch(json!({ "appearance": "25", "wealth": -3 })));
        assert_eq!(state.get_parameters().appearance, "20");
        assert_eq!(state.stat(Attribute::Wealth), 0);
    }

    #[test]
    fn bad_stat_values_are_ignored() {
        let mut state = GameState::default();
        state.update_state(&patch(json!({ "appearance": "abc", "intelligence": [1] })));
        assert_eq!(state.stat(Attribute::Appearance), 10);
        assert_eq!(state.stat(Attribute::Intelligence), 10);
    }

    #[test]
    fn physical_is_an_alias_for_physique() {
        let mut state = GameState::default();
        state.update_state(&patch(json!({ "physical": "7", "physique": 8.9 })));
        assert_eq!(state.stat(Attribute::Physique), 8);
    }

    #[test]
    fn character_falsy_values_clear_it() {
        let mut state = GameState::default();
        state.update_state(&patch(json!({ "character": "小红" })));
        assert_eq!(state.character, "小红");
        state.update_state(&patch(json!({ "character": null })));
        assert_eq!(state.character, "");
        state.update_state(&patch(json!({ "character": 42 })));
        assert_eq!(state.character, "42");
    }

    #[test]
    fn characters_merge_from_every_shape() {
        let mut state = GameState::default();
        state.update_state(&patch(json!({ "characters": " 小红, ,小明 " })));
        state.update_state(&patch(json!({ "characters": ["小明", "王老师"] })));
        state.update_state(&patch(json!({ "characters": { "name": "妈妈", "relation": "家人" } })));

        let names: Vec<_> = state.characters().collect();
        assert_eq!(names.len(), 4);
        let mut expected = vec!["小红", "小明", "王老师", "妈妈"];
        expected.sort();
        assert_eq!(names, expected);
        assert_eq!(state.get_parameters().characters, expected.join(","));
    }

    #[test]
    fn talents_are_replaced_not_merged() {
        let mut state = GameState::default();
        state.update_state(&patch(json!({ "talents": ["过目不忘", "富贵命"] })));
        state.update_state(&patch(json!({ "talents": [{ "name": "天生丽质", "effect": {} }] })));
        assert_eq!(state.talents(), ["天生丽质"]);

        state.update_state(&patch(json!({ "talents": "not a list" })));
        assert_eq!(state.talents(), ["天生丽质"]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut state = GameState::default();
        let before = state.get_parameters();
        state.update_state(&patch(json!({ "mood": "happy", "events": 3 })));
        assert_eq!(state.get_parameters(), before);
    }

    #[test]
    fn event_history_keeps_the_last_entries_in_order() {
        let mut state = GameState::default();
        for i in 0..35 {
            state.add_event(&format!("事件{i}"));
        }
        let contents: Vec<_> = state.events().map(|e| e.content.clone()).collect();
        assert_eq!(contents.len(), 30);
        assert_eq!(contents.first().map(String::as_str), Some("事件5"));
        assert_eq!(contents.last().map(String::as_str), Some("事件34"));
    }

    #[test]
    fn message_history_is_bounded() {
        let mut state = GameState::default();
        for i in 0..35 {
            state.add_message(&format!("小红: 第{i}条"));
        }
        assert_eq!(state.messages().count(), 30);
        assert_eq!(state.messages().next().map(|m| m.content.as_str()), Some("第5条"));
    }

    #[test]
    fn event_prefix_is_stripped_and_stale_age_rewritten() {
        let mut state = GameState::default();
        state.add_event("14岁：13岁的时候认识了小红，13 岁那年很开心");
        let event = state.events().next().unwrap();
        assert_eq!(event.age, 14);
        assert_eq!(event.content, "14岁的时候认识了小红，14岁那年很开心");
        assert_eq!(state.get_parameters().events, "14岁：14岁的时候认识了小红，14岁那年很开心");
    }

    #[test]
    fn stale_event_tag_renders_once() {
        let mut state = GameState::default();
        state.add_event("13岁：上了初中");
        state.add_event("13 岁：加入了篮球队");
        state.add_event("14岁:期中考试");
        assert_eq!(
            state.get_parameters().events,
            "14岁：上了初中；14岁：加入了篮球队；14岁：期中考试"
        );
    }

    #[test]
    fn tagged_message_without_brackets_is_bracketed() {
        let mut state = GameState::default();
        state.add_message("14岁 小红: 你好");
        let message = state.messages().next().unwrap();
        assert_eq!(message.content, "你好");
        assert_eq!(message.time, None);
        assert_eq!(state.get_parameters().messages, "14岁 小红: [你好]");
    }

    #[test]
    fn blank_event_and_message_are_no_ops() {
        let mut state = GameState::default();
        state.add_event("   ");
        state.add_event("14岁：");
        state.add_message("");
        assert_eq!(state.events().count(), 0);
        assert_eq!(state.messages().count(), 0);
    }

    #[test]
    fn events_join_with_full_width_semicolon() {
        let mut state = GameState::default();
        state.add_event("上初中");
        state.set_age(15);
        state.add_event("参加运动会");
        assert_eq!(state.get_parameters().events, "14岁：上初中；15岁：参加运动会");
    }

    #[test]
    fn plain_message_gets_brackets_and_default_time() {
        let mut state = GameState::default();
        state.add_message("小红: 明天见");
        assert_eq!(state.get_parameters().messages, "14岁 小红: [明天见] [当天]");
    }

    #[test]
    fn bracketed_message_only_gets_the_age() {
        let mut state = GameState::default();
        state.add_message("妈妈: [早点回家]");
        state.add_message("爸爸: [周末去钓鱼] [周五]");
        assert_eq!(
            state.get_parameters().messages,
            "14岁 妈妈: [早点回家]；14岁 爸爸: [周末去钓鱼] [周五]"
        );
    }

    #[test]
    fn age_prefixed_message_passes_through() {
        let mut state = GameState::default();
        state.add_message("14岁 小明: [借我作业] [上午]");
        state.add_message("13岁 小红: [生日快乐]");
        state.add_message("10岁 王老师: [好好学习]");
        let ages: Vec<_> = state.messages().map(|m| m.age).collect();
        assert_eq!(ages, vec![14, 14, 10]);
        assert_eq!(
            state.messages().next().unwrap().render(),
            "14岁 小明: [借我作业] [上午]"
        );
    }

    #[test]
    fn shrinking_max_history_truncates_oldest() {
        let mut state = GameState::default();
        for i in 0..5 {
            state.add_event(&format!("事件{i}"));
        }
        state.update_state(&patch(json!({ "max_history": "2" })));
        let contents: Vec<_> = state.events().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["事件3", "事件4"]);
    }

    #[test]
    fn events_patch_goes_through_add_event() {
        let mut state = GameState::default();
        state.update_state(&patch(json!({ "events": "14岁：转学", "messages": "小红: 再见" })));
        assert_eq!(state.get_parameters().events, "14岁：转学");
        assert_eq!(state.get_parameters().messages, "14岁 小红: [再见] [当天]");
    }

    #[test]
    fn snapshot_serializes_physical_key() {
        let json = serde_json::to_value(GameState::default().get_parameters()).unwrap();
        assert_eq!(json["physical"], "10");
        assert!(json.get("physique").is_none());
        assert!(json["talents"].is_array());
    }

    #[test]
    fn remove_character_reports_presence() {
        let mut state = GameState::default();
        state.add_character("小红");
        assert!(state.has_character("小红"));
        assert!(state.remove_character("小红"));
        assert!(!state.remove_character("小红"));
    }
}
