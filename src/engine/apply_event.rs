use log::{debug, info};
use serde_json::{Map, Value};

use crate::model::attributes::Attribute;
use crate::model::event_result::EventReport;
use crate::model::game_state::GameState;
use crate::model::message::ChatThread;
use crate::model::narrative_event::LifeEvent;

/// Folds a client-supplied context into the session before a workflow call.
///
/// An `attributes` object keyed by the Chinese attribute names is spread onto
/// the stat fields, and a character named in `characterEffects` is unlocked.
pub fn apply_context(state: &mut GameState, context: &Map<String, Value>) {
    let mut patch = context.clone();

    if let Some(Value::Object(attributes)) = context.get("attributes") {
        for attribute in Attribute::ALL {
            if let Some(value) = attributes.get(attribute.label()) {
                patch.insert(attribute.key().to_string(), value.clone());
            }
        }
    }

    state.update_state(&patch);

    if let Some(name) = context
        .get("characterEffects")
        .and_then(|effects| effects.get("character"))
        .and_then(|character| character.get("name"))
        .and_then(Value::as_str)
    {
        state.add_character(name);
    }
}

/// Records a workflow event in the session and builds the client report.
///
/// The report carries the age the event was recorded at.
pub fn apply_life_event(state: &mut GameState, event: LifeEvent) -> EventReport {
    if let Some(name) = event.character_name() {
        info!("Event introduces character {name}");
        state.add_character(name);
    }
    if !event.content.trim().is_empty() {
        state.add_event(&event.content);
    }

    EventReport {
        brief_description: event.brief_description,
        content: event.content,
        effects: event.effects,
        age: state.age().to_string(),
        triggers: event.triggers,
        character_effects: event.character_effects,
    }
}

/// Stores every line of every thread as a message; returns how many were stored.
pub fn apply_chat_threads(state: &mut GameState, threads: &[ChatThread]) -> usize {
    let mut stored = 0;
    for thread in threads {
        for line in &thread.message_chain {
            if line.text.trim().is_empty() {
                continue;
            }
            state.record_message(&thread.from_character, &line.text, line.time.as_deref());
            stored += 1;
        }
    }
    debug!("Stored {stored} chat lines from {} threads", threads.len());
    stored
}
