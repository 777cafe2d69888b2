pub mod attributes;
pub mod city;
pub mod talent;

pub mod game_state;
pub mod message;
pub mod narrative_event;
pub mod event_result;
pub mod llm_decode;
