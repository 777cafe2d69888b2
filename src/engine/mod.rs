pub mod engine;
pub mod apply_event;
pub mod attributes;

pub mod llm_client;
pub mod talent_catalog;
pub mod talent_parser;
pub mod wealth;
