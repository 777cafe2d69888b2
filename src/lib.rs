pub mod config;
pub mod data_loader;
pub mod engine;
pub mod logging;
pub mod model;
pub mod server;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
