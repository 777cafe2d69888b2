use std::net::SocketAddr;

use anyhow::Context;
use log::{info, warn};

use life_sim::config::AppConfig;
use life_sim::data_loader::{load_cities, load_talents};
use life_sim::engine::engine::Engine;
use life_sim::engine::llm_client::WorkflowClient;
use life_sim::engine::talent_catalog::TalentCatalog;
use life_sim::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    life_sim::logging::init(&config.server.log_level)?;
    info!("life_sim {} starting", life_sim::VERSION);

    let cities = load_cities(&config.data.city_data_path)?;
    let talents = load_talents(&config.data.talents_data_path)?;
    info!("Loaded {} cities and {} talents", cities.len(), talents.len());

    let mut engine = Engine::new(cities, TalentCatalog::new(talents), &config.game.default_city);
    match WorkflowClient::from_config(&config.workflow) {
        Ok(client) => engine = engine.with_workflows(client, config.workflow.use_ai_talents),
        Err(err) => warn!("Workflow client unavailable: {err}"),
    }
    if engine.workflows_enabled() {
        info!(
            "Workflow API enabled at {} (AI talents: {})",
            config.workflow.base_url, config.workflow.use_ai_talents
        );
    } else {
        info!("Running with local generation only");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    server::serve(addr, AppState::new(engine, config.game)).await?;
    Ok(())
}
