use log::{error, info, warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::engine::apply_event::{apply_chat_threads, apply_context, apply_life_event};
use crate::engine::attributes::{Allocation, AttributeGenerator};
use crate::engine::llm_client::{WorkflowClient, WorkflowError};
use crate::engine::talent_catalog::TalentCatalog;
use crate::engine::talent_parser::parse_talent;
use crate::model::city::City;
use crate::model::event_result::EventReport;
use crate::model::game_state::{GameState, ParameterSnapshot};
use crate::model::message::ChatThread;
use crate::model::talent::Talent;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("workflow API is not configured")]
    WorkflowsDisabled,
    #[error("a non-empty context is required")]
    MissingContext,
    #[error("the event workflow returned no events")]
    NoEvent,
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Shared game logic: reference data, the generator and the optional
/// workflow client. Sessions are passed in by the caller.
#[derive(Debug)]
pub struct Engine {
    cities: Vec<City>,
    catalog: TalentCatalog,
    generator: AttributeGenerator,
    workflows: Option<WorkflowClient>,
    use_ai_talents: bool,
    default_city: String,
}

impl Engine {
    pub fn new(cities: Vec<City>, catalog: TalentCatalog, default_city: impl Into<String>) -> Self {
        Self {
            cities,
            catalog,
            generator: AttributeGenerator::default(),
            workflows: None,
            use_ai_talents: false,
            default_city: default_city.into(),
        }
    }

    pub fn with_workflows(mut self, client: WorkflowClient, use_ai_talents: bool) -> Self {
        self.workflows = Some(client);
        self.use_ai_talents = use_ai_talents;
        self
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn workflows_enabled(&self) -> bool {
        self.workflows.is_some()
    }

    /// Rolls a character from local data, or hands out the fixed default.
    pub fn local_allocation(&self) -> Allocation {
        let mut rng = rand::thread_rng();
        match self.generator.generate(&self.cities, &self.catalog, &mut rng) {
            Ok(allocation) => allocation,
            Err(err) => {
                error!("Local generation failed, using default allocation: {err}");
                Allocation::fallback(&self.default_city)
            }
        }
    }

    /// Rolls a character, asking the talent workflow for talents when enabled.
    pub async fn random_allocate(&self, parameters: &ParameterSnapshot) -> Allocation {
        let client = match &self.workflows {
            Some(client) if self.use_ai_talents => client,
            _ => return self.local_allocation(),
        };

        match client.random_talents(parameters).await {
            Ok(raw) => self.allocate_with_talents(&raw),
            Err(err) => {
                warn!("AI talents unavailable, falling back to local generation: {err}");
                self.local_allocation()
            }
        }
    }

    fn allocate_with_talents(&self, raw: &[String]) -> Allocation {
        let talents: Vec<Talent> = raw
            .iter()
            .filter_map(|text| {
                parse_talent(text)
                    .inspect_err(|err| warn!("Dropping talent: {err}"))
                    .ok()
            })
            .collect();
        if talents.is_empty() {
            warn!("No usable AI talents in {raw:?}, falling back to local generation");
            return self.local_allocation();
        }

        let mut rng = rand::thread_rng();
        match self.generator.generate_with_talents(&self.cities, &talents, &mut rng) {
            Ok(allocation) => allocation,
            Err(err) => {
                error!("Generation with AI talents failed: {err}");
                self.local_allocation()
            }
        }
    }

    /// Applies the context, asks the event workflow for the next event and
    /// records it.
    pub async fn generate_event(
        &self,
        state: &mut GameState,
        context: &Map<String, Value>,
    ) -> Result<EventReport, EngineError> {
        if context.is_empty() {
            return Err(EngineError::MissingContext);
        }
        let client = self.workflows.as_ref().ok_or(EngineError::WorkflowsDisabled)?;

        apply_context(state, context);
        let event = client
            .next_event(&state.get_parameters())
            .await?
            .ok_or(EngineError::NoEvent)?;

        let report = apply_life_event(state, event);
        info!("Recorded event at age {}: {}", report.age, report.brief_description);
        Ok(report)
    }

    /// Applies the context and pulls new chat messages. Failures yield an
    /// empty list.
    pub async fn fetch_messages(
        &self,
        state: &mut GameState,
        context: &Map<String, Value>,
    ) -> Vec<ChatThread> {
        if context.is_empty() {
            return Vec::new();
        }
        let Some(client) = &self.workflows else {
            warn!("Chat messages requested but the workflow API is not configured");
            return Vec::new();
        };

        apply_context(state, context);
        match client.chat_messages(&state.get_parameters()).await {
            Ok(threads) => {
                let stored = apply_chat_threads(state, &threads);
                info!("Got {} chat threads, {stored} lines", threads.len());
                threads
            }
            Err(err) => {
                error!("Error getting messages: {err}");
                Vec::new()
            }
        }
    }

    /// Stores a chosen allocation in the session and returns the summary line.
    pub fn start_new_life(&self, state: &mut GameState, allocation: Allocation) -> String {
        let message = format!(
            "开始新人生，分配结果：{}, 城市: {}, 天赋: {}",
            allocation.attributes,
            allocation.city,
            allocation.talents.join(", ")
        );

        state.city = allocation.city;
        state.set_stats(allocation.attributes);
        state.set_talents(allocation.talents);
        info!("{message}");
        message
    }
}
