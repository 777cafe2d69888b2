use std::fmt;
use std::time::Duration;

use log::{debug, error, info};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::WorkflowConfig;
use crate::model::game_state::ParameterSnapshot;
use crate::model::llm_decode::{decode_event, decode_messages, decode_talents, DecodeError};
use crate::model::message::ChatThread;
use crate::model::narrative_event::LifeEvent;

/// Log target for everything that crosses the workflow API boundary.
const API_LOG: &str = "api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Talent,
    Event,
    Wechat,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Workflow::Talent => "talent",
            Workflow::Event => "event",
            Workflow::Wechat => "wechat",
        })
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow client is not configured (missing {})", .0.join(", "))]
    NotConfigured(Vec<&'static str>),
    #[error("workflow request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("workflow returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Serialize)]
struct WorkflowRunRequest<'a> {
    workflow_id: &'a str,
    parameters: &'a ParameterSnapshot,
}

/// Client for the Coze workflow API. Every call sends the session snapshot
/// as the workflow parameters.
#[derive(Debug, Clone)]
pub struct WorkflowClient {
    http: Client,
    base_url: String,
    token: String,
    talent_workflow_id: String,
    event_workflow_id: String,
    wechat_workflow_id: String,
}

impl WorkflowClient {
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            return Err(WorkflowError::NotConfigured(missing));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone().unwrap_or_default(),
            talent_workflow_id: config.talent_workflow_id.clone().unwrap_or_default(),
            event_workflow_id: config.event_workflow_id.clone().unwrap_or_default(),
            wechat_workflow_id: config.wechat_workflow_id.clone().unwrap_or_default(),
        })
    }

    fn workflow_id(&self, workflow: Workflow) -> &str {
        match workflow {
            Workflow::Talent => &self.talent_workflow_id,
            Workflow::Event => &self.event_workflow_id,
            Workflow::Wechat => &self.wechat_workflow_id,
        }
    }

    /// Runs one workflow and returns the raw response body.
    pub async fn run(
        &self,
        workflow: Workflow,
        parameters: &ParameterSnapshot,
    ) -> Result<Value, WorkflowError> {
        let url = format!("{}/v1/workflow/run", self.base_url);
        let request = WorkflowRunRequest {
            workflow_id: self.workflow_id(workflow),
            parameters,
        };

        info!(target: API_LOG, "Running {workflow} workflow via {url}");
        if log::log_enabled!(target: API_LOG, log::Level::Debug) {
            if let Ok(body) = serde_json::to_string(&request) {
                debug!(target: API_LOG, "Request data: {body}");
            }
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                error!(target: API_LOG, "{workflow} workflow request failed: {err}");
                WorkflowError::Http(err)
            })?;

        let status = response.status();
        info!(target: API_LOG, "Response status: {status}");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(target: API_LOG, "{workflow} workflow returned {status}: {body}");
            return Err(WorkflowError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        debug!(target: API_LOG, "Response content: {body}");
        Ok(body)
    }

    pub async fn random_talents(
        &self,
        parameters: &ParameterSnapshot,
    ) -> Result<Vec<String>, WorkflowError> {
        let response = self.run(Workflow::Talent, parameters).await?;
        let talents = decode_talents(response).inspect_err(|err| {
            error!(target: API_LOG, "Cannot decode talents: {err}");
        })?;
        info!(target: API_LOG, "Got {} talents", talents.len());
        Ok(talents)
    }

    pub async fn next_event(
        &self,
        parameters: &ParameterSnapshot,
    ) -> Result<Option<LifeEvent>, WorkflowError> {
        let response = self.run(Workflow::Event, parameters).await?;
        decode_event(response)
            .inspect_err(|err| error!(target: API_LOG, "Cannot decode event: {err}"))
            .map_err(WorkflowError::from)
    }

    pub async fn chat_messages(
        &self,
        parameters: &ParameterSnapshot,
    ) -> Result<Vec<ChatThread>, WorkflowError> {
        let response = self.run(Workflow::Wechat, parameters).await?;
        decode_messages(response)
            .inspect_err(|err| error!(target: API_LOG, "Cannot decode messages: {err}"))
            .map_err(WorkflowError::from)
    }
}
