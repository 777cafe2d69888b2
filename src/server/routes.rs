use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::engine::attributes::Allocation;
use crate::model::city::City;
use crate::model::event_result::EventReport;
use crate::model::game_state::ParameterSnapshot;
use crate::server::error::HttpApiError;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub parameters: ParameterSnapshot,
}

#[derive(Debug, Serialize)]
pub struct NewLifeResponse {
    pub message: String,
    pub parameters: ParameterSnapshot,
}

/// Body of the event and message endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ContextRequest {
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_cities(State(state): State<AppState>) -> Json<Vec<City>> {
    Json(state.engine.cities().to_vec())
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let (id, session) = state.create_session().await;
    let parameters = session.lock().await.get_parameters();
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: id.to_string(),
            parameters,
        }),
    )
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, HttpApiError> {
    state.remove_session(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ParameterSnapshot>, HttpApiError> {
    let session = state.session(&session_id).await?;
    let parameters = session.lock().await.get_parameters();
    Ok(Json(parameters))
}

pub async fn patch_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<ParameterSnapshot>, HttpApiError> {
    let session = state.session(&session_id).await?;
    let mut game = session.lock().await;
    game.update_state(&patch);
    Ok(Json(game.get_parameters()))
}

pub async fn reset_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ParameterSnapshot>, HttpApiError> {
    let session = state.session(&session_id).await?;
    let mut game = session.lock().await;
    game.reset();
    info!("Reset session {session_id}");
    Ok(Json(game.get_parameters()))
}

pub async fn random_allocate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Allocation>, HttpApiError> {
    let session = state.session(&session_id).await?;
    let parameters = session.lock().await.get_parameters();
    Ok(Json(state.engine.random_allocate(&parameters).await))
}

pub async fn start_new_life(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(allocation): Json<Allocation>,
) -> Result<Json<NewLifeResponse>, HttpApiError> {
    let session = state.session(&session_id).await?;
    let mut game = session.lock().await;
    let message = state.engine.start_new_life(&mut game, allocation);
    Ok(Json(NewLifeResponse {
        message,
        parameters: game.get_parameters(),
    }))
}

pub async fn generate_event(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ContextRequest>,
) -> Result<Json<EventReport>, HttpApiError> {
    let session = state.session(&session_id).await?;
    let context = request.context.unwrap_or_default();

    // Held across the workflow call so the session sees no interleaved updates.
    let mut game = session.lock().await;
    let report = state
        .engine
        .generate_event(&mut game, &context)
        .await
        .inspect_err(|err| error!("Error in generate_event for {session_id}: {err}"))?;
    Ok(Json(report))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ContextRequest>,
) -> Result<Json<Value>, HttpApiError> {
    let session = state.session(&session_id).await?;
    let context = request.context.unwrap_or_default();

    let mut game = session.lock().await;
    let messages = state.engine.fetch_messages(&mut game, &context).await;
    Ok(Json(json!({ "messages": messages })))
}
