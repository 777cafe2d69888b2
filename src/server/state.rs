use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::engine::engine::Engine;
use crate::model::game_state::GameState;
use crate::server::error::HttpApiError;

pub type SharedSession = Arc<Mutex<GameState>>;

/// Engine plus every live session. Cloned into each handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    game: GameConfig,
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl AppState {
    pub fn new(engine: Engine, game: GameConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            game,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn create_session(&self) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(GameState::new(&self.game)));
        self.sessions.write().await.insert(id, Arc::clone(&session));
        info!("Created session {id}");
        (id, session)
    }

    /// Looks up a session by its textual id; anything unparsable is simply unknown.
    pub async fn session(&self, session_id: &str) -> Result<SharedSession, HttpApiError> {
        let id = Uuid::parse_str(session_id)
            .map_err(|_| HttpApiError::session_not_found(session_id))?;
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| HttpApiError::session_not_found(session_id))
    }

    pub async fn remove_session(&self, session_id: &str) -> Result<(), HttpApiError> {
        let id = Uuid::parse_str(session_id)
            .map_err(|_| HttpApiError::session_not_found(session_id))?;
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!("Removed session {id}");
                Ok(())
            }
            None => Err(HttpApiError::session_not_found(session_id)),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
