use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, HttpApiError, ServerError};
pub use state::AppState;

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), ServerError> {
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/cities", get(routes::list_cities))
        .route("/api/sessions", post(routes::create_session))
        .route("/api/sessions/:session_id", axum::routing::delete(routes::delete_session))
        .route(
            "/api/sessions/:session_id/state",
            get(routes::get_state).patch(routes::patch_state),
        )
        .route("/api/sessions/:session_id/reset", post(routes::reset_state))
        .route(
            "/api/sessions/:session_id/random_allocate",
            get(routes::random_allocate),
        )
        .route(
            "/api/sessions/:session_id/start_new_life",
            post(routes::start_new_life),
        )
        .route(
            "/api/sessions/:session_id/generate_event",
            post(routes::generate_event),
        )
        .route(
            "/api/sessions/:session_id/get_messages",
            post(routes::get_messages),
        )
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}
