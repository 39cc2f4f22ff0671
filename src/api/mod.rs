pub mod health;
pub mod meetings;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Create the API router with all routes. Unmatched paths fall through to the
/// client build directory, which serves the application shell and its assets.
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .merge(meetings::meeting_routes())
        .merge(health::health_routes())
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}
