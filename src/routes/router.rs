use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{AppState, handle_interfaces, health};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/interfaces", post(handle_interfaces))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
