// crates/allot-server/src/web/mod.rs
// Admin HTTP API

pub mod api;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::web::state::AppState;

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/health", get(api::health))
        // LLM allocation runs and provider checks
        .route("/ai-allocation/generate", post(api::generate_allocations))
        .route("/ai-allocation/test-connection", post(api::test_connection))
        .route("/ai-allocation/statistics", get(api::statistics))
        .route("/ai-allocation/providers", get(api::provider_status))
        // Allocation review
        .route("/allocations", get(api::list_allocations).post(api::create_allocation))
        .route("/allocations/{id}", get(api::get_allocation).delete(api::delete_allocation))
        .route("/allocations/{id}/approve", post(api::approve_allocation))
        .route("/allocations/{id}/reject", post(api::reject_allocation))
        .route("/allocations/{id}/reallocate", post(api::reallocate))
        // Rule-based allocation of a single project
        .route("/projects/{id}/allocate", post(api::allocate_project))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(api::health))
        .nest("/api", api_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
