// crates/allot-server/src/web/api/mod.rs
// REST API handlers

mod ai;
mod allocations;

use allot_types::ApiResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::error::AllotError;
use crate::web::state::AppState;

pub use ai::{generate_allocations, provider_status, statistics, test_connection};
pub use allocations::{
    allocate_project, approve_allocation, create_allocation, delete_allocation, get_allocation,
    list_allocations, reallocate, reject_allocation,
};

// ═══════════════════════════════════════
// HEALTH
// ═══════════════════════════════════════

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": state.admin.engine().pool().status(),
    }))
}

// ═══════════════════════════════════════
// RESPONSES
// ═══════════════════════════════════════

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

/// Map an error onto a status code and an `ApiResponse` error body
fn error<T: Serialize>(err: AllotError) -> ApiResult<T> {
    let status = match &err {
        AllotError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => {
            tracing::error!(error = %err, "API request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::err(err.to_string())))
}

fn respond<T: Serialize>(result: crate::Result<T>) -> ApiResult<T> {
    match result {
        Ok(data) => ok(data),
        Err(e) => error(e),
    }
}
