// crates/allot-server/src/web/api/allocations.rs
// Allocation review handlers: list, create, approve, reject, reallocate, delete

use allot_types::AllocationStatus;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use std::str::FromStr;

use super::respond;
use crate::allocation::ManualAllocation;
use crate::error::AllotError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub rejection_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ReallocateRequest {
    pub supervisor_id: i64,
}

pub async fn list_allocations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let parsed = query
        .status
        .as_deref()
        .map(AllocationStatus::from_str)
        .transpose()
        .map_err(|_| {
            AllotError::InvalidInput(format!(
                "unknown status '{}'",
                query.status.as_deref().unwrap_or_default()
            ))
        });
    let result = match parsed {
        Ok(status) => state.admin.list_allocations(status).await,
        Err(e) => Err(e),
    };
    respond(result)
}

pub async fn get_allocation(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    respond(state.admin.get_allocation(id).await)
}

pub async fn create_allocation(
    State(state): State<AppState>,
    Json(req): Json<ManualAllocation>,
) -> impl IntoResponse {
    respond(state.admin.create_manual(req).await)
}

pub async fn delete_allocation(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let result = state
        .admin
        .delete(id)
        .await
        .map(|()| serde_json::json!({ "deleted": id }));
    respond(result)
}

pub async fn approve_allocation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<ApproveRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    respond(state.admin.approve(id, req.admin_notes).await)
}

pub async fn reject_allocation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RejectRequest>,
) -> impl IntoResponse {
    respond(state.admin.reject(id, &req.rejection_reason).await)
}

pub async fn reallocate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ReallocateRequest>,
) -> impl IntoResponse {
    respond(state.admin.reallocate(id, req.supervisor_id).await)
}

/// Rule-based allocation of one project
pub async fn allocate_project(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    respond(state.admin.allocate_project(id).await)
}
