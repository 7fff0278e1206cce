// crates/allot-server/src/web/api/ai.rs
// LLM allocation runs, connection tests, statistics and provider status

use allot_types::{AllocationReport, AllocationStatistics, ConnectionTestReport, ProviderStatus};
use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use super::{ok, respond};
use crate::allocation::admin::run_message;
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: AllocationReport,
}

#[derive(Debug, Deserialize)]
pub struct TestConnectionRequest {
    pub provider: String,
}

/// Run the LLM allocation pass (optional provider pin)
pub async fn generate_allocations(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let provider = req.provider.filter(|p| !p.trim().is_empty());

    let result = state
        .admin
        .trigger_allocation(provider.as_deref())
        .await
        .map(|report| {
            let name = provider
                .clone()
                .unwrap_or_else(|| state.admin.engine().factory().default_provider_name().to_string());
            GenerateResponse {
                message: run_message(&report, &name),
                report,
            }
        });
    respond(result)
}

pub async fn test_connection(
    State(state): State<AppState>,
    Json(req): Json<TestConnectionRequest>,
) -> impl IntoResponse {
    let report: ConnectionTestReport = state.admin.test_connection(&req.provider).await;
    ok(report)
}

pub async fn statistics(State(state): State<AppState>) -> impl IntoResponse {
    let result: crate::Result<AllocationStatistics> = state.admin.statistics().await;
    respond(result)
}

pub async fn provider_status(State(state): State<AppState>) -> impl IntoResponse {
    let statuses: Vec<ProviderStatus> = state.admin.provider_status();
    ok(statuses)
}
