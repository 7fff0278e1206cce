// crates/allot-server/src/allocation/admin.rs
// Admin operations over allocations: run, review, connection checks

use allot_types::{
    Allocation, AllocationReport, AllocationStatistics, AllocationStatus, ConnectionTestReport,
    ProviderStatus,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, warn};

use super::engine::AllocationEngine;
use super::input::AllocationInput;
use crate::db::{
    NewAllocation, approved_count_sync, delete_allocation_sync, get_allocation_sync,
    get_project_sync, get_student_sync, get_supervisor_sync, immediate_transaction,
    insert_pending_allocation_sync, list_allocations_sync, mark_approved_sync, mark_rejected_sync,
    pair_taken_sync, project_has_allocation_sync, student_has_approved_allocation_sync,
};
use crate::error::{AllotError, Result};

/// Body of a manual allocation request
#[derive(Debug, Clone, Deserialize)]
pub struct ManualAllocation {
    pub student_id: i64,
    pub supervisor_id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Admin-facing operations, shared by the HTTP API and the CLI
#[derive(Clone)]
pub struct AllocationAdmin {
    engine: Arc<AllocationEngine>,
}

impl AllocationAdmin {
    pub fn new(engine: Arc<AllocationEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<AllocationEngine> {
        &self.engine
    }

    /// Run the LLM allocation pass
    pub async fn trigger_allocation(&self, provider: Option<&str>) -> Result<AllocationReport> {
        let report = self.engine.generate_allocations(provider).await?;
        let provider = provider.unwrap_or(self.engine.factory().default_provider_name());
        info!("{}", run_message(&report, provider));
        Ok(report)
    }

    /// Send the synthetic one-student input through `provider`
    pub async fn test_connection(&self, provider: &str) -> ConnectionTestReport {
        let client = match self.engine.factory().create(Some(provider)) {
            Ok(client) => client,
            Err(e) => return connection_failed(provider, e.to_string()),
        };

        let deadline = self.engine.config().timeout();
        let set = match timeout(deadline, client.generate_recommendations(&AllocationInput::synthetic())).await {
            Ok(set) => set,
            Err(_) => {
                return connection_failed(
                    provider,
                    format!("request timed out after {}s", deadline.as_secs()),
                );
            }
        };

        if !set.is_ok() {
            warn!(provider, errors = ?set.errors, "Connection test failed");
            return connection_failed(provider, set.errors.join(", "));
        }
        ConnectionTestReport {
            provider: provider.to_string(),
            success: true,
            message: format!("Successfully connected to {} API", provider),
            sample_response: Some(set.to_json()),
        }
    }

    pub async fn statistics(&self) -> Result<AllocationStatistics> {
        self.engine.get_statistics().await
    }

    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.engine.factory().provider_statuses()
    }

    pub async fn list_allocations(&self, status: Option<AllocationStatus>) -> Result<Vec<Allocation>> {
        self.engine
            .pool()
            .run(move |conn| list_allocations_sync(conn, status))
            .await
    }

    pub async fn get_allocation(&self, id: i64) -> Result<Allocation> {
        self.engine
            .pool()
            .run(move |conn| get_allocation_sync(conn, id))
            .await?
            .ok_or_else(|| AllotError::NotFound(format!("Allocation {}", id)))
    }

    /// Approve under the capacity and single-approval rules
    pub async fn approve(&self, id: i64, admin_notes: Option<String>) -> Result<Allocation> {
        let allocation = self
            .engine
            .pool()
            .run_with_retry(move |conn| approve_sync(conn, id, admin_notes.as_deref()))
            .await?;
        info!(allocation_id = id, "Allocation approved");
        Ok(allocation)
    }

    pub async fn reject(&self, id: i64, reason: &str) -> Result<Allocation> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(AllotError::InvalidInput("rejection_reason is required".into()));
        }
        let allocation = self
            .engine
            .pool()
            .run_with_retry(move |conn| {
                if !mark_rejected_sync(conn, id, &reason)? {
                    return Err(AllotError::NotFound(format!("Allocation {}", id)));
                }
                get_allocation_sync(conn, id)?
                    .ok_or_else(|| AllotError::NotFound(format!("Allocation {}", id)))
            })
            .await?;
        info!(allocation_id = id, "Allocation rejected");
        Ok(allocation)
    }

    pub async fn reallocate(&self, id: i64, supervisor_id: i64) -> Result<Allocation> {
        self.engine.reallocate_project(id, supervisor_id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .engine
            .pool()
            .run(move |conn| delete_allocation_sync(conn, id))
            .await?;
        if !deleted {
            return Err(AllotError::NotFound(format!("Allocation {}", id)));
        }
        info!(allocation_id = id, "Allocation deleted");
        Ok(())
    }

    /// Create a pending allocation chosen by an administrator
    pub async fn create_manual(&self, request: ManualAllocation) -> Result<Allocation> {
        let allocation = self
            .engine
            .pool()
            .run_with_retry(move |conn| create_manual_sync(conn, &request))
            .await?;
        info!(allocation_id = allocation.id, "Manual allocation created");
        Ok(allocation)
    }

    pub async fn allocate_project(&self, project_id: i64) -> Result<Allocation> {
        self.engine.allocate_project(project_id).await
    }
}

/// One-line outcome of a run, e.g. "Generated 3 allocations using gemini. 1 errors occurred."
pub fn run_message(report: &AllocationReport, provider: &str) -> String {
    let mut message = format!(
        "Generated {} allocations using {}.",
        report.allocations.len(),
        provider
    );
    if report.has_errors() {
        message.push_str(&format!(" {} errors occurred.", report.errors.len()));
    }
    message
}

fn connection_failed(provider: &str, reason: String) -> ConnectionTestReport {
    ConnectionTestReport {
        provider: provider.to_string(),
        success: false,
        message: format!("Connection test failed: {}", reason),
        sample_response: None,
    }
}

fn approve_sync(conn: &Connection, id: i64, admin_notes: Option<&str>) -> Result<Allocation> {
    let tx = immediate_transaction(conn)?;
    let allocation = get_allocation_sync(&tx, id)?
        .ok_or_else(|| AllotError::NotFound(format!("Allocation {}", id)))?;
    if allocation.status == AllocationStatus::Approved {
        return Ok(allocation);
    }

    if student_has_approved_allocation_sync(&tx, allocation.student_id, Some(id))? {
        return Err(AllotError::Constraint(format!(
            "Student {} already has an approved allocation",
            allocation.student_id
        )));
    }
    let supervisor = get_supervisor_sync(&tx, allocation.supervisor_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Supervisor {}", allocation.supervisor_id)))?;
    if approved_count_sync(&tx, supervisor.id)? >= supervisor.max_students {
        return Err(AllotError::SupervisorAtCapacity);
    }

    mark_approved_sync(&tx, id, &Utc::now().to_rfc3339(), admin_notes)?;
    let approved = get_allocation_sync(&tx, id)?
        .ok_or_else(|| AllotError::NotFound(format!("Allocation {}", id)))?;
    tx.commit()?;
    Ok(approved)
}

fn create_manual_sync(conn: &Connection, request: &ManualAllocation) -> Result<Allocation> {
    let tx = immediate_transaction(conn)?;

    if get_student_sync(&tx, request.student_id)?.is_none() {
        return Err(AllotError::NotFound(format!("Student {}", request.student_id)));
    }
    let supervisor = get_supervisor_sync(&tx, request.supervisor_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Supervisor {}", request.supervisor_id)))?;
    let project = get_project_sync(&tx, request.project_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Project {}", request.project_id)))?;
    if project.student_id != request.student_id {
        return Err(AllotError::Constraint(format!(
            "Project {} doesn't belong to student {}",
            request.project_id, request.student_id
        )));
    }
    if project_has_allocation_sync(&tx, request.project_id)? {
        return Err(AllotError::Constraint(format!(
            "Project {} already has an allocation",
            request.project_id
        )));
    }

    if student_has_approved_allocation_sync(&tx, request.student_id, None)? {
        return Err(AllotError::Constraint(
            "This student already has an approved allocation.".into(),
        ));
    }
    if approved_count_sync(&tx, supervisor.id)? >= supervisor.max_students {
        return Err(AllotError::SupervisorAtCapacity);
    }
    if pair_taken_sync(&tx, request.project_id, request.student_id, supervisor.id, None)? {
        return Err(AllotError::Constraint(format!(
            "Supervisor {} is already paired with this project or student",
            supervisor.id
        )));
    }

    let allocation = insert_pending_allocation_sync(
        &tx,
        &NewAllocation {
            project_id: request.project_id,
            student_id: request.student_id,
            supervisor_id: request.supervisor_id,
            match_score: None,
            admin_notes: request.admin_notes.clone().filter(|n| !n.trim().is_empty()),
        },
    )?;
    tx.commit()?;
    Ok(allocation)
}
