// crates/allot-types/src/lib.rs
// Shared types for Allot (records, reports, API envelopes)
// No native-only dependencies allowed here

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════
// STATUS ENUMS
// ═══════════════════════════════════════

/// Lifecycle of an allocation record
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::IntoStaticStr,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AllocationStatus {
    Pending,
    Approved,
    Rejected,
    Reassigned,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Lifecycle of a student project
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::IntoStaticStr,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

// ═══════════════════════════════════════
// DOMAIN TYPES
// ═══════════════════════════════════════

/// Binding of one project, one student and one supervisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub project_id: i64,
    pub student_id: i64,
    pub supervisor_id: i64,
    pub status: AllocationStatus,
    /// 0-100, either LLM-produced or computed by the rule-based scorer
    pub match_score: Option<f64>,
    pub admin_notes: Option<String>,
    pub rejection_reason: Option<String>,
    /// Set only while the allocation is approved
    pub allocated_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregate metrics over committed allocation state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllocationStatistics {
    pub total_projects: i64,
    pub allocated_projects: i64,
    pub pending_allocations: i64,
    pub allocation_rate: f64,
    pub average_match_score: f64,
}

/// Result bundle of an allocation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationReport {
    pub allocations: Vec<Allocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl AllocationReport {
    /// Report carrying only errors (nothing committed)
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            errors,
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Configuration status of one LLM provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider: String,
    pub name: String,
    pub configured: bool,
    pub has_base_url: bool,
}

/// Outcome of a provider round-trip with synthetic data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestReport {
    pub provider: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_response: Option<Value>,
}

// ═══════════════════════════════════════
// API ENVELOPE
// ═══════════════════════════════════════

/// Standard JSON envelope for the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
