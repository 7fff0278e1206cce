// crates/allot-server/src/db/types.rs
// Row types for the record store

use allot_types::ProjectStatus;
use serde::{Deserialize, Serialize};

pub use allot_types::{Allocation, AllocationStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialization {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub matric_number: String,
    pub department_id: Option<i64>,
    pub level: Option<String>,
    pub session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supervisor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub staff_id: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub department_id: Option<i64>,
    pub max_students: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub student_id: i64,
    pub title: String,
    pub description: String,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub status: ProjectStatus,
}

/// Fields for inserting a student
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub matric_number: String,
    pub department_id: Option<i64>,
    pub level: Option<String>,
    pub session: Option<String>,
}

/// Fields for inserting a supervisor
#[derive(Debug, Clone, Deserialize)]
pub struct NewSupervisor {
    pub name: String,
    pub email: String,
    pub staff_id: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub department_id: Option<i64>,
    pub max_students: i64,
    pub is_active: bool,
}

impl Default for NewSupervisor {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            staff_id: String::new(),
            title: None,
            bio: None,
            department_id: None,
            max_students: 5,
            is_active: true,
        }
    }
}

/// Fields for inserting a project
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub student_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    #[serde(default = "default_project_status")]
    pub status: ProjectStatus,
}

fn default_project_status() -> ProjectStatus {
    ProjectStatus::Draft
}

/// Fields for inserting a pending allocation
#[derive(Debug, Clone, PartialEq)]
pub struct NewAllocation {
    pub project_id: i64,
    pub student_id: i64,
    pub supervisor_id: i64,
    pub match_score: Option<f64>,
    pub admin_notes: Option<String>,
}
