// crates/allot-server/src/allocation/input.rs
// Data preparation: records serialised for the prompt and the scorer

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{
    Department, Project, Specialization, Student, Supervisor, approved_count_sync, get_department_sync,
    get_students_by_ids_sync, list_active_supervisors_sync, project_specializations_sync,
    supervisor_specializations_sync,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentInput {
    pub id: i64,
    pub name: String,
    pub code: String,
}

impl From<Department> for DepartmentInput {
    fn from(d: Department) -> Self {
        Self {
            id: d.id,
            name: d.name,
            code: d.code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecializationInput {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Specialization> for SpecializationInput {
    fn from(s: Specialization) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentInput {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Matriculation number
    pub student_id: String,
    pub department: Option<DepartmentInput>,
    pub level: Option<String>,
    pub session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInput {
    pub id: i64,
    pub student_id: i64,
    pub title: String,
    pub description: String,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub status: String,
    pub specializations: Vec<SpecializationInput>,
}

impl ProjectInput {
    pub fn specialization_ids(&self) -> Vec<i64> {
        self.specializations.iter().map(|s| s.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupervisorInput {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub staff_id: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub department: Option<DepartmentInput>,
    pub max_students: i64,
    /// Derived: approved allocations at load time
    pub current_student_count: i64,
    pub specializations: Vec<SpecializationInput>,
}

impl SupervisorInput {
    pub fn department_id(&self) -> Option<i64> {
        self.department.as_ref().map(|d| d.id)
    }

    pub fn has_capacity(&self) -> bool {
        self.current_student_count < self.max_students
    }

    pub fn specialization_ids(&self) -> Vec<i64> {
        self.specializations.iter().map(|s| s.id).collect()
    }
}

/// The three collections handed to a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationInput {
    pub students: Vec<StudentInput>,
    pub projects: Vec<ProjectInput>,
    pub supervisors: Vec<SupervisorInput>,
}

impl AllocationInput {
    /// Same students and supervisors, restricted to a subset of projects
    pub fn with_projects(&self, projects: &[ProjectInput]) -> Self {
        let students = self
            .students
            .iter()
            .filter(|s| projects.iter().any(|p| p.student_id == s.id))
            .cloned()
            .collect();
        Self {
            students,
            projects: projects.to_vec(),
            supervisors: self.supervisors.clone(),
        }
    }

    /// One student, one project, one supervisor for connection tests
    pub fn synthetic() -> Self {
        let department = DepartmentInput {
            id: 1,
            name: "Computer Science".to_string(),
            code: "CSC".to_string(),
        };
        let ai = SpecializationInput {
            id: 1,
            name: "Artificial Intelligence".to_string(),
            description: Some("Machine learning and intelligent systems".to_string()),
        };
        Self {
            students: vec![StudentInput {
                id: 1,
                name: "Test Student".to_string(),
                email: "student@example.edu".to_string(),
                student_id: "TEST001".to_string(),
                department: Some(department.clone()),
                level: Some("400".to_string()),
                session: Some("2024/2025".to_string()),
            }],
            projects: vec![ProjectInput {
                id: 1,
                student_id: 1,
                title: "AI-Based Student Performance Prediction".to_string(),
                description: "Predict academic performance from coursework data".to_string(),
                objectives: Some("Build and evaluate a prediction model".to_string()),
                methodology: Some("Supervised learning on historical records".to_string()),
                status: "submitted".to_string(),
                specializations: vec![ai.clone()],
            }],
            supervisors: vec![SupervisorInput {
                id: 1,
                name: "Dr. Test Supervisor".to_string(),
                email: "supervisor@example.edu".to_string(),
                staff_id: "STAFF001".to_string(),
                title: Some("Dr".to_string()),
                bio: Some("Researcher in machine learning".to_string()),
                department: Some(department),
                max_students: 5,
                current_student_count: 0,
                specializations: vec![ai],
            }],
        }
    }
}

fn load_department(conn: &Connection, id: Option<i64>) -> rusqlite::Result<Option<DepartmentInput>> {
    match id {
        Some(id) => Ok(get_department_sync(conn, id)?.map(Into::into)),
        None => Ok(None),
    }
}

fn student_input(conn: &Connection, student: Student) -> rusqlite::Result<StudentInput> {
    Ok(StudentInput {
        id: student.id,
        department: load_department(conn, student.department_id)?,
        name: student.name,
        email: student.email,
        student_id: student.matric_number,
        level: student.level,
        session: student.session,
    })
}

pub fn project_input_sync(conn: &Connection, project: Project) -> rusqlite::Result<ProjectInput> {
    let specializations = project_specializations_sync(conn, project.id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ProjectInput {
        id: project.id,
        student_id: project.student_id,
        title: project.title,
        description: project.description,
        objectives: project.objectives,
        methodology: project.methodology,
        status: project.status.as_str().to_string(),
        specializations,
    })
}

pub fn supervisor_input_sync(conn: &Connection, supervisor: Supervisor) -> rusqlite::Result<SupervisorInput> {
    let specializations = supervisor_specializations_sync(conn, supervisor.id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(SupervisorInput {
        id: supervisor.id,
        current_student_count: approved_count_sync(conn, supervisor.id)?,
        department: load_department(conn, supervisor.department_id)?,
        name: supervisor.name,
        email: supervisor.email,
        staff_id: supervisor.staff_id,
        title: supervisor.title,
        bio: supervisor.bio,
        max_students: supervisor.max_students,
        specializations,
    })
}

/// Active supervisors with specializations, department and derived load
pub fn active_supervisor_inputs_sync(conn: &Connection) -> rusqlite::Result<Vec<SupervisorInput>> {
    list_active_supervisors_sync(conn)?
        .into_iter()
        .map(|s| supervisor_input_sync(conn, s))
        .collect()
}

/// Build the provider input for a set of candidate projects
pub fn build_input_sync(conn: &Connection, projects: Vec<Project>) -> rusqlite::Result<AllocationInput> {
    let student_ids: Vec<i64> = projects.iter().map(|p| p.student_id).collect();
    let students = get_students_by_ids_sync(conn, &student_ids)?
        .into_iter()
        .map(|s| student_input(conn, s))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let projects = projects
        .into_iter()
        .map(|p| project_input_sync(conn, p))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let supervisors = active_supervisor_inputs_sync(conn)?;

    Ok(AllocationInput {
        students,
        projects,
        supervisors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{
        seed_allocation, seed_department, seed_project, seed_student, seed_supervisor,
        setup_test_connection,
    };
    use crate::db::{get_project_sync, set_supervisor_active_sync};
    use allot_types::AllocationStatus;

    #[test]
    fn test_build_input_collects_related_records() {
        let conn = setup_test_connection();
        let csc = seed_department(&conn, "CSC");
        let s1 = seed_student(&conn, "Ada", Some(csc));
        let s2 = seed_student(&conn, "Bo", None);
        let p1 = seed_project(&conn, s1, "Vision", &["AI"]);
        let p2 = seed_project(&conn, s2, "Networks", &[]);
        let busy = seed_supervisor(&conn, "Dr Busy", Some(csc), 2, &["AI"]);
        let idle = seed_supervisor(&conn, "Dr Idle", None, 2, &[]);
        set_supervisor_active_sync(&conn, idle, false).unwrap();
        let s3 = seed_student(&conn, "Cy", None);
        let p3 = seed_project(&conn, s3, "Old", &[]);
        seed_allocation(&conn, p3, s3, busy, AllocationStatus::Approved);

        let projects = vec![
            get_project_sync(&conn, p1).unwrap().unwrap(),
            get_project_sync(&conn, p2).unwrap().unwrap(),
        ];
        let input = build_input_sync(&conn, projects).unwrap();

        assert_eq!(input.students.len(), 2);
        assert_eq!(input.students[0].department.as_ref().unwrap().code, "CSC");
        assert_eq!(input.projects[0].specializations[0].name, "AI");
        assert_eq!(input.supervisors.len(), 1);
        assert_eq!(input.supervisors[0].current_student_count, 1);
        assert!(input.supervisors[0].has_capacity());
        assert_eq!(input.students[0].department.as_ref().map(|d| d.id), Some(csc));
        assert!(input.students[1].department.is_none());
    }

    #[test]
    fn test_with_projects_filters_students() {
        let input = AllocationInput::synthetic();
        let none = input.with_projects(&[]);
        assert!(none.students.is_empty());
        assert_eq!(none.supervisors.len(), 1);

        let all = input.with_projects(&input.projects);
        assert_eq!(all, input);
    }

    #[test]
    fn test_student_serialises_matric_as_student_id() {
        let input = AllocationInput::synthetic();
        let json = serde_json::to_value(&input.students[0]).unwrap();
        assert_eq!(json["student_id"], "TEST001");
        assert_eq!(json["department"]["code"], "CSC");
    }
}
