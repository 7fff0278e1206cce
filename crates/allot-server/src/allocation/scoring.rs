// crates/allot-server/src/allocation/scoring.rs
// Rule-based match score for the fallback allocator

use super::input::SupervisorInput;

const SPECIALIZATION_WEIGHT: f64 = 0.7;
const DEPARTMENT_BONUS: f64 = 20.0;
const CAPACITY_WEIGHT: f64 = 10.0;

/// Score a supervisor for a project, 0..=100.
///
/// Specialization overlap counts only when both sides have tags. The
/// department bonus needs both departments known and equal.
pub fn match_score(
    project_specializations: &[i64],
    student_department: Option<i64>,
    supervisor: &SupervisorInput,
) -> f64 {
    let mut score = 0.0;

    let supervisor_specs = supervisor.specialization_ids();
    if !project_specializations.is_empty() && !supervisor_specs.is_empty() {
        let overlap = project_specializations
            .iter()
            .filter(|id| supervisor_specs.contains(id))
            .count();
        let ratio = overlap as f64 / project_specializations.len() as f64;
        score += ratio * 100.0 * SPECIALIZATION_WEIGHT;
    }

    if let (Some(student), Some(staff)) = (student_department, supervisor.department_id())
        && student == staff
    {
        score += DEPARTMENT_BONUS;
    }

    if supervisor.max_students > 0 {
        let spare = (supervisor.max_students - supervisor.current_student_count).max(0);
        score += CAPACITY_WEIGHT * spare as f64 / supervisor.max_students as f64;
    }

    score.min(100.0)
}

/// Rank supervisors with score > 0, highest first; ties keep input order
pub fn rank_supervisors<'a>(
    project_specializations: &[i64],
    student_department: Option<i64>,
    supervisors: &'a [SupervisorInput],
) -> Vec<(&'a SupervisorInput, f64)> {
    let mut ranked: Vec<_> = supervisors
        .iter()
        .map(|s| (s, match_score(project_specializations, student_department, s)))
        .filter(|(_, score)| *score > 0.0)
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
