// crates/allot-server/src/allocation/engine.rs
// Allocation engine: LLM path, rule-based fallback and reallocation

use allot_types::{Allocation, AllocationReport, AllocationStatistics};
use rusqlite::Connection;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use super::input::{
    AllocationInput, build_input_sync, project_input_sync, supervisor_input_sync,
    active_supervisor_inputs_sync,
};
use super::scoring::{match_score, rank_supervisors};
use super::statistics;
use crate::config::AllocationConfig;
use crate::db::{
    DatabasePool, NewAllocation, Project, approved_count_sync, get_allocation_sync,
    get_project_sync, get_student_sync, get_supervisor_sync, immediate_transaction,
    insert_pending_allocation_sync, list_unallocated_submitted_projects_sync, mark_reassigned_sync,
    pair_taken_sync, project_has_allocation_sync, student_has_approved_allocation_sync,
};
use crate::error::{AllotError, Result};
use crate::llm::{LlmProvider, ProviderFactory, Recommendation, RecommendationSet};

pub const NO_CANDIDATES: &str = "No submitted projects found for allocation.";
const DEFAULT_ADMIN_NOTES: &str = "AI-generated allocation";
/// Base backoff between provider attempts (doubles each attempt)
const DEFAULT_BASE_BACKOFF_SECS: u64 = 2;

/// Runs allocation passes against the record store
pub struct AllocationEngine {
    pool: Arc<DatabasePool>,
    factory: Arc<ProviderFactory>,
    config: AllocationConfig,
    base_backoff: Duration,
    /// One allocation run at a time per engine
    run_lock: Mutex<()>,
}

impl AllocationEngine {
    pub fn new(pool: Arc<DatabasePool>, factory: Arc<ProviderFactory>, config: AllocationConfig) -> Self {
        Self {
            pool,
            factory,
            config,
            base_backoff: Duration::from_secs(DEFAULT_BASE_BACKOFF_SECS),
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn pool(&self) -> &Arc<DatabasePool> {
        &self.pool
    }

    pub fn factory(&self) -> &Arc<ProviderFactory> {
        &self.factory
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Allocate every submitted, unallocated project through an LLM provider.
    ///
    /// `provider` pins a provider by name; `None` uses the configured default.
    /// Only an unknown provider name is returned as `Err`; every other failure
    /// lands in the report's `errors`.
    pub async fn generate_allocations(&self, provider: Option<&str>) -> Result<AllocationReport> {
        let provider = self.factory.create(provider)?;
        Ok(self.generate_with(provider).await)
    }

    /// [`generate_allocations`](Self::generate_allocations) with an explicit provider
    #[instrument(skip(self, provider), fields(provider = %provider.provider_type()))]
    pub async fn generate_with(&self, provider: Arc<dyn LlmProvider>) -> AllocationReport {
        let _guard = self.run_lock.lock().await;
        let start_time = Instant::now();

        let candidates = match self.pool.run(list_unallocated_submitted_projects_sync).await {
            Ok(projects) => projects,
            Err(e) => return self.engine_failure(e, 0),
        };
        if candidates.is_empty() {
            info!("No candidate projects, skipping provider call");
            return AllocationReport::failed(vec![NO_CANDIDATES.to_string()]);
        }
        let candidate_count = candidates.len();
        let candidate_ids: Vec<i64> = candidates.iter().map(|p| p.id).collect();

        let input = match self
            .pool
            .run(move |conn| build_input_sync(conn, candidates))
            .await
        {
            Ok(input) => input,
            Err(e) => return self.engine_failure(e, candidate_count),
        };

        let advice = match self.request_batches(provider.as_ref(), &input).await {
            Ok(advice) => advice,
            Err(errors) => {
                if self.config.fallback_to_rule_based {
                    return self.fallback_all(&candidate_ids, errors).await;
                }
                return AllocationReport::failed(errors);
            }
        };

        let mut report = AllocationReport {
            summary: advice.summary.clone(),
            recommendations: advice.recommendations.clone(),
            ..Default::default()
        };

        for recommendation in advice.allocations {
            match self.commit_recommendation(recommendation).await {
                Ok(allocation) => report.allocations.push(allocation),
                Err(AllotError::Constraint(reason)) => {
                    report
                        .errors
                        .push(format!("Failed to process recommendation: {}", reason));
                }
                Err(e) => return self.engine_failure(e, candidate_count),
            }
        }

        if !report.errors.is_empty() {
            warn!(errors = ?report.errors, "Some LLM recommendations failed to process");
        }
        info!(
            committed = report.allocations.len(),
            rejected = report.errors.len(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Allocation run complete"
        );
        report
    }

    fn engine_failure(&self, e: AllotError, projects_count: usize) -> AllocationReport {
        error!(error = %e, projects_count, "LLM allocation generation failed");
        AllocationReport::failed(vec![format!("LLM allocation failed: {}", e)])
    }

    /// Send candidates in batches; any failed batch fails the whole run
    async fn request_batches(
        &self,
        provider: &dyn LlmProvider,
        input: &AllocationInput,
    ) -> std::result::Result<RecommendationSet, Vec<String>> {
        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<_> = input.projects.chunks(batch_size).collect();
        if batches.len() == 1 {
            return self.request_with_retries(provider, input).await;
        }

        let mut merged = RecommendationSet::default();
        let mut summaries = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            info!(batch = index + 1, of = batches.len(), projects = batch.len(), "Sending batch");
            let set = self
                .request_with_retries(provider, &input.with_projects(batch))
                .await?;
            merged.allocations.extend(set.allocations);
            merged.recommendations.extend(set.recommendations);
            if let Some(summary) = set.summary {
                summaries.push(summary);
            }
        }
        if !summaries.is_empty() {
            merged.summary = Some(Value::Array(summaries));
        }
        Ok(merged)
    }

    /// One provider call plus up to `max_retries` more, each under the timeout
    async fn request_with_retries(
        &self,
        provider: &dyn LlmProvider,
        input: &AllocationInput,
    ) -> std::result::Result<RecommendationSet, Vec<String>> {
        let attempts = self.config.max_retries + 1;
        let mut backoff = self.base_backoff;
        let mut last_errors = Vec::new();

        for attempt in 1..=attempts {
            let set = match timeout(self.config.timeout(), provider.generate_recommendations(input)).await {
                Ok(set) => set,
                Err(_) => RecommendationSet::failed(format!(
                    "{} request timed out after {}s",
                    provider.provider_type(),
                    self.config.timeout
                )),
            };
            if set.is_ok() {
                return Ok(set);
            }

            last_errors = set.errors;
            if attempt < attempts {
                warn!(
                    attempt,
                    max_attempts = attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    errors = ?last_errors,
                    "Provider call failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
        Err(last_errors)
    }

    /// Re-validate one recommendation against live state and commit it as pending
    async fn commit_recommendation(&self, recommendation: Recommendation) -> Result<Allocation> {
        self.pool
            .run_with_retry(move |conn| commit_recommendation_sync(conn, &recommendation))
            .await
    }

    /// Run the rule-based scorer for each candidate after the LLM path gave up
    async fn fallback_all(&self, project_ids: &[i64], llm_errors: Vec<String>) -> AllocationReport {
        warn!(projects = project_ids.len(), "LLM path failed, using rule-based fallback");
        let mut report = AllocationReport::failed(llm_errors);
        for &project_id in project_ids {
            match self.allocate_project(project_id).await {
                Ok(allocation) => report.allocations.push(allocation),
                Err(e) => report
                    .errors
                    .push(format!("Fallback allocation failed for project {}: {}", project_id, e)),
            }
        }
        report
    }

    /// Rule-based allocation of one project to its best-scoring supervisor
    pub async fn allocate_project(&self, project_id: i64) -> Result<Allocation> {
        let allocation = self
            .pool
            .run_with_retry(move |conn| allocate_project_sync(conn, project_id))
            .await?;
        info!(
            project_id,
            supervisor_id = allocation.supervisor_id,
            match_score = ?allocation.match_score,
            "Fallback allocation created"
        );
        Ok(allocation)
    }

    /// Move an allocation to another supervisor with a recomputed score
    pub async fn reallocate_project(&self, allocation_id: i64, supervisor_id: i64) -> Result<Allocation> {
        let allocation = self
            .pool
            .run_with_retry(move |conn| reallocate_project_sync(conn, allocation_id, supervisor_id))
            .await?;
        info!(allocation_id, supervisor_id, "Allocation reassigned");
        Ok(allocation)
    }

    pub async fn get_statistics(&self) -> Result<AllocationStatistics> {
        statistics::get_statistics(&self.pool).await
    }
}

fn commit_recommendation_sync(conn: &Connection, recommendation: &Recommendation) -> Result<Allocation> {
    let (Some(student_id), Some(supervisor_id), Some(project_id)) = (
        recommendation.student_id(),
        recommendation.supervisor_id(),
        recommendation.project_id(),
    ) else {
        return Err(AllotError::Constraint(format!(
            "Invalid recommendation ids (student_id={}, supervisor_id={}, project_id={})",
            recommendation.display_field("student_id"),
            recommendation.display_field("supervisor_id"),
            recommendation.display_field("project_id"),
        )));
    };
    let score = recommendation.match_score().map_err(AllotError::Constraint)?;

    let tx = immediate_transaction(conn)?;

    if student_has_approved_allocation_sync(&tx, student_id, None)? {
        return Err(AllotError::Constraint(format!(
            "Student {} already has an approved allocation",
            student_id
        )));
    }

    let supervisor_ok = match get_supervisor_sync(&tx, supervisor_id)? {
        Some(s) => s.is_active && approved_count_sync(&tx, s.id)? < s.max_students,
        None => false,
    };
    if !supervisor_ok {
        return Err(AllotError::Constraint(format!(
            "Supervisor {} cannot accept more students",
            supervisor_id
        )));
    }

    let owned = get_project_sync(&tx, project_id)?.is_some_and(|p| p.student_id == student_id);
    if !owned {
        return Err(AllotError::Constraint(format!(
            "Project {} not found or doesn't belong to student {}",
            project_id, student_id
        )));
    }

    if project_has_allocation_sync(&tx, project_id)? {
        return Err(AllotError::Constraint(format!(
            "Project {} already has an allocation",
            project_id
        )));
    }
    if pair_taken_sync(&tx, project_id, student_id, supervisor_id, None)? {
        return Err(AllotError::Constraint(format!(
            "Supervisor {} is already paired with student {}",
            supervisor_id, student_id
        )));
    }

    let allocation = insert_pending_allocation_sync(
        &tx,
        &NewAllocation {
            project_id,
            student_id,
            supervisor_id,
            match_score: score,
            admin_notes: Some(
                recommendation
                    .reasoning()
                    .unwrap_or_else(|| DEFAULT_ADMIN_NOTES.to_string()),
            ),
        },
    )?;
    tx.commit()?;
    Ok(allocation)
}

/// Specialization ids and owner department for scoring a project
fn project_scoring_inputs(conn: &Connection, project: Project) -> Result<(Vec<i64>, Option<i64>)> {
    let department = get_student_sync(conn, project.student_id)?.and_then(|s| s.department_id);
    let specs = project_input_sync(conn, project)?.specialization_ids();
    Ok((specs, department))
}

fn allocate_project_sync(conn: &Connection, project_id: i64) -> Result<Allocation> {
    let tx = immediate_transaction(conn)?;

    let project = get_project_sync(&tx, project_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Project {}", project_id)))?;
    if project_has_allocation_sync(&tx, project_id)? {
        return Err(AllotError::Constraint(format!(
            "Project {} already has an allocation",
            project_id
        )));
    }
    let student_id = project.student_id;

    let available: Vec<_> = active_supervisor_inputs_sync(&tx)?
        .into_iter()
        .filter(|s| s.has_capacity())
        .collect();
    if available.is_empty() {
        return Err(AllotError::NoAvailableSupervisor);
    }

    let (specs, department) = project_scoring_inputs(&tx, project)?;
    let ranked = rank_supervisors(&specs, department, &available);
    // Highest score first; pairs already taken for this student are skipped
    let mut best = None;
    for (supervisor, score) in ranked {
        if !pair_taken_sync(&tx, project_id, student_id, supervisor.id, None)? {
            best = Some((supervisor.id, score));
            break;
        }
    }
    let (supervisor_id, score) = best.ok_or(AllotError::NoSuitableSupervisor)?;

    let allocation = insert_pending_allocation_sync(
        &tx,
        &NewAllocation {
            project_id,
            student_id,
            supervisor_id,
            match_score: Some(score),
            admin_notes: None,
        },
    )?;
    tx.commit()?;
    Ok(allocation)
}

fn reallocate_project_sync(conn: &Connection, allocation_id: i64, supervisor_id: i64) -> Result<Allocation> {
    let tx = immediate_transaction(conn)?;

    let allocation = get_allocation_sync(&tx, allocation_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Allocation {}", allocation_id)))?;
    let supervisor = get_supervisor_sync(&tx, supervisor_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Supervisor {}", supervisor_id)))?;
    let supervisor = supervisor_input_sync(&tx, supervisor)?;
    if !supervisor.has_capacity() {
        return Err(AllotError::SupervisorAtCapacity);
    }
    if pair_taken_sync(
        &tx,
        allocation.project_id,
        allocation.student_id,
        supervisor_id,
        Some(allocation_id),
    )? {
        return Err(AllotError::Constraint(format!(
            "Supervisor {} is already paired with this project or student",
            supervisor_id
        )));
    }

    let project = get_project_sync(&tx, allocation.project_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Project {}", allocation.project_id)))?;
    let (specs, department) = project_scoring_inputs(&tx, project)?;
    let score = match_score(&specs, department, &supervisor);

    mark_reassigned_sync(&tx, allocation_id, supervisor_id, score)?;
    let updated = get_allocation_sync(&tx, allocation_id)?
        .ok_or_else(|| AllotError::NotFound(format!("Allocation {}", allocation_id)))?;
    tx.commit()?;
    Ok(updated)
}


#[cfg(test)]
mod tests {
    use super::test_doubles::ScriptedProvider;
    use super::*;
    use crate::config::{LlmConfig, LoggingConfig};
    use crate::db::test_support::{
        seed_allocation, seed_department, seed_project, seed_student, seed_supervisor,
        setup_test_pool,
    };
    use crate::db::{approved_count_sync, list_allocations_sync, set_supervisor_active_sync};
    use allot_types::AllocationStatus;
    use serde_json::json;

    fn engine_with(pool: Arc<DatabasePool>, config: AllocationConfig) -> AllocationEngine {
        let factory = ProviderFactory::new(
            LlmConfig::default(),
            crate::http::create_shared_client(),
            LoggingConfig::default(),
        );
        AllocationEngine::new(pool, Arc::new(factory), config).with_base_backoff(Duration::from_millis(1))
    }

    fn no_retry() -> AllocationConfig {
        AllocationConfig {
            max_retries: 0,
            ..Default::default()
        }
    }

    fn reply(allocations: serde_json::Value) -> String {
        json!({
            "allocations": allocations,
            "summary": {"total_allocations": 1},
            "recommendations": ["ok"]
        })
        .to_string()
    }

    /// Department, three students with submitted projects, two supervisors
    struct World {
        students: Vec<i64>,
        projects: Vec<i64>,
        s1: i64,
        s2: i64,
    }

    async fn seed_world(pool: &DatabasePool) -> World {
        pool.interact(|conn| {
            let csc = seed_department(conn, "CSC");
            let mut students = Vec::new();
            let mut projects = Vec::new();
            for i in 0..3 {
                let student = seed_student(conn, &format!("Student {i}"), Some(csc));
                projects.push(seed_project(conn, student, &format!("Project {i}"), &["AI", "Data"]));
                students.push(student);
            }
            let s1 = seed_supervisor(conn, "Dr One", Some(csc), 5, &["AI", "Data"]);
            let s2 = seed_supervisor(conn, "Dr Two", None, 1, &["AI"]);
            Ok(World {
                students,
                projects,
                s1,
                s2,
            })
        })
        .await
        .unwrap()
    }

    // ============================================================================
    // generate_allocations
    // ============================================================================

    #[tokio::test]
    async fn test_no_candidates_skips_provider() {
        let pool = setup_test_pool().await;
        let engine = engine_with(pool, no_retry());
        let provider = ScriptedProvider::replying(&reply(json!([])));

        let report = engine.generate_with(provider.clone()).await;
        assert!(report.allocations.is_empty());
        assert_eq!(report.errors, vec![NO_CANDIDATES.to_string()]);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_commits_pending_with_reasoning() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let engine = engine_with(pool.clone(), no_retry());
        let provider = ScriptedProvider::replying(&reply(json!([
            {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[0],
             "match_score": 88.5, "reasoning": "Strong AI overlap"},
            {"student_id": w.students[1], "supervisor_id": w.s1, "project_id": w.projects[1]}
        ])));

        let report = engine.generate_with(provider.clone()).await;
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.allocations.len(), 2);
        assert_eq!(report.recommendations, vec!["ok".to_string()]);
        assert_eq!(report.summary, Some(json!({"total_allocations": 1})));

        let first = &report.allocations[0];
        assert_eq!(first.status, AllocationStatus::Pending);
        assert_eq!(first.match_score, Some(88.5));
        assert_eq!(first.admin_notes.as_deref(), Some("Strong AI overlap"));
        assert!(first.allocated_at.is_none());
        assert_eq!(report.allocations[1].admin_notes.as_deref(), Some("AI-generated allocation"));
        assert_eq!(report.allocations[1].match_score, None);

        // the provider saw all three candidates and both active supervisors
        let inputs = provider.inputs.lock().unwrap();
        assert_eq!(inputs[0].projects.len(), 3);
        assert_eq!(inputs[0].supervisors.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_success_collects_violation() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        // student 2 already holds an approved allocation elsewhere
        let student = w.students[2];
        let s1 = w.s1;
        pool.interact(move |conn| {
            let extra = seed_project(conn, student, "Earlier", &[]);
            seed_allocation(conn, extra, student, s1, AllocationStatus::Approved);
            Ok(())
        })
        .await
        .unwrap();

        let engine = engine_with(pool.clone(), no_retry());
        let provider = ScriptedProvider::replying(&reply(json!([
            {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[0]},
            {"student_id": w.students[1], "supervisor_id": w.s2, "project_id": w.projects[1]},
            {"student_id": w.students[2], "supervisor_id": w.s2, "project_id": w.projects[2]}
        ])));

        let report = engine.generate_with(provider).await;
        assert_eq!(report.allocations.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains(&format!("Student {} already has an approved allocation", student)));
    }

    #[tokio::test]
    async fn test_rejects_bad_ids_scores_and_ownership() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let engine = engine_with(pool.clone(), no_retry());
        let provider = ScriptedProvider::replying(&reply(json!([
            {"student_id": "abc", "supervisor_id": w.s1, "project_id": w.projects[0]},
            {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[0], "match_score": 150},
            {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[1]},
            {"student_id": w.students[0], "supervisor_id": 999, "project_id": w.projects[0]},
            {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[0]},
            {"student_id": w.students[0], "supervisor_id": w.s2, "project_id": w.projects[0]}
        ])));

        let report = engine.generate_with(provider).await;
        assert_eq!(report.allocations.len(), 1);
        assert_eq!(report.errors.len(), 5);
        assert!(report.errors[0].contains("Invalid recommendation ids"));
        assert!(report.errors[1].contains("match_score"));
        assert!(report.errors[2].contains("doesn't belong to student"));
        assert!(report.errors[3].contains("Supervisor 999 cannot accept more students"));
        assert!(report.errors[4].contains("already has an allocation"));
    }

    #[tokio::test]
    async fn test_capacity_uses_approved_load() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let (s2, other_student) = (w.s2, w.students[2]);
        pool.interact(move |conn| {
            let p = seed_project(conn, other_student, "Filled", &[]);
            seed_allocation(conn, p, other_student, s2, AllocationStatus::Approved);
            Ok(())
        })
        .await
        .unwrap();

        let engine = engine_with(pool.clone(), no_retry());
        let provider = ScriptedProvider::replying(&reply(json!([
            {"student_id": w.students[0], "supervisor_id": w.s2, "project_id": w.projects[0]}
        ])));
        let report = engine.generate_with(provider).await;
        assert!(report.allocations.is_empty());
        assert!(report.errors[0].contains(&format!("Supervisor {} cannot accept more students", w.s2)));
    }

    #[tokio::test]
    async fn test_inactive_supervisor_rejected() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let s1 = w.s1;
        pool.interact(move |conn| Ok(set_supervisor_active_sync(conn, s1, false)?))
            .await
            .unwrap();
        let engine = engine_with(pool, no_retry());
        let provider = ScriptedProvider::replying(&reply(json!([
            {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[0]}
        ])));
        let report = engine.generate_with(provider).await;
        assert!(report.allocations.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_provider_errors_propagate_without_commit() {
        let pool = setup_test_pool().await;
        seed_world(&pool).await;
        let engine = engine_with(pool.clone(), no_retry());
        let provider = ScriptedProvider::replying("{not json");

        let report = engine.generate_with(provider).await;
        assert!(report.allocations.is_empty());
        assert_eq!(report.errors, vec!["Invalid allocation recommendations format".to_string()]);
        let rows = pool.run(|conn| list_allocations_sync(conn, None)).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let engine = engine_with(pool, AllocationConfig::default());
        let ok = crate::llm::recommendations::into_recommendation_set(&reply(json!([
            {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[0]}
        ])))
        .unwrap();
        let provider = ScriptedProvider::new(vec![
            RecommendationSet::failed("Gemini API request failed: 503"),
            RecommendationSet::failed("Gemini API request failed: 503"),
            ok,
        ]);

        let report = engine.generate_with(provider.clone()).await;
        assert_eq!(provider.call_count(), 3);
        assert_eq!(report.allocations.len(), 1);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_retries_exhausted_reports_last_errors() {
        let pool = setup_test_pool().await;
        seed_world(&pool).await;
        let config = AllocationConfig {
            max_retries: 2,
            ..Default::default()
        };
        let engine = engine_with(pool, config);
        let provider = ScriptedProvider::new(vec![RecommendationSet::failed("boom")]);

        let report = engine.generate_with(provider.clone()).await;
        assert_eq!(provider.call_count(), 3);
        assert_eq!(report.errors, vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn test_timeout_is_normalised() {
        let pool = setup_test_pool().await;
        seed_world(&pool).await;
        let config = AllocationConfig {
            max_retries: 0,
            timeout: 1,
            ..Default::default()
        };
        let engine = engine_with(pool, config);
        let provider = ScriptedProvider::slow(Duration::from_secs(5), RecommendationSet::default());

        let report = engine.generate_with(provider).await;
        assert_eq!(report.errors, vec!["gemini request timed out after 1s".to_string()]);
    }

    #[tokio::test]
    async fn test_batches_split_candidates() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let config = AllocationConfig {
            max_retries: 0,
            batch_size: 2,
            ..Default::default()
        };
        let engine = engine_with(pool, config);
        let provider = ScriptedProvider::new(vec![
            crate::llm::recommendations::into_recommendation_set(&reply(json!([
                {"student_id": w.students[0], "supervisor_id": w.s1, "project_id": w.projects[0]}
            ])))
            .unwrap(),
            crate::llm::recommendations::into_recommendation_set(&reply(json!([
                {"student_id": w.students[2], "supervisor_id": w.s1, "project_id": w.projects[2]}
            ])))
            .unwrap(),
        ]);

        let report = engine.generate_with(provider.clone()).await;
        assert_eq!(provider.call_count(), 2);
        let inputs = provider.inputs.lock().unwrap();
        assert_eq!(inputs[0].projects.len(), 2);
        assert_eq!(inputs[0].students.len(), 2);
        assert_eq!(inputs[1].projects.len(), 1);
        assert_eq!(report.allocations.len(), 2);
        assert_eq!(report.recommendations.len(), 2);
        assert!(report.summary.as_ref().unwrap().is_array());
    }

    #[tokio::test]
    async fn test_fallback_after_llm_failure() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let config = AllocationConfig {
            max_retries: 0,
            fallback_to_rule_based: true,
            ..Default::default()
        };
        let engine = engine_with(pool, config);
        let provider = ScriptedProvider::new(vec![RecommendationSet::failed("OpenAI API request failed: 500")]);

        let report = engine.generate_with(provider).await;
        assert_eq!(report.errors, vec!["OpenAI API request failed: 500".to_string()]);
        assert_eq!(report.allocations.len(), 3);
        assert!(report.allocations.iter().all(|a| a.supervisor_id == w.s1));
        assert!(report.allocations.iter().all(|a| a.status == AllocationStatus::Pending));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_err() {
        let pool = setup_test_pool().await;
        let engine = engine_with(pool, no_retry());
        let err = engine.generate_allocations(Some("llama")).await.unwrap_err();
        assert!(matches!(err, AllotError::UnknownProvider(_)));
    }

    // ============================================================================
    // allocate_project (fallback)
    // ============================================================================

    #[tokio::test]
    async fn test_fallback_picks_full_match() {
        let pool = setup_test_pool().await;
        let (project, s1) = pool
            .interact(|conn| {
                let csc = seed_department(conn, "CSC");
                let eee = seed_department(conn, "EEE");
                let student = seed_student(conn, "Ada", Some(csc));
                let project = seed_project(conn, student, "Vision", &["A", "B"]);
                seed_supervisor(conn, "S2", Some(eee), 5, &["A"]);
                let s1 = seed_supervisor(conn, "S1", Some(csc), 5, &["A", "B"]);
                Ok((project, s1))
            })
            .await
            .unwrap();

        let engine = engine_with(pool, no_retry());
        let allocation = engine.allocate_project(project).await.unwrap();
        assert_eq!(allocation.supervisor_id, s1);
        assert_eq!(allocation.match_score, Some(100.0));
        assert_eq!(allocation.status, AllocationStatus::Pending);
    }

    #[tokio::test]
    async fn test_fallback_no_available_supervisor() {
        let pool = setup_test_pool().await;
        let project = pool
            .interact(|conn| {
                let student = seed_student(conn, "Ada", None);
                let project = seed_project(conn, student, "Vision", &[]);
                let other = seed_student(conn, "Bo", None);
                let op = seed_project(conn, other, "Old", &[]);
                let full = seed_supervisor(conn, "Full", None, 1, &[]);
                seed_allocation(conn, op, other, full, AllocationStatus::Approved);
                Ok(project)
            })
            .await
            .unwrap();

        let engine = engine_with(pool, no_retry());
        let err = engine.allocate_project(project).await.unwrap_err();
        assert!(matches!(err, AllotError::NoAvailableSupervisor));
    }

    #[tokio::test]
    async fn test_fallback_no_suitable_supervisor() {
        let pool = setup_test_pool().await;
        let project = pool
            .interact(|conn| {
                let student = seed_student(conn, "Ada", None);
                let earlier = seed_project(conn, student, "Earlier", &[]);
                let only = seed_supervisor(conn, "Only", None, 3, &[]);
                // the student is already paired with the only supervisor
                seed_allocation(conn, earlier, student, only, AllocationStatus::Rejected);
                Ok(seed_project(conn, student, "Second try", &[]))
            })
            .await
            .unwrap();

        let engine = engine_with(pool, no_retry());
        let err = engine.allocate_project(project).await.unwrap_err();
        assert!(matches!(err, AllotError::NoSuitableSupervisor));
    }

    #[tokio::test]
    async fn test_fallback_rejects_allocated_project() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let engine = engine_with(pool, no_retry());
        engine.allocate_project(w.projects[0]).await.unwrap();
        let err = engine.allocate_project(w.projects[0]).await.unwrap_err();
        assert!(matches!(err, AllotError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_fallback_missing_project() {
        let pool = setup_test_pool().await;
        let engine = engine_with(pool, no_retry());
        let err = engine.allocate_project(42).await.unwrap_err();
        assert!(matches!(err, AllotError::NotFound(_)));
    }

    // ============================================================================
    // reallocate_project
    // ============================================================================

    #[tokio::test]
    async fn test_reallocate_rescores_and_clears_allocated_at() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let (p, s, s1) = (w.projects[0], w.students[0], w.s1);
        let allocation_id = pool
            .interact(move |conn| Ok(seed_allocation(conn, p, s, s1, AllocationStatus::Approved)))
            .await
            .unwrap();

        let engine = engine_with(pool.clone(), no_retry());
        let moved = engine.reallocate_project(allocation_id, w.s2).await.unwrap();
        assert_eq!(moved.supervisor_id, w.s2);
        assert_eq!(moved.status, AllocationStatus::Reassigned);
        assert!(moved.allocated_at.is_none());
        // {AI} of {AI, Data}, no department, 1/1 spare
        assert!((moved.match_score.unwrap() - 45.0).abs() < 1e-9);

        let s1_load = pool.run(move |conn| approved_count_sync(conn, s1)).await.unwrap();
        assert_eq!(s1_load, 0);
    }

    #[tokio::test]
    async fn test_reallocate_to_full_supervisor_fails() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let (p0, st0, p1, st1, s1, s2) = (w.projects[0], w.students[0], w.projects[1], w.students[1], w.s1, w.s2);
        let allocation_id = pool
            .interact(move |conn| {
                seed_allocation(conn, p1, st1, s2, AllocationStatus::Approved);
                Ok(seed_allocation(conn, p0, st0, s1, AllocationStatus::Pending))
            })
            .await
            .unwrap();

        let engine = engine_with(pool, no_retry());
        let err = engine.reallocate_project(allocation_id, w.s2).await.unwrap_err();
        assert!(matches!(err, AllotError::SupervisorAtCapacity));
    }

    #[tokio::test]
    async fn test_reallocate_missing_rows() {
        let pool = setup_test_pool().await;
        let w = seed_world(&pool).await;
        let engine = engine_with(pool, no_retry());
        assert!(matches!(
            engine.reallocate_project(77, w.s1).await,
            Err(AllotError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_lock_serialises_runs() {
        let pool = setup_test_pool().await;
        seed_world(&pool).await;
        let engine = Arc::new(engine_with(pool, no_retry()));
        let provider = ScriptedProvider::slow(Duration::from_millis(50), RecommendationSet::failed("x"));

        let a = tokio::spawn({
            let (e, p) = (engine.clone(), provider.clone());
            async move { e.generate_with(p).await }
        });
        let b = tokio::spawn({
            let (e, p) = (engine.clone(), provider.clone());
            async move { e.generate_with(p).await }
        });
        a.await.unwrap();
        b.await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.peak_in_flight(), 1, "provider calls overlapped");
    }
}
