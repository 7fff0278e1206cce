// crates/allot-server/src/llm/adapter.rs
// Request lifecycle shared by the vendor adapters

use std::future::Future;
use std::time::Instant;
use tracing::{info, warn};

use super::logging::{log_completion, log_prompt, log_response};
use super::prompt::build_allocation_prompt;
use super::recommendations::{RecommendationSet, into_recommendation_set};
use crate::allocation::input::AllocationInput;
use crate::config::LoggingConfig;

/// Build the prompt, run `send`, parse the model text.
///
/// `send` receives the prompt and returns the extracted model text; any
/// error it reports becomes the set's single error.
pub(crate) async fn run_allocation_request<F, Fut>(
    vendor: &str,
    request_id: &str,
    logging: &LoggingConfig,
    input: &AllocationInput,
    send: F,
) -> RecommendationSet
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = anyhow::Result<String>>,
{
    let start_time = Instant::now();
    info!(
        request_id = %request_id,
        students = input.students.len(),
        projects = input.projects.len(),
        supervisors = input.supervisors.len(),
        "Starting {} allocation request", vendor
    );

    let prompt = build_allocation_prompt(input);
    log_prompt(logging, request_id, vendor, &prompt);

    let (set, content_len) = match send(prompt).await {
        Ok(text) => {
            log_response(logging, request_id, vendor, &text);
            let len = text.len();
            let set = into_recommendation_set(&text).unwrap_or_else(RecommendationSet::failed);
            (set, len)
        }
        Err(e) => (RecommendationSet::failed(e.to_string()), 0),
    };

    if !set.is_ok() {
        warn!(
            request_id = %request_id,
            error = ?set.errors,
            students_count = input.students.len(),
            projects_count = input.projects.len(),
            supervisors_count = input.supervisors.len(),
            "{} allocation generation failed", vendor
        );
    }

    log_completion(
        request_id,
        vendor,
        start_time.elapsed().as_millis() as u64,
        content_len,
        set.allocations.len(),
        set.errors.len(),
    );
    set
}
