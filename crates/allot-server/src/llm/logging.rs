// crates/allot-server/src/llm/logging.rs
// Shared LLM logging helpers used by every provider adapter

use crate::config::LoggingConfig;
use tracing::{debug, info};

/// Log token usage when the vendor reports it.
pub fn log_usage(request_id: &str, provider: &str, prompt_tokens: u32, completion_tokens: u32) {
    info!(
        request_id = %request_id,
        prompt_tokens = prompt_tokens,
        completion_tokens = completion_tokens,
        total_tokens = prompt_tokens + completion_tokens,
        "{} usage stats", provider
    );
}

/// Log completion summary for an allocation request.
pub fn log_completion(
    request_id: &str,
    provider: &str,
    duration_ms: u64,
    content_len: usize,
    allocation_count: usize,
    error_count: usize,
) {
    info!(
        request_id = %request_id,
        duration_ms = duration_ms,
        content_len = content_len,
        allocations = allocation_count,
        errors = error_count,
        "{} allocation request complete", provider
    );
}

/// Log the outgoing prompt, only when `logging.log_prompts` is set.
pub fn log_prompt(logging: &LoggingConfig, request_id: &str, provider: &str, prompt: &str) {
    if logging.log_prompts {
        debug!(request_id = %request_id, prompt_len = prompt.len(), "{} prompt:\n{}", provider, prompt);
    }
}

/// Log the raw model text, only when `logging.log_responses` is set.
pub fn log_response(logging: &LoggingConfig, request_id: &str, provider: &str, text: &str) {
    if logging.log_responses {
        debug!(request_id = %request_id, "{} raw response:\n{}", provider, text);
    }
}
