// crates/allot-server/src/llm/mod.rs
// LLM provider abstraction: adapters, factory, prompt and response parsing

mod adapter;
pub mod anthropic;
pub mod factory;
pub mod gemini;
pub mod http_client;
pub mod logging;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod recommendations;

#[cfg(test)]
pub(crate) mod test_server;

pub use factory::ProviderFactory;
pub use provider::{LlmProvider, Provider};
pub use recommendations::{Recommendation, RecommendationSet};
