// crates/allot-server/src/llm/openai/mod.rs
// OpenAI chat completions adapter

mod client;
mod types;

pub use client::OpenAiClient;
