// crates/allot-server/src/llm/anthropic/mod.rs
// Anthropic Messages API adapter

mod client;
mod types;

pub use client::AnthropicClient;
