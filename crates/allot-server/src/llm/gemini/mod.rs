// crates/allot-server/src/llm/gemini/mod.rs
// Google Gemini adapter

mod client;
mod types;

pub use client::GeminiClient;
