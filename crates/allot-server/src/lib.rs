// crates/allot-server/src/lib.rs
// Allot - project allocation engine with LLM-assisted matching

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod allocation;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod llm;
pub mod web;
pub use error::{AllotError, Result};
