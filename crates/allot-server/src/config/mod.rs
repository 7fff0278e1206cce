// crates/allot-server/src/config/mod.rs
// Configuration: TOML file plus environment overrides

pub mod env;
pub mod file;

pub use env::{ApiKeys, ConfigValidation};
pub use file::{AllocationConfig, AllotConfig, LlmConfig, LoggingConfig, ProviderConfig};
