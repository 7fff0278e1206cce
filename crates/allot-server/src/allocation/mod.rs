// crates/allot-server/src/allocation/mod.rs
// Allocation engine, fallback scorer, statistics and admin operations

pub mod admin;
pub mod engine;
pub mod input;
pub mod scoring;
pub mod statistics;

pub use admin::{AllocationAdmin, ManualAllocation};
pub use engine::AllocationEngine;
pub use input::AllocationInput;
