// crates/allot-server/src/db/mod.rs
// Record store: SQLite via rusqlite behind a deadpool pool

pub mod allocations;
pub mod departments;
pub mod migration_helpers;
pub mod pool;
pub mod projects;
mod schema;
pub mod specializations;
pub mod students;
pub mod supervisors;
#[cfg(test)]
pub mod test_support;
mod types;

pub use allocations::*;
pub use departments::*;
pub use pool::DatabasePool;
pub use projects::*;
pub use specializations::*;
pub use students::*;
pub use supervisors::*;
pub use types::*;
