// crates/allot-server/src/web/state.rs
// Web server state management

use std::sync::Arc;

use crate::allocation::{AllocationAdmin, AllocationEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub admin: AllocationAdmin,
}

impl AppState {
    pub fn new(engine: Arc<AllocationEngine>) -> Self {
        Self {
            admin: AllocationAdmin::new(engine),
        }
    }
}
