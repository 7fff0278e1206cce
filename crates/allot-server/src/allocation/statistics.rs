// crates/allot-server/src/allocation/statistics.rs
// Allocation statistics reporter

use allot_types::{AllocationStatistics, AllocationStatus, ProjectStatus};
use rusqlite::Connection;

use crate::db::{
    DatabasePool, average_match_score_sync, count_allocations_by_status_sync,
    count_projects_by_status_sync,
};
use crate::error::Result;

/// Counts, rate and mean score over the whole store
pub fn compute_statistics_sync(conn: &Connection) -> rusqlite::Result<AllocationStatistics> {
    let total_projects = count_projects_by_status_sync(conn, ProjectStatus::Submitted)?;
    let allocated_projects = count_allocations_by_status_sync(conn, AllocationStatus::Approved)?;
    let pending_allocations = count_allocations_by_status_sync(conn, AllocationStatus::Pending)?;
    let average = average_match_score_sync(conn)?.unwrap_or(0.0);

    let allocation_rate = if total_projects > 0 {
        allocated_projects as f64 / total_projects as f64 * 100.0
    } else {
        0.0
    };

    Ok(AllocationStatistics {
        total_projects,
        allocated_projects,
        pending_allocations,
        allocation_rate,
        average_match_score: round2(average),
    })
}

pub async fn get_statistics(pool: &DatabasePool) -> Result<AllocationStatistics> {
    pool.run(compute_statistics_sync).await
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
