// crates/allot-server/src/cli/admin.rs
// One-shot admin commands

use allot::allocation::AllocationAdmin;
use allot::allocation::admin::run_message;
use allot::config::{AllotConfig, ApiKeys};
use allot_types::AllocationStatus;
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::str::FromStr;

use super::Commands;
use super::serve::build_engine;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a non-server command against the configured store
pub async fn run_command(config: &AllotConfig, command: Commands) -> Result<()> {
    if let Commands::Check = command {
        println!("{}", config.validate().report());
        println!("API keys in environment: {}", ApiKeys::from_env().summary());
        return Ok(());
    }

    let admin = AllocationAdmin::new(build_engine(config).await?);

    match command {
        Commands::Allocate { provider } => {
            let report = admin.trigger_allocation(provider.as_deref()).await?;
            let name = provider.unwrap_or_else(|| config.llm.default_provider.clone());
            eprintln!("{}", run_message(&report, &name));
            print_json(&report)?;
        }
        Commands::Fallback { project_id } => {
            print_json(&admin.allocate_project(project_id).await?)?;
        }
        Commands::Reallocate {
            allocation_id,
            supervisor_id,
        } => {
            print_json(&admin.reallocate(allocation_id, supervisor_id).await?)?;
        }
        Commands::Approve {
            allocation_id,
            notes,
        } => {
            print_json(&admin.approve(allocation_id, notes).await?)?;
        }
        Commands::Reject {
            allocation_id,
            reason,
        } => {
            print_json(&admin.reject(allocation_id, &reason).await?)?;
        }
        Commands::Delete { allocation_id } => {
            admin.delete(allocation_id).await?;
            println!("Allocation {} deleted", allocation_id);
        }
        Commands::List { status } => {
            let status = status
                .as_deref()
                .map(AllocationStatus::from_str)
                .transpose()
                .map_err(|_| anyhow!("unknown status; use pending, approved, rejected or reassigned"))?;
            print_json(&admin.list_allocations(status).await?)?;
        }
        Commands::Stats => print_json(&admin.statistics().await?)?,
        Commands::Providers => print_json(&admin.provider_status())?,
        Commands::TestConnection { provider } => {
            let report = admin.test_connection(&provider).await;
            print_json(&report)?;
            if !report.success {
                return Err(anyhow!(report.message));
            }
        }
        Commands::Serve { .. } | Commands::Check => {}
    }
    Ok(())
}
