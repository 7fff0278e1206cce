// crates/allot-server/src/cli/mod.rs
// CLI module for Allot commands

use clap::{Parser, Subcommand};

pub mod admin;
pub mod serve;

pub use admin::run_command;
pub use serve::run_web_server;

#[derive(Parser)]
#[command(name = "allot")]
#[command(about = "Student/supervisor project allocation with LLM-assisted matching")]
#[command(version)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the admin HTTP API (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000", env = "ALLOT_PORT")]
        port: u16,
    },

    /// Allocate every submitted project through an LLM provider
    Allocate {
        /// Provider name (gemini, openai, anthropic); defaults to the configured one
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Rule-based allocation of a single project
    Fallback {
        /// Project id
        project_id: i64,
    },

    /// Move an allocation to another supervisor
    Reallocate {
        allocation_id: i64,
        supervisor_id: i64,
    },

    /// Approve a pending allocation
    Approve {
        allocation_id: i64,

        /// Optional note stored on the allocation
        #[arg(long)]
        notes: Option<String>,
    },

    /// Reject an allocation
    Reject {
        allocation_id: i64,

        /// Reason shown to the student
        #[arg(short, long)]
        reason: String,
    },

    /// Delete an allocation
    Delete { allocation_id: i64 },

    /// List allocations, newest first
    List {
        /// Filter by status (pending, approved, rejected, reassigned)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show allocation statistics
    Stats,

    /// Show provider configuration status
    Providers,

    /// Send a synthetic request to a provider
    TestConnection {
        /// Provider name
        provider: String,
    },

    /// Validate configuration and show which API keys are set
    Check,
}
