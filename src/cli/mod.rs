//! CLI module - Command-line interface for `VidJudge`
//!
//! Operator commands for bootstrapping and moderating accounts without going
//! through the web API.

mod commands;

use clap::{Parser, Subcommand};

/// `VidJudge` - account service for the video judging platform
#[derive(Parser)]
#[command(name = "vidjudge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web API server
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create a verified administrator account
    CreateAdmin {
        /// Email address of the admin
        email: String,
        /// Username of the admin
        username: String,
        /// Password; read from VIDJUDGE_ADMIN_PASSWORD when omitted
        #[arg(long, env = "VIDJUDGE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List judges waiting for approval
    #[command(alias = "pending")]
    PendingJudges,

    /// Approve one or more pending judges
    #[command(alias = "approve")]
    ApproveJudge {
        /// Account IDs to approve
        #[arg(required = true)]
        ids: Vec<i32>,
    },

    /// List reactivation requests
    Reactivations {
        /// pending, approved, denied or all
        #[arg(long, default_value = "pending")]
        status: String,
    },

    /// Approve or deny a pending reactivation request
    ReviewReactivation {
        /// Request ID
        id: i32,
        /// approve or deny
        #[arg(value_parser = ["approve", "deny"])]
        decision: String,
        /// Email of the reviewing admin
        #[arg(long)]
        reviewer: String,
        /// Notes stored with the decision
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Delete expired and used tokens
    PurgeTokens,
}

pub use commands::*;
