//! # Kompas CLI Module
//!
//! This module implements the CLI interface for Kompas.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show pipeline status
//! - `show` - Show one stage with its current calculations
//! - `edit` - Merge field updates into a stage draft
//! - `confirm` - Confirm a stage, publishing its baseline downstream
//! - `coefficient` - Compute the growth coefficient from four scores
//! - `roi` - Compute BD ROI for a channel spend
//! - `allocate` - Split a BD budget across the best channels
//! - `scenarios` - Generate what-if growth scenarios
//! - `bottlenecks` - Rank growth components weakest-first
//! - `channels` - Show the marketing channel reference table
//! - `init` - Initialize a new assessment database

mod commands;

use clap::{Parser, Subcommand};
use kompas_core::KompasError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Kompas - Growth Assessment Server
///
/// A guided self-assessment for business growth: four stages of
/// derived metrics, confirmed front to back, feeding a growth
/// coefficient and BD ROI model.
#[derive(Parser, Debug)]
#[command(name = "kompas")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the assessment database
    #[arg(short = 'D', long, global = true, default_value = "kompas.db")]
    pub database: PathBuf,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show pipeline status
    Status,

    /// Show one stage with its current calculations
    Show {
        /// Stage slug (revenue, human-capital, target-acquisition, bd-baseline)
        stage: String,
    },

    /// Merge field updates into a stage draft
    Edit {
        /// Stage slug (revenue, human-capital, target-acquisition, bd-baseline)
        stage: String,

        /// Field updates as field=value (camelCase field names, repeatable)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },

    /// Confirm a stage, publishing its baseline downstream
    Confirm {
        /// Stage slug (revenue, human-capital, target-acquisition, bd-baseline)
        stage: String,
    },

    /// Compute the growth coefficient from four component scores
    Coefficient {
        /// Business development score (0-100)
        #[arg(long)]
        bd: f64,

        /// Manpower cost efficiency score (0-100)
        #[arg(long)]
        manpower: f64,

        /// Founder engagement score (0-100)
        #[arg(long)]
        founder: f64,

        /// Expected customer growth (0-100)
        #[arg(long)]
        growth: f64,
    },

    /// Compute BD ROI for a monthly channel spend
    Roi {
        /// Monthly spend on the channel
        #[arg(short, long)]
        spend: f64,

        /// Channel wire name (e.g. GOOGLE_ADS, REFERRALS)
        #[arg(short, long)]
        channel: String,

        /// Average revenue from one closed deal
        #[arg(short, long)]
        deal_size: f64,
    },

    /// Split a BD budget across the most efficient channels
    Allocate {
        /// Total monthly budget to allocate
        #[arg(short, long)]
        budget: f64,

        /// Customer acquisition target
        #[arg(short, long, default_value = "0")]
        target: u64,
    },

    /// Generate what-if growth scenarios from four component scores
    Scenarios {
        /// Business development score (0-100)
        #[arg(long)]
        bd: f64,

        /// Manpower cost efficiency score (0-100)
        #[arg(long)]
        manpower: f64,

        /// Founder engagement score (0-100)
        #[arg(long)]
        founder: f64,

        /// Expected customer growth (0-100)
        #[arg(long)]
        growth: f64,
    },

    /// Rank growth components weakest-first
    Bottlenecks {
        /// Business development score (0-100)
        #[arg(long)]
        bd: f64,

        /// Manpower cost efficiency score (0-100)
        #[arg(long)]
        manpower: f64,

        /// Founder engagement score (0-100)
        #[arg(long)]
        founder: f64,

        /// Expected customer growth (0-100)
        #[arg(long)]
        growth: f64,
    },

    /// Show the marketing channel reference table
    Channels,

    /// Initialize a new empty assessment database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), KompasError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, backend, &host, port).await
        }
        Some(Commands::Status) => cmd_status(&cli.database, backend, json_mode),
        Some(Commands::Show { stage }) => cmd_show(&cli.database, backend, json_mode, &stage),
        Some(Commands::Edit { stage, set }) => {
            cmd_edit(&cli.database, backend, json_mode, &stage, &set)
        }
        Some(Commands::Confirm { stage }) => cmd_confirm(&cli.database, backend, json_mode, &stage),
        Some(Commands::Coefficient {
            bd,
            manpower,
            founder,
            growth,
        }) => cmd_coefficient(json_mode, bd, manpower, founder, growth),
        Some(Commands::Roi {
            spend,
            channel,
            deal_size,
        }) => cmd_roi(json_mode, spend, &channel, deal_size),
        Some(Commands::Allocate { budget, target }) => cmd_allocate(json_mode, budget, target),
        Some(Commands::Scenarios {
            bd,
            manpower,
            founder,
            growth,
        }) => cmd_scenarios(json_mode, bd, manpower, founder, growth),
        Some(Commands::Bottlenecks {
            bd,
            manpower,
            founder,
            growth,
        }) => cmd_bottlenecks(json_mode, bd, manpower, founder, growth),
        Some(Commands::Channels) => cmd_channels(json_mode),
        Some(Commands::Init { force }) => cmd_init(&cli.database, backend, force),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, backend, json_mode)
        }
    }
}
