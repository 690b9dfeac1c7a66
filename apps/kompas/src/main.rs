//! # Kompas - Growth Assessment Server
//!
//! The main binary for the Kompas guided business-growth assessment.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for the assessment pipeline and formula library
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/kompas (THE BINARY)              │
//! │                                                      │
//! │     ┌─────────────┐         ┌─────────────┐         │
//! │     │   CLI       │         │   HTTP API  │         │
//! │     │  (clap)     │         │   (axum)    │         │
//! │     └──────┬──────┘         └──────┬──────┘         │
//! │            │                       │                 │
//! │            └───────────┬───────────┘                 │
//! │                        ▼                             │
//! │                ┌───────────────┐                     │
//! │                │  kompas-core  │                     │
//! │                │  (THE LOGIC)  │                     │
//! │                └───────────────┘                     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! kompas server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! kompas status
//! kompas edit revenue --set avgGrossPerUnit=2500 --set totalCustomers=15
//! kompas confirm revenue
//! kompas coefficient --bd 80 --manpower 60 --founder 70 --growth 50
//! ```

use clap::Parser;
use kompas::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — KOMPAS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("KOMPAS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kompas=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Kompas startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗  ██╗ ██████╗ ███╗   ███╗██████╗  █████╗ ███████╗
  ██║ ██╔╝██╔═══██╗████╗ ████║██╔══██╗██╔══██╗██╔════╝
  █████╔╝ ██║   ██║██╔████╔██║██████╔╝███████║███████╗
  ██╔═██╗ ██║   ██║██║╚██╔╝██║██╔═══╝ ██╔══██║╚════██║
  ██║  ██╗╚██████╔╝██║ ╚═╝ ██║██║     ██║  ██║███████║
  ╚═╝  ╚═╝ ╚═════╝ ╚═╝     ╚═╝╚═╝     ╚═╝  ╚═╝╚══════╝

  Growth Assessment Server v{}

  Deterministic • Staged • Recomputed
"#,
        env!("CARGO_PKG_VERSION")
    );
}
