//! # Funnel - CRM Pipeline
//!
//! The main binary: CLI commands and the HTTP API over `funnel-core`.
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP API
//! funnel serve --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! funnel status
//! funnel role "Sales Head"
//! funnel list opportunities --query acme
//! funnel submit sales --file sale.json
//! funnel import leads --file leads.csv
//! ```

use clap::Parser;
use funnel::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // FUNNEL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("FUNNEL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "funnel=info,tower_http=debug".into());

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
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
