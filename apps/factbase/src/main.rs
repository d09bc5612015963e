//! # Factbase
//!
//! The command-line binary for the fact graph store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/factbase (THE BINARY)        │
//! │                                              │
//! │   ┌─────────────┐       ┌────────────────┐   │
//! │   │   CLI       │       │  TOML config   │   │
//! │   │  (clap)     │       │   (toml)       │   │
//! │   └──────┬──────┘       └───────┬────────┘   │
//! │          └──────────┬───────────┘            │
//! │                     ▼                        │
//! │             ┌───────────────┐                │
//! │             │ factbase-core │                │
//! │             │ (THE LOGIC)   │                │
//! │             └───────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! factbase check facts.ta
//! factbase status facts.ta --json-mode
//! factbase query facts.ta --name main -d out -r call
//! factbase ingest -r records.json -o facts.ta --hierarchy
//! factbase convert facts.ta facts.fbsn -t snapshot
//! ```

use clap::Parser;
use factbase::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // FACTBASE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("FACTBASE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "factbase=debug,factbase_core=debug"
    } else if cli.quiet {
        "factbase=warn,factbase_core=warn"
    } else {
        "factbase=info,factbase_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
