//! # Factbase CLI Module
//!
//! This module implements the CLI interface for Factbase.
//!
//! ## Available Commands
//!
//! - `check` - Parse a fact base and report what it contains
//! - `status` - Show node and edge counts per kind
//! - `query` - Look up a node by id or name and list its edges
//! - `ingest` - Replay extractor records into a fact base
//! - `convert` - Convert between TA text and binary snapshots

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use factbase_core::{EdgeKind, FactError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Factbase - fact graph store for software architecture recovery
///
/// Reads, checks and writes Tuple-Attribute fact bases.
#[derive(Parser, Debug)]
#[command(name = "factbase")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the entity relation name
    #[arg(long, global = true)]
    pub entity_relation: Option<String>,

    /// Do not create File containers
    #[arg(long, global = true)]
    pub no_files: bool,

    /// Do not create Subsystem containers
    #[arg(long, global = true)]
    pub no_subsystems: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Direction of edges listed by `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Out,
    In,
    Both,
}

/// Output encoding for `convert` and `ingest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tuple-Attribute text
    Ta,
    /// Binary snapshot
    Snapshot,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a fact base and report load statistics
    Check {
        /// TA file or snapshot
        file: PathBuf,
    },

    /// Show node and edge counts per kind
    Status {
        /// TA file or snapshot
        file: PathBuf,
    },

    /// Look up a node and list its edges
    Query {
        /// TA file or snapshot
        file: PathBuf,

        /// Node id
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        id: Option<String>,

        /// Display name (may match several nodes)
        #[arg(long)]
        name: Option<String>,

        /// Which edges to list
        #[arg(short, long, value_enum, default_value = "both")]
        direction: Direction,

        /// Restrict edges to one relation tag (e.g. `call`)
        #[arg(short, long)]
        relation: Option<String>,
    },

    /// Replay JSON extractor records into a fact base
    Ingest {
        /// JSON array of records
        #[arg(short, long)]
        records: PathBuf,

        /// Existing fact base to extend
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Build file/subsystem containers and attach nodes to them
        #[arg(long)]
        hierarchy: bool,

        /// Output format
        #[arg(short = 't', long, value_enum, default_value = "ta")]
        format: OutputFormat,
    },

    /// Convert a fact base between TA text and snapshot
    Convert {
        /// TA file or snapshot
        input: PathBuf,

        /// Output path
        output: PathBuf,

        /// Output format
        #[arg(short = 't', long, value_enum, default_value = "ta")]
        format: OutputFormat,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), FactError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Check { file } => cmd_check(&file, &config, json_mode),
        Commands::Status { file } => cmd_status(&file, &config, json_mode),
        Commands::Query {
            file,
            id,
            name,
            direction,
            relation,
        } => {
            let relation = relation
                .map(|tag| {
                    EdgeKind::from_tag(&tag)
                        .ok_or_else(|| FactError::Config(format!("unknown relation `{}`", tag)))
                })
                .transpose()?;
            let selector = match (id, name) {
                (Some(id), _) => NodeSelector::Id(id),
                (None, Some(name)) => NodeSelector::Name(name),
                (None, None) => {
                    return Err(FactError::Config(
                        "query needs --id or --name".to_string(),
                    ));
                }
            };
            cmd_query(&file, &config, json_mode, &selector, direction, relation)
        }
        Commands::Ingest {
            records,
            base,
            output,
            hierarchy,
            format,
        } => cmd_ingest(
            &records,
            base.as_deref(),
            &output,
            &config,
            json_mode,
            hierarchy,
            format,
        ),
        Commands::Convert {
            input,
            output,
            format,
        } => cmd_convert(&input, &output, &config, json_mode, format),
    }
}

/// Load the configuration file, if any, then apply flag overrides.
pub fn resolve_config(cli: &Cli) -> Result<factbase_core::FactConfig, FactError> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(relation) = &cli.entity_relation {
        config.entity_relation.clone_from(relation);
    }
    if cli.no_files {
        config.include_files = false;
    }
    if cli.no_subsystems {
        config.include_subsystems = false;
    }
    config.validate()?;
    Ok(config)
}
