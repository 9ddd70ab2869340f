//! # Funnel CLI Module
//!
//! ## Available Commands
//!
//! - `status` - Record counts and the acting role
//! - `role` - Switch the acting role
//! - `list` - Visible records of a section
//! - `submit` - Submit one record from a JSON file
//! - `import` / `export` - CSV bulk transfer
//! - `delete-employee` - Remove a directory entry
//! - `access` - Access matrix of the current role
//! - `serve` - Start the HTTP API
//! - `init` - Create a fresh database

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use funnel_core::{FunnelError, ImportMode, PromotionPolicy, Section, SessionSettings};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Funnel - role-gated CRM pipeline
///
/// Sales Activity -> Lead -> Opportunity -> Action Item, with automatic
/// promotion when a record qualifies.
#[derive(Parser, Debug)]
#[command(name = "funnel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./funnel.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the redb database
    #[arg(short = 'D', long, global = true, env = "FUNNEL_DATABASE")]
    pub database: Option<PathBuf>,

    /// Keep state in memory only for this invocation
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Default unreadable import cells instead of rejecting the batch
    #[arg(long, global = true)]
    pub lenient_import: bool,

    /// Promote qualifying records on every submission
    #[arg(long, global = true)]
    pub allow_repeat_promotion: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show record counts, the acting role and its regions
    Status,

    /// Switch the acting role (e.g. "Sales Head")
    Role {
        role: String,
    },

    /// List the records of a section visible to the acting role
    List {
        /// sales, leads, opportunities, actions or employees
        section: String,

        /// Case-insensitive search text
        #[arg(short = 'Q', long, default_value = "")]
        query: String,
    },

    /// Submit one record from a JSON object of form fields
    Submit {
        section: String,

        /// JSON file; an `id` naming an existing record edits it
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Append the rows of a CSV file to a section
    Import {
        section: String,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// Write selected records of a section to a CSV file
    Export {
        section: String,

        /// Comma-separated record IDs (all visible records when omitted)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Remove an employee from the directory
    DeleteEmployee {
        id: String,
    },

    /// Show which sections the acting role may use
    Access,

    /// Start the HTTP API
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new database with the default directory
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// RESOLVED OPTIONS
// =============================================================================

/// Flags and config merged into what a command needs.
#[derive(Debug, Clone)]
pub struct Context {
    pub database: PathBuf,
    pub ephemeral: bool,
    pub json_mode: bool,
    pub quiet: bool,
    pub settings: SessionSettings,
    pub config: Config,
}

impl Context {
    /// Merge `cli` over `config`. Flags win.
    #[must_use]
    pub fn resolve(cli: &Cli, config: Config) -> Self {
        let mut settings = config.settings();
        if cli.lenient_import {
            settings.import_mode = ImportMode::Lenient;
        }
        if cli.allow_repeat_promotion {
            settings.promotion = PromotionPolicy::Repeat;
        }
        Self {
            database: cli.database.clone().unwrap_or_else(|| config.database.clone()),
            ephemeral: cli.ephemeral,
            json_mode: cli.json_mode,
            quiet: cli.quiet,
            settings,
            config,
        }
    }
}

fn section(name: &str) -> Result<Section, FunnelError> {
    name.parse()
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), FunnelError> {
    let config = Config::load(cli.config.as_deref())?;
    let ctx = Context::resolve(&cli, config);
    if cli.verbose {
        tracing::info!(database = %ctx.database.display(), ephemeral = ctx.ephemeral, settings = ?ctx.settings, "resolved options");
    }

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            let host = host.unwrap_or_else(|| ctx.config.server.host.clone());
            let port = port.unwrap_or(ctx.config.server.port);
            cmd_serve(&ctx, &host, port).await
        }
        Some(Commands::Status) | None => cmd_status(&ctx),
        Some(Commands::Role { role }) => cmd_role(&ctx, &role),
        Some(Commands::List { section: name, query }) => cmd_list(&ctx, section(&name)?, &query),
        Some(Commands::Submit { section: name, file }) => cmd_submit(&ctx, section(&name)?, &file),
        Some(Commands::Import { section: name, file }) => cmd_import(&ctx, section(&name)?, &file),
        Some(Commands::Export {
            section: name,
            ids,
            out,
        }) => cmd_export(&ctx, section(&name)?, &ids, &out),
        Some(Commands::DeleteEmployee { id }) => cmd_delete_employee(&ctx, &id),
        Some(Commands::Access) => cmd_access(&ctx),
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
    }
}
