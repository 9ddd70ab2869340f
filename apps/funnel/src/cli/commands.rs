//! # CLI Command Implementations
//!
//! Each command opens a session, performs one operation and prints the
//! result as text or, with `--json-mode`, as JSON.

use super::Context;
use crate::api;
use funnel_core::{
    CrmState, FunnelError, RecordId, RedbStore, Role, Section, Session, StateStore,
    StorageBackend, SystemClock, accessible_sections, can_access,
    primitives::MAX_DOCUMENT_SIZE,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of a CSV import or JSON submission file (64 MiB).
const MAX_INPUT_FILE_SIZE: u64 = MAX_DOCUMENT_SIZE as u64;

/// Resolve `path` to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, FunnelError> {
    let canonical = path.canonicalize().map_err(|e| {
        FunnelError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(FunnelError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Read a bounded input file as text.
fn read_input(path: &Path) -> Result<String, FunnelError> {
    let path = validate_file_path(path)?;
    let metadata = std::fs::metadata(&path)
        .map_err(|e| FunnelError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(FunnelError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_INPUT_FILE_SIZE
        )));
    }
    std::fs::read_to_string(&path)
        .map_err(|e| FunnelError::IoError(format!("Read {}: {}", path.display(), e)))
}

/// Resolve an output directory.
fn validate_output_dir(dir: &Path) -> Result<PathBuf, FunnelError> {
    let canonical = dir.canonicalize().map_err(|e| {
        FunnelError::IoError(format!("Invalid output directory '{}': {}", dir.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(FunnelError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            dir.display()
        )));
    }
    Ok(canonical)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_json(value: &impl Serialize) -> Result<(), FunnelError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| FunnelError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn print_notifications(ctx: &Context, session: &Session) {
    if ctx.quiet {
        return;
    }
    // Oldest first, so the newest lands last on the terminal
    let mut messages = session.notifications().to_vec();
    messages.reverse();
    for message in messages {
        println!("  * {}", message);
    }
}

fn join_regions(regions: &[funnel_core::Region]) -> String {
    regions
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One text line per visible record.
fn describe(session: &Session, section: Section, query: &str) -> Vec<String> {
    match section {
        Section::Sales => session
            .visible_sales(query)
            .into_iter()
            .map(|s| {
                format!(
                    "{}  {}  {}  [{}]  {}",
                    s.id, s.date, s.client_name, s.region, s.status
                )
            })
            .collect(),
        Section::Leads => session
            .visible_leads(query)
            .into_iter()
            .map(|l| {
                format!(
                    "{}  {}  {}  [{}]  {}",
                    l.id, l.name, l.company_name, l.region, l.status
                )
            })
            .collect(),
        Section::Opportunities => session
            .visible_opportunities(query)
            .into_iter()
            .map(|o| {
                format!(
                    "{}  {}  {}  [{}]  {} {}%  {} {} (expected {})",
                    o.id,
                    o.name,
                    o.account_name,
                    o.region,
                    o.stage,
                    o.probability,
                    o.currency,
                    o.value,
                    o.expected_revenue
                )
            })
            .collect(),
        Section::Actions => session
            .visible_actions(query)
            .into_iter()
            .map(|a| {
                format!(
                    "{}  due {}  {}  -> {} {}  {}  {}",
                    a.id, a.due_date, a.subject, a.action_type, a.linked_record_id, a.priority, a.status
                )
            })
            .collect(),
        Section::Employees => session
            .visible_employees(query)
            .into_iter()
            .map(|e| {
                format!(
                    "{}  {} <{}>  {}  {}  [{}]",
                    e.id,
                    e.name,
                    e.email,
                    e.role,
                    e.status,
                    join_regions(&e.regions)
                )
            })
            .collect(),
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Open the session the flags and config point at.
pub fn open_session(ctx: &Context) -> Result<Session, FunnelError> {
    let backend = if ctx.ephemeral {
        StorageBackend::default()
    } else {
        StorageBackend::redb(&ctx.database)?
    };
    Session::open(backend, Arc::new(SystemClock), ctx.settings)
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP API.
pub async fn cmd_serve(ctx: &Context, host: &str, port: u16) -> Result<(), FunnelError> {
    let session = open_session(ctx)?;

    if !ctx.quiet {
        println!("Funnel CRM API Starting...");
        println!();
        println!("Configuration:");
        println!("  Host:      {}", host);
        println!("  Port:      {}", port);
        if ctx.ephemeral {
            println!("  Storage:   in-memory");
        } else {
            println!("  Database:  {}", ctx.database.display());
        }
        println!("  Import:    {:?}", ctx.settings.import_mode);
        println!("  Promotion: {:?}", ctx.settings.promotion);
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, session).await
}

// =============================================================================
// STATUS / ROLE / ACCESS
// =============================================================================

/// Show record counts and the acting role.
pub fn cmd_status(ctx: &Context) -> Result<(), FunnelError> {
    let session = open_session(ctx)?;
    let summary = session.summary();

    if ctx.json_mode {
        return print_json(&summary);
    }

    println!("Funnel Status");
    println!("=============");
    if ctx.ephemeral {
        println!("Storage:  in-memory");
    } else {
        println!("Database: {}", ctx.database.display());
    }
    println!("Role:     {}", summary.role);
    println!("Actor:    {}", summary.actor);
    println!("Regions:  {}", join_regions(&summary.regions));
    println!("Section:  {}", summary.section.label());
    println!();
    for (section, count) in &summary.counts {
        println!("{:<15} {}", section.label(), count);
    }
    Ok(())
}

/// Switch the acting role.
pub fn cmd_role(ctx: &Context, role: &str) -> Result<(), FunnelError> {
    let role: Role = role.parse()?;
    let mut session = open_session(ctx)?;
    let section = session.switch_role(role)?;

    if ctx.json_mode {
        return print_json(&serde_json::json!({
            "role": role,
            "actor": session.actor_name(),
            "section": section,
        }));
    }
    println!("Acting as {} ({})", session.actor_name(), role);
    println!("Section:  {}", section.label());
    Ok(())
}

/// Show which sections the acting role may use.
pub fn cmd_access(ctx: &Context) -> Result<(), FunnelError> {
    let session = open_session(ctx)?;
    let role = session.role();

    if ctx.json_mode {
        return print_json(&serde_json::json!({
            "role": role,
            "sections": accessible_sections(role),
        }));
    }
    println!("Access for {}", role);
    for section in Section::ALL {
        let mark = if can_access(role, section) { "yes" } else { "no" };
        println!("  {:<15} {}", section.label(), mark);
    }
    Ok(())
}

// =============================================================================
// RECORD COMMANDS
// =============================================================================

/// List visible records.
pub fn cmd_list(ctx: &Context, section: Section, query: &str) -> Result<(), FunnelError> {
    let session = open_session(ctx)?;
    session.ensure_access(section)?;

    if ctx.json_mode {
        return print_json(&session.visible_json(section, query)?);
    }
    let lines = describe(&session, section, query);
    if lines.is_empty() && !ctx.quiet {
        println!("No {} visible.", section.label().to_lowercase());
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Submit one record from a JSON file.
pub fn cmd_submit(ctx: &Context, section: Section, file: &Path) -> Result<(), FunnelError> {
    let text = read_input(file)?;
    let patch: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| FunnelError::SerializationError(format!("Invalid JSON: {}", e)))?;

    let mut session = open_session(ctx)?;
    let submission = session.submit_json(section, patch)?;

    if ctx.json_mode {
        return print_json(&serde_json::json!({
            "id": submission.id,
            "replaced": submission.replaced,
            "promoted": submission.promotion.as_ref().map(|p| serde_json::json!({
                "section": p.section,
                "id": p.id,
            })),
            "notifications": session.notifications().to_vec(),
        }));
    }
    let verb = if submission.replaced { "Updated" } else { "Created" };
    println!("{} {} {}", verb, section.record_name(), submission.id);
    if let Some(promotion) = &submission.promotion {
        println!(
            "Promoted to {} {}",
            promotion.section.record_name(),
            promotion.id
        );
    }
    print_notifications(ctx, &session);
    Ok(())
}

/// Append the rows of a CSV file.
pub fn cmd_import(ctx: &Context, section: Section, file: &Path) -> Result<(), FunnelError> {
    let text = read_input(file)?;
    let mut session = open_session(ctx)?;
    let count = session.import(section, &text)?;

    if ctx.json_mode {
        return print_json(&serde_json::json!({
            "section": section,
            "imported": count,
        }));
    }
    print_notifications(ctx, &session);
    if ctx.quiet {
        println!("{}", count);
    }
    Ok(())
}

/// Write selected records to `<out>/<kind>_export_<timestamp>.csv`.
pub fn cmd_export(ctx: &Context, section: Section, ids: &[String], out: &Path) -> Result<(), FunnelError> {
    let dir = validate_output_dir(out)?;
    let session = open_session(ctx)?;
    let ids: Vec<RecordId> = if ids.is_empty() {
        session.visible_ids(section, "")
    } else {
        ids.iter().map(|id| RecordId::new(id.trim())).collect()
    };

    let file = session.export(section, &ids)?;
    let path = dir.join(&file.file_name);
    std::fs::write(&path, &file.content)
        .map_err(|e| FunnelError::IoError(format!("Write {}: {}", path.display(), e)))?;
    tracing::info!(section = %section, count = file.count, path = %path.display(), "exported records");

    if ctx.json_mode {
        return print_json(&serde_json::json!({
            "path": path.to_string_lossy(),
            "count": file.count,
        }));
    }
    println!("Exported {} records to {}", file.count, path.display());
    Ok(())
}

/// Remove an employee.
pub fn cmd_delete_employee(ctx: &Context, id: &str) -> Result<(), FunnelError> {
    let mut session = open_session(ctx)?;
    let removed = session.delete_employee(&RecordId::new(id))?;

    if ctx.json_mode {
        return print_json(&removed);
    }
    println!("Removed {} ({})", removed.name, removed.id);
    print_notifications(ctx, &session);
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create a database holding only the default directory.
pub fn cmd_init(ctx: &Context, force: bool) -> Result<(), FunnelError> {
    if ctx.ephemeral {
        return Err(FunnelError::IoError(
            "Nothing to initialize with --ephemeral".to_string(),
        ));
    }
    let path = &ctx.database;
    if path.exists() {
        if !force {
            return Err(FunnelError::IoError(format!(
                "Database {} already exists. Use --force to overwrite.",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .map_err(|e| FunnelError::IoError(format!("Remove {}: {}", path.display(), e)))?;
    }

    let mut store = RedbStore::open(path)?;
    store.save(&CrmState::with_default_directory())?;
    tracing::info!(path = %path.display(), "initialized database");
    println!("Initialized new database at {}", path.display());
    Ok(())
}
