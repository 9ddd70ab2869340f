//! # Pipeline Primitives
//!
//! Hardcoded runtime constants for the Funnel CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! They cover three areas:
//!
//! 1. **Promotion Primitives**: the fixed texts and offsets used when a
//!    qualifying record synthesises its next-stage record.
//! 2. **Sink Primitives**: the notification capacity.
//! 3. **Format Primitives**: the persisted document envelope and input limits.

// =============================================================================
// PROMOTION PRIMITIVES
// =============================================================================

/// Assignee of every lead created from a qualified sale.
pub const PRESALES_GROUP: &str = "Presales Team";

/// Assignee of every kickoff action created from a won opportunity.
pub const DELIVERY_GROUP: &str = "Delivery Managers";

/// Next step written on a promoted lead.
pub const FEASIBILITY_NEXT_STEP: &str = "Awaiting Feasibility Check";

/// Next step of a promoted opportunity when the lead had none.
pub const SOW_NEXT_STEP: &str = "Execute SOW";

/// Remarks written on a kickoff action item.
pub const KICKOFF_REMARKS: &str = "Opportunity Closed Won. Initialize delivery resources.";

/// Days between a win and the kickoff action's due date.
pub const ACTION_DUE_DAYS: u64 = 5;

/// Days between today and a new opportunity's expected close.
pub const OPPORTUNITY_CLOSE_DAYS: u64 = 30;

/// Probability given to a freshly promoted opportunity.
pub const INITIAL_PROBABILITY: i64 = 10;

/// Display name used when no employee matches the acting role.
pub const FALLBACK_ACTOR_NAME: &str = "System User";

/// Country used by new drafts and lenient imports.
pub const DEFAULT_COUNTRY: &str = "United States";

/// E-mail domain of the default directory.
pub const DIRECTORY_DOMAIN: &str = "sightspectrum.com";

// =============================================================================
// SINK PRIMITIVES
// =============================================================================

/// Maximum number of notifications kept in the sink.
///
/// Older messages are dropped when a new one arrives.
pub const NOTIFICATION_CAPACITY: usize = 5;

// =============================================================================
// FORMAT PRIMITIVES
// =============================================================================

/// Name written in the `format` field of every persisted document.
pub const FORMAT_NAME: &str = "funnel";

/// Current persisted document version.
///
/// Increment this when making breaking changes to the document layout.
pub const FORMAT_VERSION: u32 = 1;

/// Lowest value the ID sequence resumes from.
pub const SEQUENCE_FLOOR: u64 = 1000;

/// Maximum size of one persisted document (64 MiB).
///
/// Documents larger than this are rejected before deserialization.
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

/// Maximum number of data rows accepted by one bulk import.
pub const MAX_IMPORT_ROWS: usize = 100_000;
