//! # funnel-core
//!
//! The pipeline engine for Funnel - THE LOGIC.
//!
//! This crate tracks records through the linear pipeline
//! Sales Activity -> Lead -> Opportunity -> Action Item, promoting a record
//! to the next stage when its status qualifies, and scoping what an actor
//! sees by role and region.
//!
//! ## Layout
//!
//! - `types`, `records`: the vocabulary and the five record kinds
//! - `store`: insertion-ordered collections, the ID sequence, `CrmState`
//! - `access`, `visibility`: who may use a section, and which records they see
//! - `drafts`, `promotion`, `forecast`: building records and the stage rules
//! - `ingestor`, `export`, `formats`: CSV and persisted documents
//! - `storage`, `session`: load/save backends and the application context
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Money and probability are integers; no floating point anywhere
//! - Every mutation goes through `Session` and is followed by a full save

// =============================================================================
// MODULES
// =============================================================================

pub mod access;
pub mod clock;
pub mod drafts;
pub mod export;
pub mod forecast;
pub mod formats;
pub mod ingestor;
pub mod notify;
pub mod primitives;
pub mod promotion;
pub mod records;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;
pub mod visibility;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use records::{
    ActionItem, Employee, Lead, Opportunity, Partner, Record, RemarkEntry, RemarkHistory, Sale,
};
pub use types::{
    ActionStatus, ActionType, Currency, EmployeeStatus, Feasibility, FunnelError, LeadType,
    Priority, Recommendation, RecordId, Region, Role, Section, Source, Stage, Status,
    ValidationError,
};

// =============================================================================
// RE-EXPORTS: Pipeline Engine
// =============================================================================

pub use access::{accessible_sections, can_access, fallback_section};
pub use clock::{Clock, FixedClock, SystemClock};
pub use drafts::{
    ActionItemDraft, DraftContext, EmployeeDraft, LeadDraft, OpportunityDraft, SaleDraft, overlay,
};
pub use export::{Exportable, export_csv, export_file_name};
pub use ingestor::{ImportMode, Ingestor};
pub use notify::NotificationSink;
pub use promotion::{PromotionContext, PromotionEngine, PromotionOutcome, PromotionPolicy};
pub use session::{ExportFile, Session, SessionSettings, StorageBackend, Submission, Summary};
pub use storage::{MemoryStore, RedbStore, StateStore};
pub use store::{Collection, CrmState, Sequence, default_directory};
pub use visibility::{Regional, Searchable, filter, filter_employees};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{DocumentHeader, decode_document, decode_state, encode_document, encode_state};
