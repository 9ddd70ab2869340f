//! # Storage
//!
//! Backends that load and save the whole `CrmState`.
//!
//! - `MemoryStore`: encoded documents held in memory (tests, ephemeral runs)
//! - `RedbStore`: documents in a `redb` table on disk
//!
//! Both keep the same envelope documents, so a state that round-trips
//! through one round-trips through the other.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::store::CrmState;
use crate::types::FunnelError;

/// Load-everything, save-everything persistence seam.
pub trait StateStore {
    /// Read the full state. Missing documents load their defaults.
    fn load(&self) -> Result<CrmState, FunnelError>;

    /// Write the full state.
    fn save(&mut self, state: &CrmState) -> Result<(), FunnelError>;
}
