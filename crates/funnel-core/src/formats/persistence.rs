//! # Persistence Format
//!
//! Self-describing JSON documents for the persisted state.
//!
//! Every blob is wrapped in an envelope:
//!
//! ```text
//! {"format":"funnel","version":1,"data":<payload>}
//! ```
//!
//! The envelope is validated before the payload is deserialized, and
//! documents larger than `MAX_DOCUMENT_SIZE` are rejected unread.
//! Storage I/O is the backend's job; this module is pure transformation.

use crate::primitives::{FORMAT_NAME, FORMAT_VERSION, MAX_DOCUMENT_SIZE};
use crate::records::Employee;
use crate::store::{Collection, CrmState, Sequence, default_directory};
use crate::types::{FunnelError, Role};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// =============================================================================
// KEYS
// =============================================================================

pub const KEY_SALES: &str = "crm_sales";
pub const KEY_LEADS: &str = "crm_leads";
pub const KEY_OPPORTUNITIES: &str = "crm_opportunities";
pub const KEY_ACTIONS: &str = "crm_actions";
pub const KEY_EMPLOYEES: &str = "crm_employees";
pub const KEY_USER_ROLE: &str = "crm_user_role";
pub const KEY_SEQUENCE: &str = "crm_sequence";

/// Every key written by a full save, in write order.
pub const ALL_KEYS: [&str; 7] = [
    KEY_SALES,
    KEY_LEADS,
    KEY_OPPORTUNITIES,
    KEY_ACTIONS,
    KEY_EMPLOYEES,
    KEY_USER_ROLE,
    KEY_SEQUENCE,
];

// =============================================================================
// DOCUMENT HEADER
// =============================================================================

/// The envelope fields that precede every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub format: String,
    pub version: u32,
}

impl DocumentHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), FunnelError> {
        if self.format != FORMAT_NAME {
            return Err(FunnelError::StorageError(format!(
                "Invalid document format: {:?}",
                self.format
            )));
        }
        if self.version != FORMAT_VERSION {
            return Err(FunnelError::StorageError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }
}

impl Default for DocumentHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    #[serde(flatten)]
    header: DocumentHeader,
    data: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
    data: T,
}

// =============================================================================
// DOCUMENT FUNCTIONS
// =============================================================================

/// Wrap `data` in a versioned envelope.
pub fn encode_document<T: Serialize>(data: &T) -> Result<String, FunnelError> {
    let envelope = EnvelopeOut {
        header: DocumentHeader::new(),
        data,
    };
    serde_json::to_string(&envelope).map_err(|e| FunnelError::StorageError(e.to_string()))
}

/// Validate the envelope and deserialize its payload.
pub fn decode_document<T: DeserializeOwned>(text: &str) -> Result<T, FunnelError> {
    if text.len() > MAX_DOCUMENT_SIZE {
        return Err(FunnelError::StorageError(format!(
            "Document too large: {} bytes (max {})",
            text.len(),
            MAX_DOCUMENT_SIZE
        )));
    }

    let header: DocumentHeader =
        serde_json::from_str(text).map_err(|e| FunnelError::StorageError(e.to_string()))?;
    header.validate()?;

    let envelope: EnvelopeIn<T> =
        serde_json::from_str(text).map_err(|e| FunnelError::StorageError(e.to_string()))?;
    Ok(envelope.data)
}

// =============================================================================
// STATE FUNCTIONS
// =============================================================================

/// Encode every blob of `state` as `(key, document)` pairs.
pub fn encode_state(state: &CrmState) -> Result<Vec<(&'static str, String)>, FunnelError> {
    Ok(vec![
        (KEY_SALES, encode_document(&state.sales)?),
        (KEY_LEADS, encode_document(&state.leads)?),
        (KEY_OPPORTUNITIES, encode_document(&state.opportunities)?),
        (KEY_ACTIONS, encode_document(&state.actions)?),
        (KEY_EMPLOYEES, encode_document(&state.employees)?),
        (KEY_USER_ROLE, encode_document(&state.role)?),
        (KEY_SEQUENCE, encode_document(&state.sequence)?),
    ])
}

/// Rebuild state from stored documents.
///
/// `fetch` returns the document under a key, or `None` when the key was
/// never written. Missing collections load empty, a missing directory loads
/// the default employees, a missing role loads Super Admin, and the
/// sequence always resumes past the highest ID suffix present.
pub fn decode_state<F>(mut fetch: F) -> Result<CrmState, FunnelError>
where
    F: FnMut(&str) -> Result<Option<String>, FunnelError>,
{
    fn blob<T, F>(fetch: &mut F, key: &str) -> Result<Option<T>, FunnelError>
    where
        T: DeserializeOwned,
        F: FnMut(&str) -> Result<Option<String>, FunnelError>,
    {
        fetch(key)?.map(|text| decode_document(&text)).transpose()
    }

    let employees: Option<Collection<Employee>> = blob(&mut fetch, KEY_EMPLOYEES)?;
    let mut state = CrmState {
        sales: blob(&mut fetch, KEY_SALES)?.unwrap_or_default(),
        leads: blob(&mut fetch, KEY_LEADS)?.unwrap_or_default(),
        opportunities: blob(&mut fetch, KEY_OPPORTUNITIES)?.unwrap_or_default(),
        actions: blob(&mut fetch, KEY_ACTIONS)?.unwrap_or_default(),
        employees: employees.unwrap_or_else(|| Collection::from_records(default_directory())),
        role: blob::<Role, _>(&mut fetch, KEY_USER_ROLE)?.unwrap_or_default(),
        sequence: blob::<Sequence, _>(&mut fetch, KEY_SEQUENCE)?.unwrap_or_default(),
    };
    state.resume_sequence();
    Ok(state)
}
