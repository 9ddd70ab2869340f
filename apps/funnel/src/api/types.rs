//! # API Request/Response Types
//!
//! JSON bodies of the HTTP API, and the mapping from `FunnelError` to
//! status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use funnel_core::{ExportFile, FunnelError, Region, Role, Section, Submission, Summary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Session summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub role: Role,
    pub actor: String,
    pub regions: Vec<Region>,
    pub section: Section,
    pub counts: BTreeMap<Section, usize>,
    pub persistent: bool,
}

impl StatusResponse {
    #[must_use]
    pub fn from_summary(summary: Summary, persistent: bool) -> Self {
        Self {
            role: summary.role,
            actor: summary.actor,
            regions: summary.regions,
            section: summary.section,
            counts: summary.counts.into_iter().collect(),
            persistent,
        }
    }
}

// =============================================================================
// ROLE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: Role,
    pub actor: String,
    pub section: Section,
}

// =============================================================================
// RECORDS
// =============================================================================

/// `?q=` on record listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub section: Section,
    pub count: usize,
    pub records: Vec<serde_json::Value>,
}

/// Downstream record created by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotedRecord {
    pub section: Section,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
    pub replaced: bool,
    pub promoted: Option<PromotedRecord>,
    /// Newest first.
    pub notifications: Vec<String>,
}

impl SubmitResponse {
    #[must_use]
    pub fn new(submission: Submission, notifications: Vec<String>) -> Self {
        Self {
            id: submission.id.to_string(),
            replaced: submission.replaced,
            promoted: submission.promotion.map(|p| PromotedRecord {
                section: p.section,
                id: p.id.to_string(),
            }),
            notifications,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: String,
    pub name: String,
}

// =============================================================================
// IMPORT / EXPORT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub section: Section,
    pub imported: usize,
}

/// Records to export. All visible records when `ids` is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub file_name: String,
    pub count: usize,
    pub content: String,
}

impl From<ExportFile> for ExportResponse {
    fn from(file: ExportFile) -> Self {
        Self {
            file_name: file.file_name,
            count: file.count,
            content: file.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsResponse {
    /// Newest first, at most five.
    pub messages: Vec<String>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Mandatory fields left empty, for validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// A `FunnelError` answered over HTTP.
#[derive(Debug)]
pub struct ApiError(pub FunnelError);

impl From<FunnelError> for ApiError {
    fn from(err: FunnelError) -> Self {
        Self(err)
    }
}

/// HTTP status for `err`.
#[must_use]
pub fn status_for(err: &FunnelError) -> StatusCode {
    match err {
        FunnelError::Validation(_) | FunnelError::InvalidLink { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        FunnelError::AccessDenied { .. } => StatusCode::FORBIDDEN,
        FunnelError::NotFound { .. } => StatusCode::NOT_FOUND,
        FunnelError::MalformedRow { .. }
        | FunnelError::UnknownValue { .. }
        | FunnelError::SerializationError(_) => StatusCode::BAD_REQUEST,
        FunnelError::StorageError(_) | FunnelError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let missing = match &self.0 {
            FunnelError::Validation(v) => v.missing.iter().map(|m| (*m).to_string()).collect(),
            _ => Vec::new(),
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
            missing,
        };
        (status, Json(body)).into_response()
    }
}
