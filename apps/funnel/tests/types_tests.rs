//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use funnel::api::{
    ErrorResponse, ExportRequest, ExportResponse, HealthResponse, PromotedRecord, RoleRequest,
    SearchParams, StatusResponse, SubmitResponse, status_for,
};
use funnel_core::{
    ExportFile, FunnelError, PromotionOutcome, RecordId, Region, Role, Section, Submission,
    Summary, ValidationError,
};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_from_summary() {
    let summary = Summary {
        role: Role::SalesHead,
        actor: "Seranjivi".to_string(),
        regions: vec![Region::AsiaPacific],
        section: Section::Opportunities,
        counts: Section::ALL.into_iter().map(|s| (s, 2)).collect(),
    };

    let status = StatusResponse::from_summary(summary, true);
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["role"], "Sales Head");
    assert_eq!(json["regions"][0], "Asia Pacific");
    assert_eq!(json["section"], "opportunities");
    assert_eq!(json["counts"]["employees"], 2);
    assert_eq!(json["persistent"], true);
}

// =============================================================================
// REQUESTS
// =============================================================================

#[test]
fn test_role_request_uses_labels() {
    let request: RoleRequest = serde_json::from_str(r#"{"role":"Presales Manager"}"#).unwrap();
    assert_eq!(request.role, Role::PresalesManager);

    assert!(serde_json::from_str::<RoleRequest>(r#"{"role":"presales_manager"}"#).is_err());
}

#[test]
fn test_search_params_default_to_empty() {
    let params: SearchParams = serde_json::from_str("{}").unwrap();
    assert!(params.q.is_empty());
}

#[test]
fn test_export_request_ids_optional() {
    let all: ExportRequest = serde_json::from_str("{}").unwrap();
    assert!(all.ids.is_none());

    let some: ExportRequest = serde_json::from_str(r#"{"ids":["LD-1000"]}"#).unwrap();
    assert_eq!(some.ids, Some(vec!["LD-1000".to_string()]));
}

// =============================================================================
// RESPONSES
// =============================================================================

#[test]
fn test_submit_response_from_submission() {
    let submission = Submission {
        id: RecordId::new("SALE-1000"),
        replaced: false,
        promotion: Some(PromotionOutcome {
            section: Section::Leads,
            id: RecordId::new("LD-1001"),
            message: "Sale qualified.".to_string(),
        }),
    };

    let response = SubmitResponse::new(submission, vec!["Sale qualified.".to_string()]);

    assert_eq!(response.id, "SALE-1000");
    assert_eq!(
        response.promoted,
        Some(PromotedRecord {
            section: Section::Leads,
            id: "LD-1001".to_string(),
        })
    );
    assert_eq!(response.notifications.len(), 1);
}

#[test]
fn test_export_response_from_file() {
    let file = ExportFile {
        file_name: "opps_export_20261014-100000.csv".to_string(),
        content: "\"ID\"\n".to_string(),
        count: 0,
    };

    let response = ExportResponse::from(file);

    assert_eq!(response.file_name, "opps_export_20261014-100000.csv");
    assert_eq!(response.count, 0);
}

#[test]
fn test_error_response_omits_empty_missing() {
    let error = ErrorResponse {
        error: "Sale not found: SALE-1".to_string(),
        missing: Vec::new(),
    };

    let json = serde_json::to_string(&error).unwrap();

    assert!(!json.contains("missing"));
}

// =============================================================================
// STATUS MAPPING
// =============================================================================

#[test]
fn test_status_for_each_error_kind() {
    let validation = FunnelError::Validation(ValidationError {
        section: Section::Sales,
        missing: vec!["region"],
    });
    assert_eq!(status_for(&validation), StatusCode::UNPROCESSABLE_ENTITY);

    let denied = FunnelError::AccessDenied {
        role: Role::DeliveryManager,
        section: Section::Sales,
    };
    assert_eq!(status_for(&denied), StatusCode::FORBIDDEN);

    let missing = FunnelError::NotFound {
        section: Section::Employees,
        id: RecordId::new("EMP-9"),
    };
    assert_eq!(status_for(&missing), StatusCode::NOT_FOUND);

    let malformed = FunnelError::MalformedRow {
        line: 3,
        column: "Stage",
        value: "Almost".to_string(),
    };
    assert_eq!(status_for(&malformed), StatusCode::BAD_REQUEST);

    let io = FunnelError::IoError("disk full".to_string());
    assert_eq!(status_for(&io), StatusCode::INTERNAL_SERVER_ERROR);

    let bad_json = FunnelError::SerializationError("expected value".to_string());
    assert_eq!(status_for(&bad_json), StatusCode::BAD_REQUEST);

    let corrupt = FunnelError::StorageError("Unsupported version: 9 (expected 1)".to_string());
    assert_eq!(status_for(&corrupt), StatusCode::INTERNAL_SERVER_ERROR);
}
