//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        ApiError, DeleteResponse, ExportRequest, ExportResponse, HealthResponse, ImportResponse,
        NotificationsResponse, RecordsResponse, RoleRequest, RoleResponse, SearchParams,
        StatusResponse, SubmitResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use funnel_core::{RecordId, Section};

type ApiResult<T> = Result<(StatusCode, Json<T>), ApiError>;

fn section(name: &str) -> Result<Section, ApiError> {
    Ok(name.parse::<Section>()?)
}

// =============================================================================
// HEALTH / STATUS / ROLE
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Role, actor and record counts.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let response = StatusResponse::from_summary(session.summary(), session.store().is_persistent());
    (StatusCode::OK, Json(response))
}

/// Switch the acting role.
pub async fn role_handler(
    State(state): State<AppState>,
    Json(request): Json<RoleRequest>,
) -> ApiResult<RoleResponse> {
    let mut session = state.session.write().await;
    let section = session.switch_role(request.role)?;
    let response = RoleResponse {
        role: request.role,
        actor: session.actor_name().to_string(),
        section,
    };
    Ok((StatusCode::OK, Json(response)))
}

// =============================================================================
// RECORDS
// =============================================================================

/// Visible records of a section, narrowed by `?q=`.
pub async fn records_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult<RecordsResponse> {
    let section = section(&name)?;
    let session = state.session.read().await;
    session.ensure_access(section)?;
    let records = session.visible_json(section, &params.q)?;
    let response = RecordsResponse {
        section,
        count: records.len(),
        records,
    };
    Ok((StatusCode::OK, Json(response)))
}

async fn submit(state: AppState, section: Section, body: serde_json::Value) -> ApiResult<SubmitResponse> {
    let mut session = state.session.write().await;
    let submission = session.submit_json(section, body)?;
    let status = if submission.replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let notifications = session.notifications().to_vec();
    Ok((status, Json(SubmitResponse::new(submission, notifications))))
}

pub async fn submit_sale_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<SubmitResponse> {
    submit(state, Section::Sales, body).await
}

pub async fn submit_lead_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<SubmitResponse> {
    submit(state, Section::Leads, body).await
}

pub async fn submit_opportunity_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<SubmitResponse> {
    submit(state, Section::Opportunities, body).await
}

pub async fn submit_action_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<SubmitResponse> {
    submit(state, Section::Actions, body).await
}

pub async fn submit_employee_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<SubmitResponse> {
    submit(state, Section::Employees, body).await
}

/// Remove a directory entry.
pub async fn delete_employee_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let mut session = state.session.write().await;
    let removed = session.delete_employee(&RecordId::new(id))?;
    let response = DeleteResponse {
        id: removed.id.to_string(),
        name: removed.name,
    };
    Ok((StatusCode::OK, Json(response)))
}

// =============================================================================
// IMPORT / EXPORT
// =============================================================================

/// Append CSV rows (request body) to a section.
pub async fn import_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: String,
) -> ApiResult<ImportResponse> {
    let section = section(&name)?;
    let mut session = state.session.write().await;
    let imported = session.import(section, &body)?;
    Ok((StatusCode::OK, Json(ImportResponse { section, imported })))
}

/// CSV of the selected visible records.
pub async fn export_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<ExportResponse> {
    let section = section(&name)?;
    let session = state.session.read().await;
    let ids: Vec<RecordId> = match request.ids {
        Some(ids) => ids.into_iter().map(RecordId::new).collect(),
        None => session.visible_ids(section, ""),
    };
    let file = session.export(section, &ids)?;
    Ok((StatusCode::OK, Json(file.into())))
}

/// Current notification list.
pub async fn notifications_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let response = NotificationsResponse {
        messages: session.notifications().to_vec(),
    };
    (StatusCode::OK, Json(response))
}
