//! # Funnel HTTP API Module
//!
//! JSON API over one shared session.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Role, actor and record counts
//! - `POST /role` - Switch the acting role
//! - `GET /records/{section}?q=` - Visible records
//! - `POST /sales`, `/leads`, `/opportunities`, `/actions`, `/employees` - Submit a record
//! - `DELETE /employees/{id}` - Remove a directory entry
//! - `POST /import/{section}` - Append CSV rows (text body)
//! - `POST /export/{section}` - CSV of selected records
//! - `GET /notifications` - Newest five notifications
//!
//! ## Configuration (Environment Variables)
//!
//! - `FUNNEL_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

pub use handlers::{
    delete_employee_handler, export_handler, health_handler, import_handler, notifications_handler,
    records_handler, role_handler, status_handler, submit_action_handler, submit_employee_handler,
    submit_lead_handler, submit_opportunity_handler, submit_sale_handler,
};
pub use types::{
    ApiError, DeleteResponse, ErrorResponse, ExportRequest, ExportResponse, HealthResponse,
    ImportResponse, NotificationsResponse, PromotedRecord, RecordsResponse, RoleRequest,
    RoleResponse, SearchParams, StatusResponse, SubmitResponse, status_for,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use funnel_core::{FunnelError, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (CSV imports included).
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the CRM session.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `FUNNEL_CORS_ORIGINS`.
///
/// - `*`: any origin
/// - unset or no valid entry: localhost only
/// - otherwise: the comma-separated origins
fn build_cors_layer() -> CorsLayer {
    match std::env::var("FUNNEL_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!("CORS: allowing all origins (FUNNEL_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => Some(hv),
                        Err(e) => {
                            tracing::warn!("CORS: invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();
            if allowed.is_empty() {
                build_localhost_cors()
            } else {
                tracing::info!(count = allowed.len(), "CORS: configured origins");
                restrict(CorsLayer::new().allow_origin(allowed))
            }
        }
        None => build_localhost_cors(),
    }
}

fn restrict(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    restrict(CorsLayer::new().allow_origin(origins))
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/role", post(handlers::role_handler))
        .route("/records/{section}", get(handlers::records_handler))
        .route("/sales", post(handlers::submit_sale_handler))
        .route("/leads", post(handlers::submit_lead_handler))
        .route("/opportunities", post(handlers::submit_opportunity_handler))
        .route("/actions", post(handlers::submit_action_handler))
        .route("/employees", post(handlers::submit_employee_handler))
        .route("/employees/{id}", delete(handlers::delete_employee_handler))
        .route("/import/{section}", post(handlers::import_handler))
        .route("/export/{section}", post(handlers::export_handler))
        .route("/notifications", get(handlers::notifications_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl+C: {}", e);
    }
    tracing::info!("shutting down");
}

/// Serve the API on `addr` until Ctrl+C.
pub async fn run_server(addr: &str, session: Session) -> Result<(), FunnelError> {
    let router = create_router(AppState::new(session));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| FunnelError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Funnel HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FunnelError::IoError(format!("Server error: {}", e)))
}
