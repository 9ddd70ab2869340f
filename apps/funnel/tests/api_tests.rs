//! Integration tests for the Funnel HTTP API.
//!
//! Uses axum-test to drive the router without starting a real server.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use funnel::api::{
    AppState, DeleteResponse, ErrorResponse, ExportResponse, HealthResponse, ImportResponse,
    NotificationsResponse, RecordsResponse, RoleResponse, StatusResponse, SubmitResponse,
    create_router,
};
use funnel_core::{FixedClock, Role, Section, Session, SessionSettings, StorageBackend};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn session_with(settings: SessionSettings) -> Session {
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap());
    Session::open(StorageBackend::default(), Arc::new(clock), settings).unwrap()
}

/// Test server over a fresh in-memory session.
fn create_test_server() -> TestServer {
    let state = AppState::new(session_with(SessionSettings::default()));
    TestServer::new(create_router(state)).unwrap()
}

fn sale_body(client: &str, region: &str, status: &str) -> serde_json::Value {
    json!({
        "clientName": client,
        "contactName": "Ravi",
        "contactNumber": "555-0101",
        "region": region,
        "country": "India",
        "status": status,
        "remarks": "Asked for a demo",
    })
}

async fn submit(server: &TestServer, path: &str, body: serde_json::Value) -> SubmitResponse {
    let response = server.post(path).json(&body).await;
    assert!(
        response.status_code().is_success(),
        "{path} failed: {}",
        response.text()
    );
    response.json()
}

// =============================================================================
// HEALTH / STATUS / ROLE
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_fresh_session() {
    let server = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.role, Role::SuperAdmin);
    assert_eq!(status.actor, "Thilakraj");
    assert_eq!(status.section, Section::Sales);
    assert_eq!(status.counts.get(&Section::Employees), Some(&4));
    assert_eq!(status.counts.get(&Section::Sales), Some(&0));
    assert!(!status.persistent);
}

#[tokio::test]
async fn test_role_switch_falls_back() {
    let server = create_test_server();

    let response = server
        .post("/role")
        .json(&json!({ "role": "Delivery Manager" }))
        .await;

    response.assert_status_ok();
    let role: RoleResponse = response.json();
    assert_eq!(role.role, Role::DeliveryManager);
    assert_eq!(role.actor, "Prem");
    assert_eq!(role.section, Section::Actions);
}

#[tokio::test]
async fn test_role_unknown_is_rejected() {
    let server = create_test_server();

    let response = server.post("/role").json(&json!({ "role": "Janitor" })).await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// ACCESS
// =============================================================================

#[tokio::test]
async fn test_access_denied_is_403() {
    let server = create_test_server();
    server
        .post("/role")
        .json(&json!({ "role": "Delivery Manager" }))
        .await
        .assert_status_ok();

    let response = server
        .post("/sales")
        .json(&sale_body("Acme", "Asia Pacific", "Qualified"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server.get("/records/leads").await;
    response.assert_status(StatusCode::FORBIDDEN);

    let notifications: NotificationsResponse = server.get("/notifications").await.json();
    assert!(notifications.messages.is_empty());
}

#[tokio::test]
async fn test_employees_restricted_to_super_admin() {
    let server = create_test_server();
    server
        .post("/role")
        .json(&json!({ "role": "Sales Head" }))
        .await
        .assert_status_ok();

    let response = server.delete("/employees/EMP-1").await;

    response.assert_status(StatusCode::FORBIDDEN);
}

// =============================================================================
// SUBMISSION AND PROMOTION
// =============================================================================

#[tokio::test]
async fn test_missing_fields_are_422() {
    let server = create_test_server();

    let response = server.post("/sales").json(&json!({ "clientName": "Acme" })).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = response.json();
    assert_eq!(error.missing, vec!["contact_name", "contact_number", "region"]);
    assert!(error.error.starts_with("Please fill in all mandatory fields for Sale"));
}

#[tokio::test]
async fn test_full_pipeline() {
    let server = create_test_server();

    // Sale -> Lead
    let response = server
        .post("/sales")
        .json(&sale_body("Acme", "Europe", "Qualified"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let sale: SubmitResponse = response.json();
    let lead = sale.promoted.expect("lead created");
    assert_eq!(lead.section, Section::Leads);
    assert_eq!(
        sale.notifications[0],
        "Sale qualified. Shared with Presales Team for Feasibility Study."
    );

    let leads: RecordsResponse = server.get("/records/leads").await.json();
    assert_eq!(leads.count, 1);
    assert_eq!(leads.records[0]["companyName"], "Acme");
    assert_eq!(leads.records[0]["remarksHistory"].as_array().map(Vec::len), Some(1));

    // Lead -> Opportunity (same ID)
    let response = server
        .post("/leads")
        .json(&json!({ "id": lead.id, "status": "Qualified" }))
        .await;
    response.assert_status_ok();
    let submitted: SubmitResponse = response.json();
    assert!(submitted.replaced);
    let opp = submitted.promoted.expect("opportunity created");
    assert_eq!(opp.section, Section::Opportunities);
    assert_eq!(opp.id, lead.id);

    // Opportunity -> kickoff action
    let won = submit(
        &server,
        "/opportunities",
        json!({ "id": opp.id, "stage": "Closed Won" }),
    )
    .await;
    assert_eq!(won.promoted.map(|p| p.section), Some(Section::Actions));

    let actions: RecordsResponse = server.get("/records/actions").await.json();
    assert_eq!(actions.count, 1);
    assert_eq!(actions.records[0]["priority"], "High");
    assert_eq!(actions.records[0]["linkedRecordId"], opp.id.as_str());
    assert_eq!(actions.records[0]["dueDate"], "2026-10-19");
}

#[tokio::test]
async fn test_guarded_resubmission_creates_no_duplicate() {
    let server = create_test_server();
    let sale = submit(&server, "/sales", sale_body("Acme", "Europe", "Qualified")).await;

    let again = submit(&server, "/sales", json!({ "id": sale.id, "remarks": "Follow-up" })).await;

    assert!(again.replaced);
    assert!(again.promoted.is_none());
    let leads: RecordsResponse = server.get("/records/leads").await.json();
    assert_eq!(leads.count, 1);
}

#[tokio::test]
async fn test_repeat_policy_promotes_again() {
    let settings = SessionSettings {
        promotion: funnel_core::PromotionPolicy::Repeat,
        ..SessionSettings::default()
    };
    let server = TestServer::new(create_router(AppState::new(session_with(settings)))).unwrap();
    let sale = submit(&server, "/sales", sale_body("Acme", "Europe", "Qualified")).await;

    submit(&server, "/sales", json!({ "id": sale.id })).await;

    let leads: RecordsResponse = server.get("/records/leads").await.json();
    assert_eq!(leads.count, 2);
}

#[tokio::test]
async fn test_opportunity_forecast_fields() {
    let server = create_test_server();
    let body = json!({
        "name": "Data platform",
        "accountName": "Borealis",
        "region": "Europe",
        "country": "Germany",
        "value": 100000,
        "stage": "Negotiation/Review",
    });
    let opp = submit(&server, "/opportunities", body).await;

    let listed: RecordsResponse = server.get("/records/opportunities").await.json();
    assert_eq!(listed.records[0]["probability"], 90);
    assert_eq!(listed.records[0]["expectedRevenue"], 90000);

    submit(&server, "/opportunities", json!({ "id": opp.id, "stage": "Closed Lost" })).await;
    let listed: RecordsResponse = server.get("/records/opportunities").await.json();
    assert_eq!(listed.records[0]["probability"], 0);
    assert_eq!(listed.records[0]["expectedRevenue"], 0);
}

#[tokio::test]
async fn test_action_with_bad_link_is_422() {
    let server = create_test_server();

    let response = server
        .post("/actions")
        .json(&json!({
            "assignee": "Prem",
            "subject": "Call",
            "dueDate": "2026-10-20",
            "actionType": "Lead",
            "linkedRecordId": "LD-4040",
            "region": "Europe",
            "priority": "Low",
            "status": "Not Started",
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// RECORD LISTING
// =============================================================================

#[tokio::test]
async fn test_records_search_and_scope() {
    let server = create_test_server();
    submit(&server, "/sales", sale_body("Acme", "Asia Pacific", "Contacted")).await;
    submit(&server, "/sales", sale_body("Borealis", "Europe", "Contacted")).await;

    let all: RecordsResponse = server.get("/records/sales").await.json();
    assert_eq!(all.count, 2);

    let found: RecordsResponse = server
        .get("/records/sales")
        .add_query_param("q", "BORE")
        .await
        .json();
    assert_eq!(found.count, 1);
    assert_eq!(found.records[0]["clientName"], "Borealis");

    // Sales Head covers Asia Pacific only
    server
        .post("/role")
        .json(&json!({ "role": "Sales Head" }))
        .await
        .assert_status_ok();
    let scoped: RecordsResponse = server.get("/records/sales").await.json();
    assert_eq!(scoped.count, 1);
    assert_eq!(scoped.records[0]["clientName"], "Acme");
}

#[tokio::test]
async fn test_unknown_section_is_400() {
    let server = create_test_server();

    let response = server.get("/records/prospects").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// IMPORT / EXPORT
// =============================================================================

#[tokio::test]
async fn test_import_then_export() {
    let server = create_test_server();
    let csv = "LeadName,CompanyName,ContactName,ContactNumber,Region,Country,Type,Priority,Source,Status,Assignee,StartDate,Value\n\
               Platform,Acme,Ravi,555,Europe,Germany,RFQ,High,Partner,Contacted,,2026-09-01,\"12,500\"\n\
               Renewal,Borealis,Ana,556,Europe,Spain,RFP,Low,Web Research,Not Contacted,,,\n";

    let response = server.post("/import/leads").text(csv).await;

    response.assert_status_ok();
    let imported: ImportResponse = response.json();
    assert_eq!(imported.imported, 2);

    let leads: RecordsResponse = server.get("/records/leads").await.json();
    assert_eq!(leads.records[0]["value"], 12500);
    let first = leads.records[0]["id"].as_str().unwrap().to_string();

    let response = server
        .post("/export/leads")
        .json(&json!({ "ids": [first] }))
        .await;
    response.assert_status_ok();
    let export: ExportResponse = response.json();
    assert_eq!(export.count, 1);
    assert_eq!(export.file_name, "leads_export_20261014-100000.csv");
    assert!(export.content.starts_with("\"ID\",\"LeadName\""));
    assert!(export.content.contains("\"Acme\""));
    assert!(!export.content.contains("Borealis"));

    let everything: ExportResponse = server.post("/export/leads").json(&json!({})).await.json();
    assert_eq!(everything.count, 2);
}

#[tokio::test]
async fn test_strict_import_rejects_batch() {
    let server = create_test_server();
    let csv = "SaleDate,ClientName,ContactName,ContactNumber,Region\n\
               2026-10-01,Acme,Ravi,555,Europe\n\
               2026-10-01,Beta,Ana,556,Atlantis\n";

    let response = server.post("/import/sales").text(csv).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("Atlantis"), "{}", error.error);
    let sales: RecordsResponse = server.get("/records/sales").await.json();
    assert_eq!(sales.count, 0);
}

// =============================================================================
// EMPLOYEES AND NOTIFICATIONS
// =============================================================================

#[tokio::test]
async fn test_employee_lifecycle() {
    let server = create_test_server();
    let created = submit(
        &server,
        "/employees",
        json!({
            "name": "Asha",
            "email": "asha@sightspectrum.com",
            "role": "Presales Lead",
            "status": "Active",
            "regions": ["Africa", "Middle East"],
        }),
    )
    .await;
    assert_eq!(
        created.notifications[0],
        "System access granted/updated for Asha"
    );

    let response = server.delete(&format!("/employees/{}", created.id)).await;
    response.assert_status_ok();
    let removed: DeleteResponse = response.json();
    assert_eq!(removed.name, "Asha");

    let response = server.delete(&format!("/employees/{}", created.id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notifications_capped_at_five() {
    let server = create_test_server();
    for i in 0..7 {
        submit(&server, "/sales", sale_body(&format!("Client {i}"), "Europe", "Qualified")).await;
    }

    let notifications: NotificationsResponse = server.get("/notifications").await.json();

    assert_eq!(notifications.messages.len(), 5);
}

#[tokio::test]
async fn test_persistent_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.redb");
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()));

    {
        let backend = StorageBackend::redb(&path).unwrap();
        let session = Session::open(backend, clock.clone(), SessionSettings::default()).unwrap();
        let server = TestServer::new(create_router(AppState::new(session))).unwrap();
        submit(&server, "/sales", sale_body("Acme", "Europe", "Contacted")).await;
        server
            .post("/role")
            .json(&json!({ "role": "Admin/Founder" }))
            .await
            .assert_status_ok();
    }

    let backend = StorageBackend::redb(&path).unwrap();
    let session = Session::open(backend, clock, SessionSettings::default()).unwrap();
    let server = TestServer::new(create_router(AppState::new(session))).unwrap();
    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.role, Role::AdminFounder);
    assert!(status.persistent);
    assert_eq!(status.counts.get(&Section::Sales), Some(&1));
}
