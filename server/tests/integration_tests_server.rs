use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, Duration, Utc};
use common::{Booking, Dashboard, Event, Expense, Notification, Suggestion, TeamMember, Ticket};
use http_body_util::BodyExt; // For `collect`
use serde::de::DeserializeOwned;
use serde_json::json;
use server::database::{create_schema, establish_connection_pool};
use server::routes::create_router;
use server::state::AppState;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt; // For `oneshot`

/// Helper function to set up a fresh, in-memory database for each test.
/// A single connection keeps every query on the same in-memory database.
async fn setup_test_db_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory SQLite");

    create_schema(&pool)
        .await
        .expect("Failed to create schema in test DB");

    pool
}

async fn setup_app() -> (Router, SqlitePool) {
    let pool = setup_test_db_pool().await;
    (create_router(AppState::new(pool.clone(), 16)), pool)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, bytes::Bytes) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap()
}

async fn create_property(app: &Router, nome: &str, contract_days: Option<i64>) -> i64 {
    let today = Utc::now().date_naive();
    let (status, body) = send(
        app,
        "POST",
        "/api/properties",
        Some(json!({
            "nome": nome,
            "indirizzo": "Milano",
            "data_fine_contratto": contract_days.map(|d| (today + Duration::days(d)).to_string()),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let property: serde_json::Value = parse(&body);
    property["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_and_list_bookings() {
    let (app, _pool) = setup_app().await;
    let property_id = create_property(&app, "Via Roma 1", None).await;
    let today = Utc::now().date_naive();

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(json!({
            "property_id": property_id,
            "ospite": "Mario Rossi",
            "data_inizio": today.to_string(),
            "data_fine": (today + Duration::days(3)).to_string(),
            "importo": 420.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let created: Booking = parse(&body);
    assert_eq!(created.property_name.as_deref(), Some("Via Roma 1"));

    let (status, body) = send(&app, "GET", "/api/bookings", None).await;
    assert_eq!(status, StatusCode::OK);
    let bookings: Vec<Booking> = parse(&body);
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, created.id);
}

#[tokio::test]
async fn test_create_booking_invalid_payload() {
    let (app, _pool) = setup_app().await;
    let today = Utc::now().date_naive();

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(json!({
            "property_id": 1,
            "ospite": "Mario Rossi",
            "data_inizio": today.to_string(),
            "data_fine": (today - Duration::days(1)).to_string()
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error_response: serde_json::Value = parse(&body);
    assert_eq!(
        error_response["error"],
        "Check-out date cannot be before check-in date."
    );
}

#[tokio::test]
async fn test_dashboard_booking_events_kpi_and_urgencies() {
    let (app, _pool) = setup_app().await;
    let property_id = create_property(&app, "Via Roma 1", None).await;
    let today = Utc::now().date_naive();
    let first_of_month = today.with_day(1).unwrap();

    send(
        &app,
        "POST",
        "/api/bookings",
        Some(json!({
            "property_id": property_id,
            "ospite": "Anna Verdi",
            "data_inizio": (today + Duration::days(5)).to_string(),
            "data_fine": (today + Duration::days(8)).to_string()
        })),
    )
    .await;

    // Two payments at the start of the current month: one collected, one expected.
    for (descrizione, importo, stato) in [("Affitto", 800.0, "pagato"), ("Conguaglio", 150.0, "da_pagare")] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/income",
            Some(json!({
                "property_id": property_id,
                "inquilino": "Luca Bianchi",
                "descrizione": descrizione,
                "importo": importo,
                "data_scadenza": first_of_month.to_string(),
                "stato": stato
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // A ticket due far in the future is still urgent while open.
    let (_, body) = send(
        &app,
        "POST",
        "/api/tickets",
        Some(json!({
            "property_id": property_id,
            "titolo": "Caldaia rumorosa",
            "descrizione": "",
            "scadenza": (today + Duration::days(40)).to_string()
        })),
    )
    .await;
    let ticket: Ticket = parse(&body);

    let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    let dashboard: Dashboard = parse(&body);

    let checkin = dashboard
        .events
        .iter()
        .find(|e| e.id.starts_with("checkin-"))
        .unwrap();
    assert_eq!(checkin.title, "Anna Verdi");
    assert_eq!(checkin.subtitle, "Via Roma 1");
    assert!(dashboard.events.iter().any(|e| e.id.starts_with("checkout-")));

    assert_eq!(dashboard.kpi.incassato, 800.0);
    assert_eq!(dashboard.kpi.atteso, 150.0);
    assert_eq!(dashboard.kpi.uscite, 0.0);

    let ticket_event_id = format!("ticket-{}", ticket.id);
    assert!(dashboard.urgencies.iter().any(|e| e.id == ticket_event_id));

    // Once resolved, the ticket leaves the dashboard entirely.
    let (status, _) = send(&app, "PATCH", &format!("/api/tickets/{}/resolve", ticket.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/api/dashboard", None).await;
    let dashboard: Dashboard = parse(&body);
    assert!(!dashboard.urgencies.iter().any(|e| e.id == ticket_event_id));
}

#[tokio::test]
async fn test_monthly_agenda_hospitality_filter() {
    let (app, _pool) = setup_app().await;
    let property_id = create_property(&app, "Via Roma 1", None).await;
    let today = Utc::now().date_naive();
    let first_of_month = today.with_day(1).unwrap();

    send(
        &app,
        "POST",
        "/api/bookings",
        Some(json!({
            "property_id": property_id,
            "ospite": "Anna Verdi",
            "data_inizio": first_of_month.to_string(),
            "data_fine": (first_of_month + Duration::days(1)).to_string()
        })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/activities",
        Some(json!({
            "titolo": "Sopralluogo",
            "descrizione": "",
            "data": first_of_month.to_string()
        })),
    )
    .await;

    let uri = format!("/api/dashboard/month?date={first_of_month}&filter=hospitality");
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let events: Vec<Event> = parse(&body);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.target_tab == "bookings"));
}

#[tokio::test]
async fn test_suggestions_end_to_end() {
    let (app, _pool) = setup_app().await;
    let roma = create_property(&app, "Via Roma 1", Some(45)).await;
    create_property(&app, "Corso Italia 5", Some(20)).await;
    create_property(&app, "Piazza Duomo 2", Some(65)).await;

    let mut ticket_ids = Vec::new();
    for titolo in ["Perdita", "Infiltrazione", "Caldaia"] {
        let (_, body) = send(
            &app,
            "POST",
            "/api/tickets",
            Some(json!({ "property_id": roma, "titolo": titolo, "descrizione": "" })),
        )
        .await;
        let ticket: Ticket = parse(&body);
        ticket_ids.push(ticket.id);
    }
    send(&app, "PATCH", &format!("/api/tickets/{}/resolve", ticket_ids[0]), None).await;

    let (status, body) = send(&app, "GET", "/api/suggestions", None).await;
    assert_eq!(status, StatusCode::OK);
    let suggestions: Vec<Suggestion> = parse(&body);

    let fault = suggestions.iter().find(|s| s.id.starts_with("guasti-")).unwrap();
    assert!(fault.description.contains("Via Roma 1"));
    assert!(fault.description.contains(" 2 ticket"));
    assert_eq!(fault.estimated_cost, Some(250.0));

    let contracts: Vec<(&str, serde_json::Value)> = suggestions
        .iter()
        .filter(|s| s.id.starts_with("contratto-"))
        .map(|s| {
            (
                s.property_name.as_deref().unwrap(),
                serde_json::to_value(s.priority).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        contracts,
        vec![
            // Properties are listed by name.
            ("Corso Italia 5", json!("alta")),
            ("Via Roma 1", json!("media")),
        ]
    );
}

#[tokio::test]
async fn test_notification_scan_is_idempotent_and_readable() {
    let (app, _pool) = setup_app().await;
    let property_id = create_property(&app, "Via Roma 1", None).await;
    let today = Utc::now().date_naive();

    send(
        &app,
        "POST",
        "/api/income",
        Some(json!({
            "property_id": property_id,
            "inquilino": "Luca Bianchi",
            "descrizione": "Affitto",
            "importo": 800.0,
            "data_scadenza": (today + Duration::days(8)).to_string()
        })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/vehicles",
        Some(json!({ "targa": "AB123CD", "modello": "Ducato" })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/expenses",
        Some(json!({
            "descrizione": "Bollo",
            "importo": 210.0,
            "data_scadenza": (today + Duration::days(1)).to_string(),
            "vehicle_id": 1
        })),
    )
    .await;

    let (status, body) = send(&app, "POST", "/api/users/u1/notifications/scan", None).await;
    assert_eq!(status, StatusCode::OK);
    let report: serde_json::Value = parse(&body);
    assert_eq!(report["created"], 2);

    let (_, body) = send(&app, "POST", "/api/users/u1/notifications/scan", None).await;
    let report: serde_json::Value = parse(&body);
    assert_eq!(report["created"], 0);

    let (_, body) = send(&app, "GET", "/api/users/u1/notifications", None).await;
    let all: Vec<Notification> = parse(&body);
    assert_eq!(all.len(), 2);

    let (_, body) = send(&app, "GET", "/api/users/u1/notifications?category=mobile", None).await;
    let mobile: Vec<Notification> = parse(&body);
    assert_eq!(mobile.len(), 1);
    assert!(mobile[0].messaggio.contains("Bollo"));

    let (_, body) = send(&app, "GET", "/api/users/u1/notifications/count", None).await;
    let count: serde_json::Value = parse(&body);
    assert_eq!(count["unread"], 2);

    let (status, _) = send(&app, "PATCH", &format!("/api/notifications/{}/read", mobile[0].id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/api/users/u1/notifications/count", None).await;
    let count: serde_json::Value = parse(&body);
    assert_eq!(count["unread"], 1);

    let (_, body) = send(&app, "PATCH", "/api/users/u1/notifications/read", None).await;
    let marked: serde_json::Value = parse(&body);
    assert_eq!(marked["notifications_marked"], 1);

    let (_, body) = send(&app, "GET", "/api/users/u1/notifications", None).await;
    let unread: Vec<Notification> = parse(&body);
    assert!(unread.is_empty());
}

#[tokio::test]
async fn test_team_member_crud() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/team",
        Some(json!({ "nome": "Giulia Neri", "ruolo": "pulizie" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let member: TeamMember = parse(&body);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/team/{}", member.id),
        Some(json!({
            "nome": "Giulia Neri",
            "ruolo": "governante",
            "email": "giulia@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: TeamMember = parse(&body);
    assert_eq!(updated.ruolo, "governante");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/team/{}", member.id),
        Some(json!({ "nome": "Giulia Neri", "ruolo": "governante", "email": "giulia" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error_response: serde_json::Value = parse(&body);
    assert_eq!(error_response["error"], "Email address is not valid.");

    let (_, body) = send(&app, "GET", "/api/team", None).await;
    let members: Vec<TeamMember> = parse(&body);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].email.as_deref(), Some("giulia@example.com"));

    let uri = format!("/api/team/{}", member.id);
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete_expense() {
    let (app, _pool) = setup_app().await;
    let property_id = create_property(&app, "Via Roma 1", None).await;
    let today = Utc::now().date_naive();

    let (_, body) = send(
        &app,
        "POST",
        "/api/expenses",
        Some(json!({
            "descrizione": "Condominio",
            "importo": 90.0,
            "data_scadenza": today.to_string(),
            "property_id": property_id
        })),
    )
    .await;
    let expense: Expense = parse(&body);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/expenses/{}", expense.id),
        Some(json!({
            "descrizione": "Condominio marzo",
            "importo": 95.5,
            "data_scadenza": today.to_string(),
            "property_id": property_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Expense = parse(&body);
    assert_eq!(updated.descrizione, "Condominio marzo");
    assert_eq!(updated.importo, 95.5);
    assert_eq!(updated.property_name.as_deref(), Some("Via Roma 1"));

    let (status, _) = send(&app, "DELETE", &format!("/api/expenses/{}", expense.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/api/expenses", None).await;
    let expenses: Vec<Expense> = parse(&body);
    assert!(expenses.is_empty());

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/expenses/{}", expense.id),
        Some(json!({
            "descrizione": "Condominio",
            "importo": 90.0,
            "data_scadenza": today.to_string()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error_response: serde_json::Value = parse(&body);
    assert_eq!(
        error_response["error"],
        format!("Expense with ID {} not found.", expense.id)
    );
}

#[tokio::test]
async fn test_mark_unknown_notification_read() {
    let (app, _pool) = setup_app().await;
    let (status, body) = send(&app, "PATCH", "/api/notifications/404/read", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error_response: serde_json::Value = parse(&body);
    assert_eq!(
        error_response["error"],
        "Unread notification with ID 404 not found."
    );
}

#[tokio::test]
async fn test_file_database_is_created_with_schema() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/nested/gestio.db", dir.path().display());

    let pool = establish_connection_pool(&url).await.unwrap();
    let app = create_router(AppState::new(pool, 4));

    let (status, body) = send(&app, "GET", "/api/vehicles", None).await;
    assert_eq!(status, StatusCode::OK);
    let vehicles: Vec<serde_json::Value> = parse(&body);
    assert!(vehicles.is_empty());
}
