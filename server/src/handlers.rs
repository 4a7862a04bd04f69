// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::convert::Infallible;

use crate::dashboard::{self, DateWindow};
use crate::database::{self, Record, StatusTarget};
use crate::error::AppError;
use crate::notifications;
use crate::reminders::{self, ScanReport};
use crate::state::AppState;
use crate::suggestions::{self, SuggestionInput};
use anyhow::Context;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use chrono::{NaiveDate, Utc};
use common::{
    Activity, AgendaFilter, Booking, Category, CreateActivityPayload, CreateBookingPayload,
    CreateExpensePayload, CreateIncomePayload, CreatePropertyPayload, CreateTeamMemberPayload,
    CreateTicketPayload, CreateVehiclePayload, Dashboard, Event, Expense, Income, Notification,
    Property, Suggestion, TeamMember, Ticket, Vehicle,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info};

// --- Dashboard ---

#[derive(Deserialize, Debug, Default)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Default)]
pub struct MonthQuery {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub filter: AgendaFilter,
}

/// Loads the window around `reference` and aggregates it against the current time.
async fn build_dashboard(state: &AppState, reference: NaiveDate) -> Result<Dashboard, AppError> {
    let window = DateWindow::around(reference).context("Dashboard window out of range")?;
    let sources = database::load_dashboard_sources(&state.pool, window).await?;
    Ok(dashboard::aggregate(&sources, Utc::now().naive_utc()))
}

/// Handler for the dashboard: events, monthly KPIs and urgencies.
pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, AppError> {
    let dashboard = build_dashboard(&state, Utc::now().date_naive()).await?;
    info!(
        "Built dashboard with {} events and {} urgencies.",
        dashboard.events.len(),
        dashboard.urgencies.len()
    );
    Ok(Json(dashboard))
}

/// Handler for the daily agenda of `date` (today by default).
pub async fn get_daily_agenda(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let dashboard = build_dashboard(&state, day).await?;
    Ok(Json(dashboard::daily_events(&dashboard.events, day)))
}

/// Handler for the monthly agenda of the month containing `date`.
pub async fn get_monthly_agenda(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());
    debug!("Monthly agenda for {} with filter {:?}", day, query.filter);
    let dashboard = build_dashboard(&state, day).await?;
    Ok(Json(dashboard::monthly_agenda(
        &dashboard.events,
        day,
        query.filter,
    )))
}

pub async fn list_suggestions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let (tickets, properties, vehicles) = tokio::try_join!(
        database::open_tickets(&state.pool),
        database::list_properties(&state.pool),
        database::active_vehicles(&state.pool),
    )?;

    let input = SuggestionInput {
        tickets: &tickets,
        properties: &properties,
        vehicles: &vehicles,
    };
    let suggestions = suggestions::suggest(&input, Utc::now().date_naive());
    info!("Produced {} suggestions.", suggestions.len());
    Ok(Json(suggestions))
}

// --- Listings ---

pub async fn list_properties(
    State(state): State<AppState>,
) -> Result<Json<Vec<Property>>, AppError> {
    Ok(Json(database::list_properties(&state.pool).await?))
}

pub async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(database::list_bookings(&state.pool).await?))
}

pub async fn list_expenses(State(state): State<AppState>) -> Result<Json<Vec<Expense>>, AppError> {
    Ok(Json(database::list_expenses(&state.pool).await?))
}

pub async fn list_income(State(state): State<AppState>) -> Result<Json<Vec<Income>>, AppError> {
    Ok(Json(database::list_income(&state.pool).await?))
}

pub async fn list_tickets(State(state): State<AppState>) -> Result<Json<Vec<Ticket>>, AppError> {
    Ok(Json(database::list_tickets(&state.pool).await?))
}

pub async fn list_vehicles(State(state): State<AppState>) -> Result<Json<Vec<Vehicle>>, AppError> {
    Ok(Json(database::list_vehicles(&state.pool).await?))
}

pub async fn list_activities(
    State(state): State<AppState>,
) -> Result<Json<Vec<Activity>>, AppError> {
    Ok(Json(database::list_activities(&state.pool).await?))
}

pub async fn list_team_members(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamMember>>, AppError> {
    Ok(Json(database::list_team_members(&state.pool).await?))
}

// --- Creation ---
// Each payload is validated field by field before touching the store.

fn validated(result: Result<(), &'static str>) -> Result<(), AppError> {
    result.map_err(|message| {
        error!("Validation failed: {}", message);
        AppError::bad_request(message)
    })
}

pub async fn create_property(
    State(state): State<AppState>,
    Json(payload): Json<CreatePropertyPayload>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    validated(payload.validate())?;
    let property = database::create_property_in_db(&state.pool, payload).await?;
    info!("Property created successfully with ID: {}", property.id);
    Ok((StatusCode::CREATED, Json(property)))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    debug!("Received request to create booking for guest: {}", payload.ospite);
    validated(payload.validate())?;
    let booking = database::create_booking_in_db(&state.pool, payload).await?;
    info!("Booking created successfully with ID: {}", booking.id);
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    validated(payload.validate())?;
    let expense = database::create_expense_in_db(&state.pool, payload).await?;
    info!("Expense created successfully with ID: {}", expense.id);
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn create_income(
    State(state): State<AppState>,
    Json(payload): Json<CreateIncomePayload>,
) -> Result<(StatusCode, Json<Income>), AppError> {
    validated(payload.validate())?;
    let income = database::create_income_in_db(&state.pool, payload).await?;
    info!("Income row created successfully with ID: {}", income.id);
    Ok((StatusCode::CREATED, Json(income)))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Json(payload): Json<CreateTicketPayload>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    validated(payload.validate())?;
    let ticket = database::create_ticket_in_db(&state.pool, payload).await?;
    info!("Ticket created successfully with ID: {}", ticket.id);
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Json(payload): Json<CreateVehiclePayload>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    validated(payload.validate())?;
    let vehicle = database::create_vehicle_in_db(&state.pool, payload).await?;
    info!("Vehicle created successfully with ID: {}", vehicle.id);
    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn create_activity(
    State(state): State<AppState>,
    Json(payload): Json<CreateActivityPayload>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    validated(payload.validate())?;
    let activity = database::create_activity_in_db(&state.pool, payload).await?;
    info!("Activity created successfully with ID: {}", activity.id);
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn create_team_member(
    State(state): State<AppState>,
    Json(payload): Json<CreateTeamMemberPayload>,
) -> Result<(StatusCode, Json<TeamMember>), AppError> {
    validated(payload.validate())?;
    let member = database::create_team_member_in_db(&state.pool, payload).await?;
    info!("Team member created successfully with ID: {}", member.id);
    Ok((StatusCode::CREATED, Json(member)))
}

// --- Updates ---
// Same payloads and validation as creation.

#[allow(clippy::uninlined_format_args)]
fn found<T>(row: Option<T>, record: Record, id: i64) -> Result<Json<T>, AppError> {
    match row {
        Some(row) => {
            info!("{:?} with ID {} updated.", record, id);
            Ok(Json(row))
        }
        None => Err(AppError::not_found(&format!(
            "{:?} with ID {} not found.",
            record, id
        ))),
    }
}

pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreatePropertyPayload>,
) -> Result<Json<Property>, AppError> {
    validated(payload.validate())?;
    let row = database::update_property_in_db(&state.pool, id, payload).await?;
    found(row, Record::Property, id)
}

pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<Json<Booking>, AppError> {
    validated(payload.validate())?;
    let row = database::update_booking_in_db(&state.pool, id, payload).await?;
    found(row, Record::Booking, id)
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<Json<Expense>, AppError> {
    validated(payload.validate())?;
    let row = database::update_expense_in_db(&state.pool, id, payload).await?;
    found(row, Record::Expense, id)
}

pub async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateIncomePayload>,
) -> Result<Json<Income>, AppError> {
    validated(payload.validate())?;
    let row = database::update_income_in_db(&state.pool, id, payload).await?;
    found(row, Record::Income, id)
}

pub async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateTicketPayload>,
) -> Result<Json<Ticket>, AppError> {
    validated(payload.validate())?;
    let row = database::update_ticket_in_db(&state.pool, id, payload).await?;
    found(row, Record::Ticket, id)
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateVehiclePayload>,
) -> Result<Json<Vehicle>, AppError> {
    validated(payload.validate())?;
    let row = database::update_vehicle_in_db(&state.pool, id, payload).await?;
    found(row, Record::Vehicle, id)
}

pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateActivityPayload>,
) -> Result<Json<Activity>, AppError> {
    validated(payload.validate())?;
    let row = database::update_activity_in_db(&state.pool, id, payload).await?;
    found(row, Record::Activity, id)
}

pub async fn update_team_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateTeamMemberPayload>,
) -> Result<Json<TeamMember>, AppError> {
    validated(payload.validate())?;
    let row = database::update_team_member_in_db(&state.pool, id, payload).await?;
    found(row, Record::TeamMember, id)
}

// --- Deletes ---

#[allow(clippy::uninlined_format_args)]
async fn delete_row(state: &AppState, record: Record, id: i64) -> Result<StatusCode, AppError> {
    if database::delete_row_in_db(&state.pool, record, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(&format!(
            "{:?} with ID {} not found.",
            record, id
        )))
    }
}

pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::Property, id).await
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::Booking, id).await
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::Expense, id).await
}

pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::Income, id).await
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::Ticket, id).await
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::Vehicle, id).await
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::Activity, id).await
}

pub async fn delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_row(&state, Record::TeamMember, id).await
}

// --- Status transitions ---

#[allow(clippy::uninlined_format_args)]
async fn close_row(state: &AppState, target: StatusTarget, id: i64) -> Result<StatusCode, AppError> {
    if database::close_row_in_db(&state.pool, target, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(&format!(
            "{:?} with ID {} not found.",
            target, id
        )))
    }
}

pub async fn pay_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    close_row(&state, StatusTarget::Expense, id).await
}

pub async fn pay_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    close_row(&state, StatusTarget::Income, id).await
}

pub async fn resolve_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    close_row(&state, StatusTarget::Ticket, id).await
}

pub async fn complete_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    close_row(&state, StatusTarget::Activity, id).await
}

// --- Notifications ---

#[derive(Deserialize, Debug, Default)]
pub struct NotificationQuery {
    pub category: Option<Category>,
}

/// Handler for the unread notifications of a user.
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications =
        notifications::unread_for_user(&state.pool, &user_id, query.category).await?;
    info!(
        "Retrieved {} unread notifications for {}.",
        notifications.len(),
        user_id
    );
    Ok(Json(notifications))
}

pub async fn count_unread_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let unread = notifications::unread_count(&state.pool, &user_id).await?;
    Ok(Json(serde_json::json!({ "unread": unread })))
}

/// Handler run when a user session starts: generates today's reminders.
pub async fn scan_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ScanReport>, AppError> {
    let report = reminders::run_scan(&state, &user_id, Utc::now().date_naive()).await?;
    Ok(Json(report))
}

#[allow(clippy::uninlined_format_args)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if notifications::mark_read(&state.pool, notification_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(&format!(
            "Unread notification with ID {} not found.",
            notification_id
        )))
    }
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let marked = notifications::mark_all_read(&state.pool, &user_id).await?;
    Ok(Json(serde_json::json!({
        "message": format!("Marked {} notifications as read.", marked),
        "notifications_marked": marked
    })))
}

/// Live feed of the notifications created for a user.
pub async fn stream_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    info!("Opening notification stream for {}.", user_id);
    let stream = state.hub.subscribe(user_id).filter_map(|notification| async move {
        match SseEvent::default().event("notification").json_data(&notification) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                error!("Failed to encode notification {}: {:?}", notification.id, e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
