// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard views and advisory suggestions
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/dashboard/day", get(handlers::get_daily_agenda))
        .route("/api/dashboard/month", get(handlers::get_monthly_agenda))
        .route("/api/suggestions", get(handlers::list_suggestions))
        // Back-office records
        .route(
            "/api/properties",
            get(handlers::list_properties).post(handlers::create_property),
        )
        .route(
            "/api/properties/{id}",
            patch(handlers::update_property).delete(handlers::delete_property),
        )
        .route(
            "/api/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route(
            "/api/bookings/{id}",
            patch(handlers::update_booking).delete(handlers::delete_booking),
        )
        .route(
            "/api/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/api/expenses/{id}",
            patch(handlers::update_expense).delete(handlers::delete_expense),
        )
        .route("/api/expenses/{id}/pay", patch(handlers::pay_expense))
        .route(
            "/api/income",
            get(handlers::list_income).post(handlers::create_income),
        )
        .route(
            "/api/income/{id}",
            patch(handlers::update_income).delete(handlers::delete_income),
        )
        .route("/api/income/{id}/pay", patch(handlers::pay_income))
        .route(
            "/api/tickets",
            get(handlers::list_tickets).post(handlers::create_ticket),
        )
        .route(
            "/api/tickets/{id}",
            patch(handlers::update_ticket).delete(handlers::delete_ticket),
        )
        .route("/api/tickets/{id}/resolve", patch(handlers::resolve_ticket))
        .route(
            "/api/vehicles",
            get(handlers::list_vehicles).post(handlers::create_vehicle),
        )
        .route(
            "/api/vehicles/{id}",
            patch(handlers::update_vehicle).delete(handlers::delete_vehicle),
        )
        .route(
            "/api/activities",
            get(handlers::list_activities).post(handlers::create_activity),
        )
        .route(
            "/api/activities/{id}",
            patch(handlers::update_activity).delete(handlers::delete_activity),
        )
        .route(
            "/api/activities/{id}/complete",
            patch(handlers::complete_activity),
        )
        .route(
            "/api/team",
            get(handlers::list_team_members).post(handlers::create_team_member),
        )
        .route(
            "/api/team/{id}",
            patch(handlers::update_team_member).delete(handlers::delete_team_member),
        )
        // Notifications
        .route(
            "/api/users/{user_id}/notifications",
            get(handlers::list_notifications),
        )
        .route(
            "/api/users/{user_id}/notifications/count",
            get(handlers::count_unread_notifications),
        )
        .route(
            "/api/users/{user_id}/notifications/scan",
            post(handlers::scan_notifications),
        )
        .route(
            "/api/users/{user_id}/notifications/read",
            patch(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/users/{user_id}/notifications/stream",
            get(handlers::stream_notifications),
        )
        .route(
            "/api/notifications/{id}/read",
            patch(handlers::mark_notification_read),
        )
        .layer(TraceLayer::new_for_http())
        // Adds the shared state (DB pool, notification hub) to the application
        .with_state(state)
}
