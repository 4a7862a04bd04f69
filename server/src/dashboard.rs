// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Dashboard aggregation: merges the heterogeneous source rows into one
//! calendar of [`Event`]s, the monthly KPIs and the urgency list.
//!
//! Everything here is a pure function of the collections and of "now"; the
//! result is recomputed on every request and never stored.
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use common::{
    Activity, AgendaFilter, Booking, Dashboard, Event, EventKind, Expense, Income, Kpi,
    PaymentStatus, Priority, Ticket, TicketStatus, Vehicle,
};

/// The six collections the dashboard is built from.
#[derive(Debug, Clone, Default)]
pub struct DashboardSources {
    pub bookings: Vec<Booking>,
    pub expenses: Vec<Expense>,
    pub income: Vec<Income>,
    pub tickets: Vec<Ticket>,
    pub vehicles: Vec<Vehicle>,
    pub activities: Vec<Activity>,
}

/// Inclusive range of days fetched for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// From the first day of the previous month through the last day of the
    /// month two months ahead of `today`.
    pub fn around(today: NaiveDate) -> Option<Self> {
        let month_start = today.with_day(1)?;
        let start = month_start.checked_sub_months(Months::new(1))?;
        let end = month_start.checked_add_months(Months::new(3))?.pred_opt()?;
        Some(Self { start, end })
    }
}

/// A date-only value counts as the start of its day.
pub fn is_past(date: NaiveDate, now: NaiveDateTime) -> bool {
    date.and_time(NaiveTime::MIN) < now
}

fn same_month(date: NaiveDate, reference: NaiveDate) -> bool {
    date.year() == reference.year() && date.month() == reference.month()
}

fn booking_events(booking: &Booking, now: NaiveDateTime) -> [Event; 2] {
    let property = booking.property_name.clone().unwrap_or_default();
    let event = |prefix: &str, kind, date, amount| Event {
        id: format!("{prefix}-{}", booking.id),
        date,
        kind,
        title: booking.ospite.clone(),
        subtitle: property.clone(),
        amount,
        priority: Priority::Alta,
        status: booking.stato.clone(),
        target_tab: "bookings".to_string(),
        is_completed: is_past(date, now),
    };

    [
        event("checkin", EventKind::Checkin, booking.data_inizio, booking.importo),
        event("checkout", EventKind::Checkout, booking.data_fine, None),
    ]
}

fn expense_event(expense: &Expense) -> Event {
    let subtitle = match (&expense.vehicle_plate, &expense.property_name) {
        (Some(plate), _) => format!("Veicolo {plate}"),
        (None, Some(property)) => property.clone(),
        (None, None) if expense.vehicle_id.is_some() => "Veicolo".to_string(),
        (None, None) => "Spesa generale".to_string(),
    };

    Event {
        id: format!("expense-{}", expense.id),
        date: expense.data_scadenza,
        kind: EventKind::Expense,
        title: expense.descrizione.clone(),
        subtitle,
        amount: Some(expense.importo),
        priority: Priority::Media,
        status: expense.stato.as_str().to_string(),
        target_tab: "expenses".to_string(),
        is_completed: expense.stato == PaymentStatus::Pagato,
    }
}

fn income_event(income: &Income) -> Event {
    let subtitle = match &income.property_name {
        Some(property) => format!("{} - {property}", income.inquilino),
        None => income.inquilino.clone(),
    };

    Event {
        id: format!("payment-{}", income.id),
        date: income.data_scadenza,
        kind: EventKind::Payment,
        title: income.descrizione.clone(),
        subtitle,
        amount: Some(income.importo),
        priority: Priority::Media,
        status: income.stato.as_str().to_string(),
        target_tab: "revenue".to_string(),
        is_completed: income.stato == PaymentStatus::Pagato,
    }
}

fn ticket_event(ticket: &Ticket) -> Event {
    Event {
        id: format!("ticket-{}", ticket.id),
        // No explicit due date: the ticket shows up on the day it was opened.
        date: ticket
            .scadenza
            .unwrap_or_else(|| ticket.created_at.date_naive()),
        kind: EventKind::Maintenance,
        title: ticket.titolo.clone(),
        subtitle: ticket.property_name.clone().unwrap_or_default(),
        amount: None,
        priority: ticket.priorita,
        status: ticket.stato.as_str().to_string(),
        target_tab: "tickets".to_string(),
        is_completed: ticket.stato == TicketStatus::Risolto,
    }
}

fn vehicle_events(vehicle: &Vehicle, now: NaiveDateTime) -> Vec<Event> {
    let deadline = |prefix: &str, label: &str, date: NaiveDate| Event {
        id: format!("{prefix}-{}", vehicle.id),
        date,
        kind: EventKind::Deadline,
        title: format!("{label} {}", vehicle.targa),
        subtitle: vehicle.modello.clone(),
        amount: None,
        priority: Priority::Alta,
        status: "scadenza".to_string(),
        target_tab: "fleet".to_string(),
        is_completed: is_past(date, now),
    };

    let mut events = Vec::with_capacity(2);
    if let Some(date) = vehicle.scadenza_revisione {
        events.push(deadline("revisione", "Revisione", date));
    }
    if let Some(date) = vehicle.scadenza_assicurazione {
        events.push(deadline("assicurazione", "Assicurazione", date));
    }
    events
}

fn activity_event(activity: &Activity) -> Event {
    Event {
        id: format!("activity-{}", activity.id),
        date: activity.data,
        kind: EventKind::Activity,
        title: activity.titolo.clone(),
        subtitle: activity.descrizione.clone(),
        amount: None,
        priority: activity.priorita,
        status: activity.stato.as_str().to_string(),
        target_tab: "activities".to_string(),
        is_completed: activity.stato.is_done(),
    }
}

/// Maps every source row to its events, ordered by date. Rows on the same
/// day keep the source order.
pub fn build_events(sources: &DashboardSources, now: NaiveDateTime) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::new();

    for booking in &sources.bookings {
        events.extend(booking_events(booking, now));
    }
    events.extend(sources.expenses.iter().map(expense_event));
    events.extend(sources.income.iter().map(income_event));
    events.extend(sources.tickets.iter().map(ticket_event));
    for vehicle in &sources.vehicles {
        events.extend(vehicle_events(vehicle, now));
    }
    events.extend(sources.activities.iter().map(activity_event));

    events.sort_by_key(|event| event.date);
    events
}

/// Money figures for the calendar month containing `now`.
pub fn compute_kpi(sources: &DashboardSources, now: NaiveDateTime) -> Kpi {
    let today = now.date();
    let mut kpi = Kpi::default();

    for income in sources
        .income
        .iter()
        .filter(|income| same_month(income.data_scadenza, today))
    {
        match income.stato {
            PaymentStatus::Pagato => kpi.incassato += income.importo,
            PaymentStatus::DaPagare => kpi.atteso += income.importo,
        }
    }

    kpi.uscite = sources
        .expenses
        .iter()
        .filter(|expense| same_month(expense.data_scadenza, today))
        .map(|expense| expense.importo)
        .sum();

    kpi
}

/// An event needs attention when any of these holds:
/// - it is `alta`, overdue and open;
/// - it is an open maintenance ticket, whatever its date;
/// - it is a payment or an activity, overdue and open.
pub fn is_urgent(event: &Event, now: NaiveDateTime) -> bool {
    let overdue = is_past(event.date, now);
    let open = !event.is_completed;

    (event.priority == Priority::Alta && overdue && open)
        || (event.kind == EventKind::Maintenance && open)
        || (matches!(event.kind, EventKind::Payment | EventKind::Activity) && overdue && open)
}

pub fn aggregate(sources: &DashboardSources, now: NaiveDateTime) -> Dashboard {
    let events = build_events(sources, now);
    let urgencies = events
        .iter()
        .filter(|event| is_urgent(event, now))
        .cloned()
        .collect();

    Dashboard {
        kpi: compute_kpi(sources, now),
        events,
        urgencies,
    }
}

/// Events of a single day, `alta` first. Everything else keeps its
/// incoming order.
pub fn daily_events(events: &[Event], day: NaiveDate) -> Vec<Event> {
    let mut selected: Vec<Event> = events
        .iter()
        .filter(|event| event.date == day)
        .cloned()
        .collect();
    selected.sort_by_key(|event| event.priority != Priority::Alta);
    selected
}

pub fn matches_filter(filter: AgendaFilter, kind: EventKind) -> bool {
    match filter {
        AgendaFilter::All => true,
        AgendaFilter::Hospitality => matches!(kind, EventKind::Checkin | EventKind::Checkout),
        AgendaFilter::Finance => matches!(kind, EventKind::Payment | EventKind::Expense),
        AgendaFilter::Maintenance => matches!(kind, EventKind::Maintenance | EventKind::Deadline),
        AgendaFilter::Activity => kind == EventKind::Activity,
    }
}

/// Events in the calendar month of `month_of`, restricted to one category.
pub fn monthly_agenda(events: &[Event], month_of: NaiveDate, filter: AgendaFilter) -> Vec<Event> {
    events
        .iter()
        .filter(|event| same_month(event.date, month_of) && matches_filter(filter, event.kind))
        .cloned()
        .collect()
}
