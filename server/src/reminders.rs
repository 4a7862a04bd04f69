// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Due-date reminders.
//!
//! A scan looks at unpaid expenses, open tickets with a due date and unpaid
//! tenant payments. An item is reminded on the days where the number of days
//! left is a positive multiple of 4, and on the day before it falls due. Once
//! an item is due or overdue no new reminders are produced for it.
use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use common::{Category, Expense, Income, Priority, Ticket, TicketStatus};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::database;
use crate::notifications::{self, NewNotification};
use crate::state::AppState;

pub fn days_until_due(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

pub fn in_remind_window(days: i64) -> bool {
    (days > 0 && days % 4 == 0) || days == 1
}

fn priority_for(days: i64) -> Priority {
    if days == 1 { Priority::Alta } else { Priority::Media }
}

fn due_phrase(days: i64) -> String {
    if days == 1 {
        "domani".to_string()
    } else {
        format!("tra {days} giorni")
    }
}

fn expense_reminder(expense: &Expense, user_id: &str, today: NaiveDate) -> Option<NewNotification> {
    let days = days_until_due(expense.data_scadenza, today);
    if !in_remind_window(days) {
        return None;
    }

    let (categoria, glyph, target) = match (&expense.vehicle_id, &expense.vehicle_plate) {
        (Some(_), plate) => (
            Category::Mobile,
            '🚗',
            plate.clone().unwrap_or_else(|| "veicolo".to_string()),
        ),
        (None, _) => (
            Category::Real,
            '🏠',
            expense.property_name.clone().unwrap_or_else(|| "spesa generale".to_string()),
        ),
    };

    Some(NewNotification {
        user_id: user_id.to_string(),
        tipo: "scadenza_spesa".to_string(),
        titolo: "Spesa in scadenza".to_string(),
        messaggio: format!(
            "{glyph} {} ({target}, {:.2} €) scade {}",
            expense.descrizione,
            expense.importo,
            due_phrase(days)
        ),
        link: format!("/expenses?id={}&ctx={}", expense.id, categoria.as_str()),
        priorita: priority_for(days),
        categoria,
        giorno: today,
    })
}

fn ticket_reminder(ticket: &Ticket, user_id: &str, today: NaiveDate) -> Option<NewNotification> {
    if ticket.stato == TicketStatus::Risolto {
        return None;
    }
    let days = days_until_due(ticket.scadenza?, today);
    if !in_remind_window(days) {
        return None;
    }

    Some(NewNotification {
        user_id: user_id.to_string(),
        tipo: "scadenza_ticket".to_string(),
        titolo: "Ticket in scadenza".to_string(),
        messaggio: format!(
            "🏠 {} ({}) scade {}",
            ticket.titolo,
            ticket.property_name.as_deref().unwrap_or("immobile"),
            due_phrase(days)
        ),
        link: format!("/tickets?id={}&ctx=real", ticket.id),
        priorita: priority_for(days),
        categoria: Category::Real,
        giorno: today,
    })
}

fn income_reminder(income: &Income, user_id: &str, today: NaiveDate) -> Option<NewNotification> {
    let days = days_until_due(income.data_scadenza, today);
    if !in_remind_window(days) {
        return None;
    }

    Some(NewNotification {
        user_id: user_id.to_string(),
        tipo: "scadenza_pagamento".to_string(),
        titolo: "Pagamento inquilino in scadenza".to_string(),
        messaggio: format!(
            "🏠 {} di {} ({:.2} €) scade {}",
            income.descrizione,
            income.inquilino,
            income.importo,
            due_phrase(days)
        ),
        link: format!("/revenue?id={}&ctx=real", income.id),
        priorita: priority_for(days),
        categoria: Category::Real,
        giorno: today,
    })
}

/// Reminders due today for the given items, in input order.
pub fn collect_reminders(
    expenses: &[Expense],
    tickets: &[Ticket],
    income: &[Income],
    user_id: &str,
    today: NaiveDate,
) -> Vec<NewNotification> {
    let mut reminders: Vec<NewNotification> = Vec::new();
    reminders.extend(
        expenses
            .iter()
            .filter_map(|expense| expense_reminder(expense, user_id, today)),
    );
    reminders.extend(
        tickets
            .iter()
            .filter_map(|ticket| ticket_reminder(ticket, user_id, today)),
    );
    reminders.extend(
        income
            .iter()
            .filter_map(|income| income_reminder(income, user_id, today)),
    );
    reminders
}

/// Users with a scan currently running in this process.
#[derive(Debug, Default)]
pub struct ScanGuard {
    running: Mutex<HashSet<String>>,
}

/// Held for the duration of a scan; releases the user on drop.
pub struct ScanTicket<'a> {
    guard: &'a ScanGuard,
    user_id: String,
}

impl ScanGuard {
    pub fn try_begin(&self, user_id: &str) -> Option<ScanTicket<'_>> {
        let mut running = self.running.lock();
        if !running.insert(user_id.to_string()) {
            return None;
        }
        Some(ScanTicket {
            guard: self,
            user_id: user_id.to_string(),
        })
    }
}

impl Drop for ScanTicket<'_> {
    fn drop(&mut self) {
        self.guard.running.lock().remove(&self.user_id);
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanReport {
    pub user_id: String,
    pub day: NaiveDate,
    pub candidates: usize,
    pub created: usize,
    /// True when another scan for the same user was already running.
    pub skipped: bool,
}

/// Runs one reminder scan for `user_id`: stores the reminders that are due
/// today and not yet stored, and publishes each new row to live subscribers.
pub async fn run_scan(state: &AppState, user_id: &str, today: NaiveDate) -> Result<ScanReport> {
    let Some(_ticket) = state.scans.try_begin(user_id) else {
        info!("Reminder scan already running for user {}, skipping.", user_id);
        return Ok(ScanReport {
            user_id: user_id.to_string(),
            day: today,
            candidates: 0,
            created: 0,
            skipped: true,
        });
    };

    let (expenses, tickets, income) = tokio::try_join!(
        database::unpaid_expenses(&state.pool),
        database::open_tickets(&state.pool),
        database::unpaid_income(&state.pool),
    )?;

    let reminders = collect_reminders(&expenses, &tickets, &income, user_id, today);
    debug!(
        "Reminder scan for {} on {}: {} candidates.",
        user_id,
        today,
        reminders.len()
    );

    let mut created = 0;
    for reminder in &reminders {
        if let Some(stored) = notifications::insert_if_absent(&state.pool, reminder).await? {
            created += 1;
            state.hub.publish(stored);
        }
    }

    info!(
        "Reminder scan for {} on {}: {} created out of {} candidates.",
        user_id,
        today,
        created,
        reminders.len()
    );

    Ok(ScanReport {
        user_id: user_id.to_string(),
        day: today,
        candidates: reminders.len(),
        created,
        skipped: false,
    })
}

/// Checks every `every` whether a new day has started and, if so, runs a scan
/// for each configured user. The first check happens right away.
pub fn spawn_daily_scanner(state: AppState, users: Vec<String>, every: Duration) {
    if users.is_empty() {
        info!("No reminder users configured, daily scanner not started.");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        let mut last_scan_day: Option<NaiveDate> = None;

        loop {
            interval.tick().await;

            let today = Utc::now().date_naive();
            if last_scan_day.is_some_and(|day| day >= today) {
                debug!("No new day yet. Current date: {}.", today);
                continue;
            }

            info!("New day detected: {}, running reminder scans.", today);
            let mut failed = false;
            for user_id in &users {
                if let Err(e) = run_scan(&state, user_id, today).await {
                    error!("Reminder scan failed for user {}: {:?}", user_id, e);
                    failed = true;
                }
            }

            // Retry on the next tick if any user failed; stored rows are not
            // duplicated by a second pass.
            if !failed {
                last_scan_day = Some(today);
            }
        }
    });
}
