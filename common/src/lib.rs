// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// --- Enumerated column values ---
// These are stored as TEXT and must keep the exact spelling used by the
// existing rows ('pagato', 'da_pagare', 'risolto', ...).

/// Priority shared by events, tickets, activities, suggestions and notifications.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Priority {
    Alta,
    Media,
    Bassa,
}

/// Payment state of an expense or an income row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pagato,
    DaPagare,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TicketStatus {
    Aperto,
    InCorso,
    Risolto,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VehicleStatus {
    Attivo,
    Dismesso,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ActivityStatus {
    DaFare,
    Completato,
    Svolto,
}

/// Which side of the business a notification belongs to:
/// real estate (`real`) or the vehicle fleet (`mobile`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Category {
    Real,
    Mobile,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Real => "real",
            Category::Mobile => "mobile",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pagato => "pagato",
            PaymentStatus::DaPagare => "da_pagare",
        }
    }
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Aperto => "aperto",
            TicketStatus::InCorso => "in_corso",
            TicketStatus::Risolto => "risolto",
        }
    }
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::DaFare => "da_fare",
            ActivityStatus::Completato => "completato",
            ActivityStatus::Svolto => "svolto",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ActivityStatus::Completato | ActivityStatus::Svolto)
    }
}

// --- Source rows ---

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Property {
    pub id: i64,
    pub nome: String,
    pub indirizzo: String,
    pub data_fine_contratto: Option<NaiveDate>,
}

/// A guest stay. `property_name` is embedded from `properties` on read.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub property_id: i64,
    pub property_name: Option<String>,
    pub ospite: String,
    pub data_inizio: NaiveDate,
    pub data_fine: NaiveDate,
    pub importo: Option<f64>,
    pub stato: String,
}

/// An owner-side expense, charged either to a property or to a vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Expense {
    pub id: i64,
    pub descrizione: String,
    pub importo: f64,
    pub data_scadenza: NaiveDate,
    pub stato: PaymentStatus,
    pub property_id: Option<i64>,
    pub property_name: Option<String>,
    pub vehicle_id: Option<i64>,
    pub vehicle_plate: Option<String>,
}

/// A scheduled tenant payment (revenue side).
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Income {
    pub id: i64,
    pub property_id: i64,
    pub property_name: Option<String>,
    pub inquilino: String,
    pub descrizione: String,
    pub importo: f64,
    pub data_scadenza: NaiveDate,
    pub stato: PaymentStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub property_id: i64,
    pub property_name: Option<String>,
    pub titolo: String,
    pub descrizione: String,
    pub priorita: Priority,
    pub stato: TicketStatus,
    pub scadenza: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub targa: String,
    pub modello: String,
    pub stato: VehicleStatus,
    pub scadenza_revisione: Option<NaiveDate>,
    pub scadenza_assicurazione: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub titolo: String,
    pub descrizione: String,
    pub data: NaiveDate,
    pub priorita: Priority,
    pub stato: ActivityStatus,
}

/// A member of the staff. `ruolo` is free text ("manutentore", "pulizie", ...).
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct TeamMember {
    pub id: i64,
    pub nome: String,
    pub ruolo: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
}

/// A persisted reminder.
///
/// `inviata` flips to true once the user has seen the notification;
/// `data_invio` records when. `categoria` is `None` only for rows written
/// before the column existed.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub tipo: String,
    pub titolo: String,
    pub messaggio: String,
    pub link: String,
    pub priorita: Priority,
    pub categoria: Option<Category>,
    pub inviata: bool,
    pub giorno: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub data_invio: Option<DateTime<Utc>>,
}

// --- Derived shapes ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Checkin,
    Checkout,
    Payment,
    Expense,
    Maintenance,
    Deadline,
    Activity,
}

/// One entry of the dashboard calendar, derived from a source row.
/// Never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    pub subtitle: String,
    pub amount: Option<f64>,
    pub priority: Priority,
    pub status: String,
    pub target_tab: String,
    pub is_completed: bool,
}

/// Monthly money figures: collected, expected and spent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpi {
    pub incassato: f64,
    pub atteso: f64,
    pub uscite: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub events: Vec<Event>,
    pub kpi: Kpi,
    pub urgencies: Vec<Event>,
}

/// Category filter of the monthly agenda.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgendaFilter {
    #[default]
    All,
    Hospitality,
    Finance,
    Maintenance,
    Activity,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Manutenzione,
    Contratto,
    Assicurazione,
    Revisione,
}

/// Advisory produced by the suggestion rules. Never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub property_name: Option<String>,
    pub estimated_cost: Option<f64>,
}

// --- API payloads ---
// Kept apart from the row types: the server fills ids, embedded names,
// default statuses and timestamps. The same payload is accepted on update;
// an omitted `stato` or `priorita` then keeps the stored value.

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreatePropertyPayload {
    pub nome: String,
    pub indirizzo: String,
    pub data_fine_contratto: Option<NaiveDate>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateBookingPayload {
    pub property_id: i64,
    pub ospite: String,
    pub data_inizio: NaiveDate,
    pub data_fine: NaiveDate,
    pub importo: Option<f64>,
    pub stato: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateExpensePayload {
    pub descrizione: String,
    pub importo: f64,
    pub data_scadenza: NaiveDate,
    pub stato: Option<PaymentStatus>,
    pub property_id: Option<i64>,
    pub vehicle_id: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateIncomePayload {
    pub property_id: i64,
    pub inquilino: String,
    pub descrizione: String,
    pub importo: f64,
    pub data_scadenza: NaiveDate,
    pub stato: Option<PaymentStatus>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateTicketPayload {
    pub property_id: i64,
    pub titolo: String,
    pub descrizione: String,
    pub priorita: Option<Priority>,
    pub scadenza: Option<NaiveDate>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateVehiclePayload {
    pub targa: String,
    pub modello: String,
    pub scadenza_revisione: Option<NaiveDate>,
    pub scadenza_assicurazione: Option<NaiveDate>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateActivityPayload {
    pub titolo: String,
    pub descrizione: String,
    pub data: NaiveDate,
    pub priorita: Option<Priority>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreateTeamMemberPayload {
    pub nome: String,
    pub ruolo: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
}

// --- Form validation ---
// Field checks run before anything reaches the store. The message is shown
// to the user as-is.

fn require(value: &str, message: &'static str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err(message);
    }
    Ok(())
}

fn require_amount(amount: f64) -> Result<(), &'static str> {
    if !amount.is_finite() || amount < 0.0 {
        return Err("Amount must be a non-negative number.");
    }
    Ok(())
}

impl CreatePropertyPayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.nome, "Property name cannot be empty.")?;
        require(&self.indirizzo, "Property address cannot be empty.")
    }
}

impl CreateBookingPayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.ospite, "Guest name cannot be empty.")?;
        if self.data_fine < self.data_inizio {
            return Err("Check-out date cannot be before check-in date.");
        }
        match self.importo {
            Some(amount) => require_amount(amount),
            None => Ok(()),
        }
    }
}

impl CreateExpensePayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.descrizione, "Expense description cannot be empty.")?;
        require_amount(self.importo)?;
        if self.property_id.is_some() && self.vehicle_id.is_some() {
            return Err("An expense targets either a property or a vehicle, not both.");
        }
        Ok(())
    }
}

impl CreateIncomePayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.inquilino, "Tenant name cannot be empty.")?;
        require(&self.descrizione, "Payment description cannot be empty.")?;
        require_amount(self.importo)
    }
}

impl CreateTicketPayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.titolo, "Ticket title cannot be empty.")
    }
}

impl CreateVehiclePayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.targa, "Plate number cannot be empty.")?;
        require(&self.modello, "Vehicle model cannot be empty.")
    }
}

impl CreateActivityPayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.titolo, "Activity title cannot be empty.")
    }
}

impl CreateTeamMemberPayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        require(&self.nome, "Member name cannot be empty.")?;
        require(&self.ruolo, "Member role cannot be empty.")?;
        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() && !email.contains('@') => {
                Err("Email address is not valid.")
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_values_keep_column_spelling() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::DaPagare).unwrap(),
            "\"da_pagare\""
        );
        assert_eq!(
            serde_json::to_string(&TicketStatus::InCorso).unwrap(),
            "\"in_corso\""
        );
        let status: ActivityStatus = serde_json::from_str("\"svolto\"").unwrap();
        assert_eq!(status, ActivityStatus::Svolto);
    }

    #[test]
    fn test_event_serializes_with_camel_case_and_type() {
        let event = Event {
            id: "checkin-1".to_string(),
            date: date(2025, 3, 1),
            kind: EventKind::Checkin,
            title: "Mario Rossi".to_string(),
            subtitle: "Via Roma 1".to_string(),
            amount: None,
            priority: Priority::Alta,
            status: "confermata".to_string(),
            target_tab: "bookings".to_string(),
            is_completed: false,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "checkin");
        assert_eq!(json["targetTab"], "bookings");
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["priority"], "alta");
    }

    #[test]
    fn test_booking_validation_rejects_inverted_dates() {
        let payload = CreateBookingPayload {
            property_id: 1,
            ospite: "Mario Rossi".to_string(),
            data_inizio: date(2025, 3, 10),
            data_fine: date(2025, 3, 5),
            importo: None,
            stato: None,
        };
        assert_eq!(
            payload.validate(),
            Err("Check-out date cannot be before check-in date.")
        );
    }

    #[test]
    fn test_expense_validation() {
        let mut payload = CreateExpensePayload {
            descrizione: "Bolletta luce".to_string(),
            importo: 120.0,
            data_scadenza: date(2025, 3, 10),
            stato: None,
            property_id: Some(1),
            vehicle_id: None,
        };
        assert!(payload.validate().is_ok());

        payload.importo = -1.0;
        assert_eq!(payload.validate(), Err("Amount must be a non-negative number."));

        payload.importo = 10.0;
        payload.vehicle_id = Some(2);
        assert!(payload.validate().is_err());

        payload.vehicle_id = None;
        payload.descrizione = "   ".to_string();
        assert_eq!(payload.validate(), Err("Expense description cannot be empty."));
    }

    #[test]
    fn test_team_member_validation() {
        let mut payload = CreateTeamMemberPayload {
            nome: "Giulia Neri".to_string(),
            ruolo: "pulizie".to_string(),
            email: None,
            telefono: Some("+39 333 1234567".to_string()),
        };
        assert!(payload.validate().is_ok());

        payload.email = Some("giulia.example.com".to_string());
        assert_eq!(payload.validate(), Err("Email address is not valid."));

        payload.email = Some("giulia@example.com".to_string());
        assert!(payload.validate().is_ok());

        payload.ruolo = " ".to_string();
        assert_eq!(payload.validate(), Err("Member role cannot be empty."));
    }
}
