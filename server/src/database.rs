// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::dashboard::{DashboardSources, DateWindow};

use anyhow::{Context, Result};
use chrono::Utc;
use common::{
    Activity, Booking, CreateActivityPayload, CreateBookingPayload, CreateExpensePayload,
    CreateIncomePayload, CreatePropertyPayload, CreateTeamMemberPayload, CreateTicketPayload,
    CreateVehiclePayload, Expense, Income, PaymentStatus, Priority, Property, TeamMember, Ticket,
    TicketStatus, Vehicle, VehicleStatus,
};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::{debug, info};

/// Every table the back-office reads and writes. Statements are idempotent so
/// the schema can be applied on each start.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    indirizzo TEXT NOT NULL,
    data_fine_contratto DATE NULL
);

CREATE TABLE IF NOT EXISTS bookings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id INTEGER NOT NULL,
    ospite TEXT NOT NULL,
    data_inizio DATE NOT NULL,
    data_fine DATE NOT NULL,
    importo REAL NULL,
    stato TEXT NOT NULL DEFAULT 'confermata'
);

CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    descrizione TEXT NOT NULL,
    importo REAL NOT NULL,
    data_scadenza DATE NOT NULL,
    stato TEXT NOT NULL DEFAULT 'da_pagare',
    property_id INTEGER NULL,
    vehicle_id INTEGER NULL
);

CREATE TABLE IF NOT EXISTS income (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id INTEGER NOT NULL,
    inquilino TEXT NOT NULL,
    descrizione TEXT NOT NULL,
    importo REAL NOT NULL,
    data_scadenza DATE NOT NULL,
    stato TEXT NOT NULL DEFAULT 'da_pagare'
);

CREATE TABLE IF NOT EXISTS tickets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id INTEGER NOT NULL,
    titolo TEXT NOT NULL,
    descrizione TEXT NOT NULL,
    priorita TEXT NOT NULL DEFAULT 'media',
    stato TEXT NOT NULL DEFAULT 'aperto',
    scadenza DATE NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    targa TEXT NOT NULL,
    modello TEXT NOT NULL,
    stato TEXT NOT NULL DEFAULT 'attivo',
    scadenza_revisione DATE NULL,
    scadenza_assicurazione DATE NULL
);

CREATE TABLE IF NOT EXISTS activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    titolo TEXT NOT NULL,
    descrizione TEXT NOT NULL,
    data DATE NOT NULL,
    priorita TEXT NOT NULL DEFAULT 'media',
    stato TEXT NOT NULL DEFAULT 'da_fare'
);

CREATE TABLE IF NOT EXISTS team_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    ruolo TEXT NOT NULL,
    email TEXT NULL,
    telefono TEXT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    tipo TEXT NOT NULL,
    titolo TEXT NOT NULL,
    messaggio TEXT NOT NULL,
    link TEXT NOT NULL,
    priorita TEXT NOT NULL,
    categoria TEXT NULL,
    inviata BOOLEAN NOT NULL DEFAULT 0,
    giorno DATE NOT NULL,
    created_at TIMESTAMP NOT NULL,
    data_invio TIMESTAMP NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS notifications_one_per_day
    ON notifications (user_id, link, giorno);
"#;

const BOOKING_SELECT: &str = "SELECT b.id, b.property_id, p.nome AS property_name, b.ospite, \
     b.data_inizio, b.data_fine, b.importo, b.stato \
     FROM bookings b LEFT JOIN properties p ON p.id = b.property_id";

const EXPENSE_SELECT: &str = "SELECT e.id, e.descrizione, e.importo, e.data_scadenza, e.stato, \
     e.property_id, p.nome AS property_name, e.vehicle_id, v.targa AS vehicle_plate \
     FROM expenses e \
     LEFT JOIN properties p ON p.id = e.property_id \
     LEFT JOIN vehicles v ON v.id = e.vehicle_id";

const INCOME_SELECT: &str = "SELECT i.id, i.property_id, p.nome AS property_name, i.inquilino, \
     i.descrizione, i.importo, i.data_scadenza, i.stato \
     FROM income i LEFT JOIN properties p ON p.id = i.property_id";

const TICKET_SELECT: &str = "SELECT t.id, t.property_id, p.nome AS property_name, t.titolo, \
     t.descrizione, t.priorita, t.stato, t.scadenza, t.created_at \
     FROM tickets t LEFT JOIN properties p ON p.id = t.property_id";

/// Establishes the database connection pool.
/// If the database does not exist, it creates it, then applies the schema.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        if let Some(parent) = database_url
            .strip_prefix("sqlite://")
            .and_then(|path| std::path::Path::new(path).parent())
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Creates every table and index if missing.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to create schema")?;

    info!("Schema is ready.");
    Ok(())
}

// --- Dashboard window reads ---

/// Loads the six dashboard collections for `window`. The reads are independent
/// and run concurrently; they are not taken from a single snapshot.
pub async fn load_dashboard_sources(
    pool: &SqlitePool,
    window: DateWindow,
) -> Result<DashboardSources> {
    let (bookings, expenses, income, tickets, vehicles, activities) = tokio::try_join!(
        bookings_in_window(pool, window),
        expenses_in_window(pool, window),
        income_in_window(pool, window),
        open_tickets(pool),
        active_vehicles(pool),
        activities_in_window(pool, window),
    )?;

    debug!(
        "Loaded dashboard sources for {} .. {}: {} bookings, {} expenses, {} income, {} tickets, {} vehicles, {} activities",
        window.start,
        window.end,
        bookings.len(),
        expenses.len(),
        income.len(),
        tickets.len(),
        vehicles.len(),
        activities.len()
    );

    Ok(DashboardSources {
        bookings,
        expenses,
        income,
        tickets,
        vehicles,
        activities,
    })
}

/// Bookings overlapping the window.
pub async fn bookings_in_window(pool: &SqlitePool, window: DateWindow) -> Result<Vec<Booking>> {
    sqlx::query_as::<_, Booking>(&format!(
        "{BOOKING_SELECT} WHERE b.data_fine >= ? AND b.data_inizio <= ? ORDER BY b.data_inizio ASC, b.id ASC"
    ))
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve bookings for the dashboard window")
}

pub async fn expenses_in_window(pool: &SqlitePool, window: DateWindow) -> Result<Vec<Expense>> {
    sqlx::query_as::<_, Expense>(&format!(
        "{EXPENSE_SELECT} WHERE e.data_scadenza BETWEEN ? AND ? ORDER BY e.data_scadenza ASC, e.id ASC"
    ))
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve expenses for the dashboard window")
}

pub async fn income_in_window(pool: &SqlitePool, window: DateWindow) -> Result<Vec<Income>> {
    sqlx::query_as::<_, Income>(&format!(
        "{INCOME_SELECT} WHERE i.data_scadenza BETWEEN ? AND ? ORDER BY i.data_scadenza ASC, i.id ASC"
    ))
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve income for the dashboard window")
}

pub async fn activities_in_window(pool: &SqlitePool, window: DateWindow) -> Result<Vec<Activity>> {
    sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE data BETWEEN ? AND ? ORDER BY data ASC, id ASC",
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve activities for the dashboard window")
}

/// Tickets not yet resolved, whatever their date.
pub async fn open_tickets(pool: &SqlitePool) -> Result<Vec<Ticket>> {
    sqlx::query_as::<_, Ticket>(&format!(
        "{TICKET_SELECT} WHERE t.stato != 'risolto' ORDER BY t.created_at ASC, t.id ASC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to retrieve open tickets from DB")
}

pub async fn active_vehicles(pool: &SqlitePool) -> Result<Vec<Vehicle>> {
    sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE stato = 'attivo' ORDER BY id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve active vehicles from DB")
}

// --- Reminder scan reads ---

pub async fn unpaid_expenses(pool: &SqlitePool) -> Result<Vec<Expense>> {
    sqlx::query_as::<_, Expense>(&format!(
        "{EXPENSE_SELECT} WHERE e.stato != 'pagato' ORDER BY e.data_scadenza ASC, e.id ASC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to retrieve unpaid expenses from DB")
}

pub async fn unpaid_income(pool: &SqlitePool) -> Result<Vec<Income>> {
    sqlx::query_as::<_, Income>(&format!(
        "{INCOME_SELECT} WHERE i.stato = 'da_pagare' ORDER BY i.data_scadenza ASC, i.id ASC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to retrieve unpaid income from DB")
}

// --- Full listings ---

pub async fn list_properties(pool: &SqlitePool) -> Result<Vec<Property>> {
    sqlx::query_as::<_, Property>("SELECT * FROM properties ORDER BY nome ASC, id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve properties from DB")
}

pub async fn list_bookings(pool: &SqlitePool) -> Result<Vec<Booking>> {
    sqlx::query_as::<_, Booking>(&format!("{BOOKING_SELECT} ORDER BY b.data_inizio ASC, b.id ASC"))
        .fetch_all(pool)
        .await
        .context("Failed to retrieve bookings from DB")
}

pub async fn list_expenses(pool: &SqlitePool) -> Result<Vec<Expense>> {
    sqlx::query_as::<_, Expense>(&format!("{EXPENSE_SELECT} ORDER BY e.data_scadenza ASC, e.id ASC"))
        .fetch_all(pool)
        .await
        .context("Failed to retrieve expenses from DB")
}

pub async fn list_income(pool: &SqlitePool) -> Result<Vec<Income>> {
    sqlx::query_as::<_, Income>(&format!("{INCOME_SELECT} ORDER BY i.data_scadenza ASC, i.id ASC"))
        .fetch_all(pool)
        .await
        .context("Failed to retrieve income from DB")
}

pub async fn list_tickets(pool: &SqlitePool) -> Result<Vec<Ticket>> {
    sqlx::query_as::<_, Ticket>(&format!("{TICKET_SELECT} ORDER BY t.created_at DESC, t.id DESC"))
        .fetch_all(pool)
        .await
        .context("Failed to retrieve tickets from DB")
}

pub async fn list_vehicles(pool: &SqlitePool) -> Result<Vec<Vehicle>> {
    sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles ORDER BY targa ASC, id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve vehicles from DB")
}

pub async fn list_activities(pool: &SqlitePool) -> Result<Vec<Activity>> {
    sqlx::query_as::<_, Activity>("SELECT * FROM activities ORDER BY data ASC, id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve activities from DB")
}

pub async fn list_team_members(pool: &SqlitePool) -> Result<Vec<TeamMember>> {
    sqlx::query_as::<_, TeamMember>("SELECT * FROM team_members ORDER BY nome ASC, id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve team members from DB")
}

// --- Inserts ---
// Rows with embedded names are read back through their SELECT so the caller
// gets the same shape the listings return.

pub async fn create_property_in_db(
    pool: &SqlitePool,
    payload: CreatePropertyPayload,
) -> Result<Property> {
    let id = sqlx::query(
        "INSERT INTO properties (nome, indirizzo, data_fine_contratto) VALUES (?, ?, ?)",
    )
    .bind(&payload.nome)
    .bind(&payload.indirizzo)
    .bind(payload.data_fine_contratto)
    .execute(pool)
    .await
    .context("Failed to insert property into DB")?
    .last_insert_rowid();

    Ok(Property {
        id,
        nome: payload.nome,
        indirizzo: payload.indirizzo,
        data_fine_contratto: payload.data_fine_contratto,
    })
}

pub async fn create_booking_in_db(
    pool: &SqlitePool,
    payload: CreateBookingPayload,
) -> Result<Booking> {
    let stato = payload.stato.unwrap_or_else(|| "confermata".to_string());
    debug!(
        "Insert booking: property_id={}, ospite={}, {} .. {}",
        payload.property_id, payload.ospite, payload.data_inizio, payload.data_fine
    );

    let id = sqlx::query(
        "INSERT INTO bookings (property_id, ospite, data_inizio, data_fine, importo, stato) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(payload.property_id)
    .bind(&payload.ospite)
    .bind(payload.data_inizio)
    .bind(payload.data_fine)
    .bind(payload.importo)
    .bind(&stato)
    .execute(pool)
    .await
    .context("Failed to insert booking into DB")?
    .last_insert_rowid();

    sqlx::query_as::<_, Booking>(&format!("{BOOKING_SELECT} WHERE b.id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to read back inserted booking")
}

pub async fn create_expense_in_db(
    pool: &SqlitePool,
    payload: CreateExpensePayload,
) -> Result<Expense> {
    let stato = payload.stato.unwrap_or(PaymentStatus::DaPagare);

    let id = sqlx::query(
        "INSERT INTO expenses (descrizione, importo, data_scadenza, stato, property_id, vehicle_id) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.descrizione)
    .bind(payload.importo)
    .bind(payload.data_scadenza)
    .bind(stato)
    .bind(payload.property_id)
    .bind(payload.vehicle_id)
    .execute(pool)
    .await
    .context("Failed to insert expense into DB")?
    .last_insert_rowid();

    sqlx::query_as::<_, Expense>(&format!("{EXPENSE_SELECT} WHERE e.id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to read back inserted expense")
}

pub async fn create_income_in_db(pool: &SqlitePool, payload: CreateIncomePayload) -> Result<Income> {
    let stato = payload.stato.unwrap_or(PaymentStatus::DaPagare);

    let id = sqlx::query(
        "INSERT INTO income (property_id, inquilino, descrizione, importo, data_scadenza, stato) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(payload.property_id)
    .bind(&payload.inquilino)
    .bind(&payload.descrizione)
    .bind(payload.importo)
    .bind(payload.data_scadenza)
    .bind(stato)
    .execute(pool)
    .await
    .context("Failed to insert income into DB")?
    .last_insert_rowid();

    sqlx::query_as::<_, Income>(&format!("{INCOME_SELECT} WHERE i.id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to read back inserted income")
}

pub async fn create_ticket_in_db(pool: &SqlitePool, payload: CreateTicketPayload) -> Result<Ticket> {
    let priorita = payload.priorita.unwrap_or(Priority::Media);

    let id = sqlx::query(
        "INSERT INTO tickets (property_id, titolo, descrizione, priorita, stato, scadenza, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(payload.property_id)
    .bind(&payload.titolo)
    .bind(&payload.descrizione)
    .bind(priorita)
    .bind(TicketStatus::Aperto)
    .bind(payload.scadenza)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to insert ticket into DB")?
    .last_insert_rowid();

    sqlx::query_as::<_, Ticket>(&format!("{TICKET_SELECT} WHERE t.id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to read back inserted ticket")
}

pub async fn create_vehicle_in_db(
    pool: &SqlitePool,
    payload: CreateVehiclePayload,
) -> Result<Vehicle> {
    let id = sqlx::query(
        "INSERT INTO vehicles (targa, modello, stato, scadenza_revisione, scadenza_assicurazione) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.targa)
    .bind(&payload.modello)
    .bind(VehicleStatus::Attivo)
    .bind(payload.scadenza_revisione)
    .bind(payload.scadenza_assicurazione)
    .execute(pool)
    .await
    .context("Failed to insert vehicle into DB")?
    .last_insert_rowid();

    Ok(Vehicle {
        id,
        targa: payload.targa,
        modello: payload.modello,
        stato: VehicleStatus::Attivo,
        scadenza_revisione: payload.scadenza_revisione,
        scadenza_assicurazione: payload.scadenza_assicurazione,
    })
}

pub async fn create_activity_in_db(
    pool: &SqlitePool,
    payload: CreateActivityPayload,
) -> Result<Activity> {
    let priorita = payload.priorita.unwrap_or(Priority::Media);

    let id = sqlx::query(
        "INSERT INTO activities (titolo, descrizione, data, priorita, stato) VALUES (?, ?, ?, ?, 'da_fare')",
    )
    .bind(&payload.titolo)
    .bind(&payload.descrizione)
    .bind(payload.data)
    .bind(priorita)
    .execute(pool)
    .await
    .context("Failed to insert activity into DB")?
    .last_insert_rowid();

    Ok(Activity {
        id,
        titolo: payload.titolo,
        descrizione: payload.descrizione,
        data: payload.data,
        priorita,
        stato: common::ActivityStatus::DaFare,
    })
}

pub async fn create_team_member_in_db(
    pool: &SqlitePool,
    payload: CreateTeamMemberPayload,
) -> Result<TeamMember> {
    let id = sqlx::query(
        "INSERT INTO team_members (nome, ruolo, email, telefono) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.nome)
    .bind(&payload.ruolo)
    .bind(&payload.email)
    .bind(&payload.telefono)
    .execute(pool)
    .await
    .context("Failed to insert team member into DB")?
    .last_insert_rowid();

    Ok(TeamMember {
        id,
        nome: payload.nome,
        ruolo: payload.ruolo,
        email: payload.email,
        telefono: payload.telefono,
    })
}

// --- Updates ---
// Each returns None when no row has the given ID. Otherwise the row is read
// back in the shape the listings return.

pub async fn update_property_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreatePropertyPayload,
) -> Result<Option<Property>> {
    let result = sqlx::query(
        "UPDATE properties SET nome = ?, indirizzo = ?, data_fine_contratto = ? WHERE id = ?",
    )
    .bind(&payload.nome)
    .bind(&payload.indirizzo)
    .bind(payload.data_fine_contratto)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update property in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(Property {
        id,
        nome: payload.nome,
        indirizzo: payload.indirizzo,
        data_fine_contratto: payload.data_fine_contratto,
    }))
}

pub async fn update_booking_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreateBookingPayload,
) -> Result<Option<Booking>> {
    let result = sqlx::query(
        "UPDATE bookings SET property_id = ?, ospite = ?, data_inizio = ?, data_fine = ?, importo = ?, \
         stato = COALESCE(?, stato) WHERE id = ?",
    )
    .bind(payload.property_id)
    .bind(&payload.ospite)
    .bind(payload.data_inizio)
    .bind(payload.data_fine)
    .bind(payload.importo)
    .bind(&payload.stato)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update booking in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    sqlx::query_as::<_, Booking>(&format!("{BOOKING_SELECT} WHERE b.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read back updated booking")
}

pub async fn update_expense_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreateExpensePayload,
) -> Result<Option<Expense>> {
    let result = sqlx::query(
        "UPDATE expenses SET descrizione = ?, importo = ?, data_scadenza = ?, stato = COALESCE(?, stato), \
         property_id = ?, vehicle_id = ? WHERE id = ?",
    )
    .bind(&payload.descrizione)
    .bind(payload.importo)
    .bind(payload.data_scadenza)
    .bind(payload.stato)
    .bind(payload.property_id)
    .bind(payload.vehicle_id)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update expense in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    sqlx::query_as::<_, Expense>(&format!("{EXPENSE_SELECT} WHERE e.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read back updated expense")
}

pub async fn update_income_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreateIncomePayload,
) -> Result<Option<Income>> {
    let result = sqlx::query(
        "UPDATE income SET property_id = ?, inquilino = ?, descrizione = ?, importo = ?, data_scadenza = ?, \
         stato = COALESCE(?, stato) WHERE id = ?",
    )
    .bind(payload.property_id)
    .bind(&payload.inquilino)
    .bind(&payload.descrizione)
    .bind(payload.importo)
    .bind(payload.data_scadenza)
    .bind(payload.stato)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update income in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    sqlx::query_as::<_, Income>(&format!("{INCOME_SELECT} WHERE i.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read back updated income")
}

pub async fn update_ticket_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreateTicketPayload,
) -> Result<Option<Ticket>> {
    let result = sqlx::query(
        "UPDATE tickets SET property_id = ?, titolo = ?, descrizione = ?, priorita = COALESCE(?, priorita), \
         scadenza = ? WHERE id = ?",
    )
    .bind(payload.property_id)
    .bind(&payload.titolo)
    .bind(&payload.descrizione)
    .bind(payload.priorita)
    .bind(payload.scadenza)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update ticket in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    sqlx::query_as::<_, Ticket>(&format!("{TICKET_SELECT} WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read back updated ticket")
}

pub async fn update_vehicle_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreateVehiclePayload,
) -> Result<Option<Vehicle>> {
    let result = sqlx::query(
        "UPDATE vehicles SET targa = ?, modello = ?, scadenza_revisione = ?, scadenza_assicurazione = ? \
         WHERE id = ?",
    )
    .bind(&payload.targa)
    .bind(&payload.modello)
    .bind(payload.scadenza_revisione)
    .bind(payload.scadenza_assicurazione)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update vehicle in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read back updated vehicle")
}

pub async fn update_activity_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreateActivityPayload,
) -> Result<Option<Activity>> {
    let result = sqlx::query(
        "UPDATE activities SET titolo = ?, descrizione = ?, data = ?, priorita = COALESCE(?, priorita) \
         WHERE id = ?",
    )
    .bind(&payload.titolo)
    .bind(&payload.descrizione)
    .bind(payload.data)
    .bind(payload.priorita)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update activity in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read back updated activity")
}

pub async fn update_team_member_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: CreateTeamMemberPayload,
) -> Result<Option<TeamMember>> {
    let result = sqlx::query(
        "UPDATE team_members SET nome = ?, ruolo = ?, email = ?, telefono = ? WHERE id = ?",
    )
    .bind(&payload.nome)
    .bind(&payload.ruolo)
    .bind(&payload.email)
    .bind(&payload.telefono)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update team member in DB")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(TeamMember {
        id,
        nome: payload.nome,
        ruolo: payload.ruolo,
        email: payload.email,
        telefono: payload.telefono,
    }))
}

// --- Deletes ---

/// Back-office tables whose rows can be removed by ID.
/// Notifications are not listed: they are only ever marked read.
#[derive(Debug, Clone, Copy)]
pub enum Record {
    Property,
    Booking,
    Expense,
    Income,
    Ticket,
    Vehicle,
    Activity,
    TeamMember,
}

impl Record {
    fn table(&self) -> &'static str {
        match self {
            Record::Property => "properties",
            Record::Booking => "bookings",
            Record::Expense => "expenses",
            Record::Income => "income",
            Record::Ticket => "tickets",
            Record::Vehicle => "vehicles",
            Record::Activity => "activities",
            Record::TeamMember => "team_members",
        }
    }
}

/// Deletes a row by its ID.
/// Returns false if no row with the given ID exists.
#[allow(clippy::uninlined_format_args)]
pub async fn delete_row_in_db(pool: &SqlitePool, record: Record, id: i64) -> Result<bool> {
    debug!("Deleting {} row with ID: {}", record.table(), id);

    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", record.table()))
        .bind(id)
        .execute(pool)
        .await
        .context(format!("Failed to delete {} row with ID: {}", record.table(), id))?;

    let rows_affected = result.rows_affected();
    info!("Deleted {} rows of {} for ID: {}", rows_affected, record.table(), id);

    Ok(rows_affected > 0)
}

// --- Status transitions ---

/// Tables whose `stato` can be moved forward from the back-office.
#[derive(Debug, Clone, Copy)]
pub enum StatusTarget {
    Expense,
    Income,
    Ticket,
    Activity,
}

impl StatusTarget {
    fn table(&self) -> &'static str {
        match self {
            StatusTarget::Expense => "expenses",
            StatusTarget::Income => "income",
            StatusTarget::Ticket => "tickets",
            StatusTarget::Activity => "activities",
        }
    }

    /// The terminal state for the table.
    fn done(&self) -> &'static str {
        match self {
            StatusTarget::Expense | StatusTarget::Income => "pagato",
            StatusTarget::Ticket => "risolto",
            StatusTarget::Activity => "completato",
        }
    }
}

/// Moves a row to its terminal state.
/// Returns false if no row with the given ID exists.
#[allow(clippy::uninlined_format_args)]
pub async fn close_row_in_db(pool: &SqlitePool, target: StatusTarget, id: i64) -> Result<bool> {
    debug!("Closing {} row with ID: {}", target.table(), id);

    let result = sqlx::query(&format!("UPDATE {} SET stato = ? WHERE id = ?", target.table()))
        .bind(target.done())
        .bind(id)
        .execute(pool)
        .await
        .context(format!("Failed to update {} row with ID: {}", target.table(), id))?;

    let rows_affected = result.rows_affected();
    info!(
        "Set stato='{}' on {} rows of {} for ID: {}",
        target.done(),
        rows_affected,
        target.table(),
        id
    );

    Ok(rows_affected > 0)
}
