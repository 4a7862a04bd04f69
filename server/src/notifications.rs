// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use common::{Category, Notification, Priority};
use sqlx::SqlitePool;
use tracing::{debug, info};

const VEHICLE_GLYPH: char = '🚗';
const HOUSE_GLYPH: char = '🏠';

/// A reminder about to be written. `giorno` is the calendar day it belongs to;
/// the store keeps at most one row per user, link and day.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: String,
    pub tipo: String,
    pub titolo: String,
    pub messaggio: String,
    pub link: String,
    pub priorita: Priority,
    pub categoria: Category,
    pub giorno: NaiveDate,
}

/// Classifies a notification from its link and message text. Only used for
/// rows written before `categoria` was stored.
pub fn infer_category(link: &str, messaggio: &str) -> Category {
    let real = link.contains("ctx=real")
        || messaggio.contains(HOUSE_GLYPH)
        || link.contains("revenue");
    let mobile = link.contains("ctx=mobile") || messaggio.contains(VEHICLE_GLYPH);

    if mobile && !real {
        Category::Mobile
    } else {
        Category::Real
    }
}

pub fn effective_category(notification: &Notification) -> Category {
    notification
        .categoria
        .unwrap_or_else(|| infer_category(&notification.link, &notification.messaggio))
}

/// Inserts the notification unless one for the same user, link and day
/// already exists. Returns the stored row, or `None` for a duplicate.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    notification: &NewNotification,
) -> Result<Option<Notification>> {
    debug!(
        "Insert notification: user_id={}, link={}, giorno={}",
        notification.user_id, notification.link, notification.giorno
    );

    let inserted = sqlx::query_as::<_, Notification>(
        "INSERT INTO notifications (user_id, tipo, titolo, messaggio, link, priorita, categoria, inviata, giorno, created_at, data_invio) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, NULL) \
         ON CONFLICT (user_id, link, giorno) DO NOTHING \
         RETURNING *",
    )
    .bind(&notification.user_id)
    .bind(&notification.tipo)
    .bind(&notification.titolo)
    .bind(&notification.messaggio)
    .bind(&notification.link)
    .bind(notification.priorita)
    .bind(notification.categoria)
    .bind(notification.giorno)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
    .context("Failed to insert notification into DB")?;

    Ok(inserted)
}

/// Unread notifications of a user, newest first, optionally restricted to
/// one category.
pub async fn unread_for_user(
    pool: &SqlitePool,
    user_id: &str,
    category: Option<Category>,
) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? AND inviata = 0 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve unread notifications from DB")?;

    Ok(match category {
        Some(category) => notifications
            .into_iter()
            .filter(|notification| effective_category(notification) == category)
            .collect(),
        None => notifications,
    })
}

/// Number of unread notifications of a user, for the badge.
pub async fn unread_count(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND inviata = 0")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count unread notifications")
}

/// Marks one notification as read.
/// Returns false if it does not exist or was already read.
#[allow(clippy::uninlined_format_args)]
pub async fn mark_read(pool: &SqlitePool, notification_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE notifications SET inviata = 1, data_invio = ? WHERE id = ? AND inviata = 0",
    )
    .bind(Utc::now())
    .bind(notification_id)
    .execute(pool)
    .await
    .context(format!("Failed to mark notification {} as read", notification_id))?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET inviata = 1, data_invio = ? WHERE user_id = ? AND inviata = 0",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to mark notifications as read")?;

    let marked = result.rows_affected();
    info!("Marked {} notifications as read for user {}.", marked, user_id);
    Ok(marked)
}
