// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::realtime::NotificationHub;
use crate::reminders::ScanGuard;

/// Shared state injected into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub hub: NotificationHub,
    pub scans: Arc<ScanGuard>,
}

impl AppState {
    /// `notification_buffer` is how many undelivered notifications a slow
    /// live subscriber may fall behind before it starts skipping.
    pub fn new(pool: SqlitePool, notification_buffer: usize) -> Self {
        Self {
            pool,
            hub: NotificationHub::new(notification_buffer),
            scans: Arc::new(ScanGuard::default()),
        }
    }
}
