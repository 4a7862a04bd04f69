// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/gestio";
const ENV_PREFIX: &str = "GESTIO";

/// Runtime settings. Read from `config/gestio.toml` when present, then
/// overridden by `GESTIO__*` environment variables
/// (e.g. `GESTIO__BIND_ADDR=127.0.0.1:8080`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// How often the background scanner checks for a new day.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Users the background scanner generates reminders for.
    #[serde(default)]
    pub reminder_users: Vec<String>,
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// `file` is a path without extension; the format is picked from the
    /// file found on disk.
    pub fn load_from(file: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("reminder_users")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }
}

fn default_database_url() -> String {
    "sqlite://database/gestio.db".to_string()
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_scan_interval_secs() -> u64 {
    5 * 60
}

fn default_notification_buffer() -> usize {
    64
}
