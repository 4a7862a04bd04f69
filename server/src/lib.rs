// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod handlers;
pub mod notifications;
pub mod realtime;
pub mod reminders;
pub mod routes;
pub mod state;
pub mod suggestions;
