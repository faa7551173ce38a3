//! Equiplab equipment booking server
//!
//! Staff publish bookable time slots on university equipment, students
//! reserve parts of those slots, and admins manage users, roles and the
//! equipment inventory. Served as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scheduling;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Database handle for readiness checks, absent for in-memory stores
    pub repository: Option<repository::Repository>,
}
