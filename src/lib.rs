//! University Asset Tracker
//!
//! REST JSON server for tracking institution-owned equipment: asset registry,
//! issue/return workflow with overdue tracking, maintenance, and an auth gate
//! that only admits accounts from the institution's email domain.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
