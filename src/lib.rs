//! FRC Scouting Server Library
//!
//! This module exports the core types and functions for testing and reuse.

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod fields;
pub mod routes;

pub use config::Config;
pub use error::{AppError, Result};
pub use fields::ScoutingConfig;

use std::sync::Arc;

use sqlx::SqlitePool;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub scouting: Arc<ScoutingConfig>,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given pool, field configuration,
    /// and environment configuration
    pub fn new(pool: SqlitePool, scouting: ScoutingConfig, config: Config) -> Self {
        Self {
            pool,
            scouting: Arc::new(scouting),
            config,
        }
    }
}
