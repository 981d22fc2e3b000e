pub mod analyzer;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod db;
pub mod engine;
pub mod error;
pub mod state;

use rusqlite::Connection;

use config::AppConfig;
use error::AppError;
use state::Session;

/// Opens the configured database read-only, or the bundled demo data.
pub fn open_connection(config: &AppConfig, demo: bool) -> Result<Connection, AppError> {
    if demo {
        return Ok(db::setup::open_demo()?);
    }
    Ok(db::setup::open_read_only(&config.db_path)?)
}

/// Loads every result set once and builds the dashboard over them. The
/// connection is not needed afterwards.
pub fn open_session(conn: &Connection, config: &AppConfig) -> Result<Session, AppError> {
    let dataset = db::queries::load_dataset(conn)?;
    Session::new(dataset, config)
}

// ─── E2E Integration Tests ──────────────────────────────────────────────────
