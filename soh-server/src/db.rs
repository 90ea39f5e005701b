//! Database module - SQLite vehicle registry and schema

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Apply the schema
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Vehicles (one row per owner + vehicle)
CREATE TABLE IF NOT EXISTS vehicles (
    user_id TEXT NOT NULL,
    vehicle_id TEXT NOT NULL,
    battery_type TEXT NOT NULL,
    buying_price REAL NOT NULL,
    buying_date TEXT NOT NULL,
    manufacture_date TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (user_id, vehicle_id)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_vehicles_user ON vehicles(user_id);
"#;
