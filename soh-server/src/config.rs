//! Configuration module

use std::env;
use std::path::PathBuf;

use ev_soh_core::constants;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server port
    pub port: u16,

    /// Directory holding manifest.json and the estimator artifacts
    pub model_dir: PathBuf,

    /// Calibration metrics table (`Metric,Value`)
    pub metrics_path: PathBuf,

    /// Optional pipeline constants JSON
    pub pipeline_config: Option<PathBuf>,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let model_dir = constants::get_model_dir();

        let metrics_path = constants::get_metrics_path(&model_dir);

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://vehicle.db?mode=rwc".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            model_dir,
            metrics_path,

            pipeline_config: constants::get_pipeline_config_path(),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
