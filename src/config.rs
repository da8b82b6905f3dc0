use std::env;
use std::path::PathBuf;

use crate::question::QuestionBank;
use crate::{POINT_ALLOCATION, SINGLE_CHOICE};

/// Which bundled instrument to administer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Point allocation inventory
    Points,
    /// Single choice inventory
    Choice,
}

impl Variant {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "points" | "point_allocation" => Ok(Self::Points),
            "choice" | "single_choice" => Ok(Self::Choice),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }

    pub fn bank(&self) -> &'static QuestionBank {
        match self {
            Variant::Points => &POINT_ALLOCATION,
            Variant::Choice => &SINGLE_CHOICE,
        }
    }
}

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// `None` turns the JSON mirror off.
    pub backup_path: Option<PathBuf>,
    pub chart_dir: PathBuf,
    pub log_level: String,
    pub variant: Variant,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("BELBIN_DB_PATH")
            .unwrap_or_else(|_| "data/belbin_results.db".to_string())
            .into();
        let backup_path = match env::var("BELBIN_BACKUP_PATH") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.into()),
            Err(_) => Some("data/results.json".into()),
        };
        let chart_dir = env::var("BELBIN_CHART_DIR")
            .unwrap_or_else(|_| "data/charts".to_string())
            .into();
        let log_level = env::var("BELBIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let variant = match env::var("BELBIN_VARIANT") {
            Ok(value) => Variant::parse(&value)?,
            Err(_) => Variant::Points,
        };

        Ok(Self {
            db_path,
            backup_path,
            chart_dir,
            log_level,
            variant,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("BELBIN_VARIANT must be 'points' or 'choice', got '{0}'")]
    UnknownVariant(String),
    #[error("result database at {} is unavailable: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("BELBIN_DB_PATH");
        env::remove_var("BELBIN_BACKUP_PATH");
        env::remove_var("BELBIN_CHART_DIR");
        env::remove_var("BELBIN_LOG_LEVEL");
        env::remove_var("BELBIN_VARIANT");
    }

    #[test]
    fn test_defaults() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.db_path, PathBuf::from("data/belbin_results.db"));
        assert_eq!(config.backup_path, Some(PathBuf::from("data/results.json")));
        assert_eq!(config.chart_dir, PathBuf::from("data/charts"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.variant, Variant::Points);
    }

    #[test]
    fn test_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BELBIN_BACKUP_PATH", "");
        env::set_var("BELBIN_VARIANT", "Choice");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.backup_path, None);
        assert_eq!(config.variant, Variant::Choice);
        assert_eq!(config.variant.bank().len(), 7);
        reset_env();
    }

    #[test]
    fn test_unknown_variant() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BELBIN_VARIANT", "essay");
        assert_eq!(
            AppConfig::load().err(),
            Some(ConfigError::UnknownVariant("essay".to_string()))
        );
        reset_env();
    }
}
