use std::path::{Path, PathBuf};

use stepladder_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

pub const CONFIG_PATH_ENV: &str = "STEPLADDER_CONFIG";
pub const DB_PATH_ENV: &str = "STEPLADDER_DB_PATH";
pub const BUSY_TIMEOUT_ENV: &str = "STEPLADDER_BUSY_TIMEOUT_MS";
pub const LOG_LEVEL_ENV: &str = "STEPLADDER_LOG_LEVEL";

/// Builds an `AppConfig` from an optional config file plus environment
/// overrides. Precedence, lowest first: defaults, file, environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for this process.
    ///
    /// A `.env` file in the working directory is read first if present. The
    /// config file is `explicit_path` when given, otherwise whatever
    /// `STEPLADDER_CONFIG` names; with neither, defaults are used.
    pub fn load(explicit_path: Option<&Path>) -> Result<AppConfig> {
        if dotenvy::dotenv().is_err() {
            debug!("no .env file found, relying on environment variables");
        }
        Self::load_with_env(explicit_path, |key| std::env::var(key).ok())
    }

    /// Same as [`ConfigLoader::load`] but reads variables through `env`
    /// instead of the process environment.
    pub fn load_with_env<F>(explicit_path: Option<&Path>, env: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match file {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!("configuration loaded from {}", path.display());
                config
            }
            None => AppConfig::default(),
        };

        apply_env_overrides(&mut config, &env)?;
        config.validate().map_err(Error::Config)?;

        debug!(
            "database path: {}, busy timeout: {}ms",
            config.database.path.display(),
            config.database.busy_timeout_ms
        );
        Ok(config)
    }

    /// Parse a YAML or TOML config file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}"))),
            "toml" => {
                toml::from_str(&contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
            }
            other => Err(Error::Config(format!(
                "unsupported config extension: {other}"
            ))),
        }
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, env: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env(DB_PATH_ENV).filter(|v| !v.is_empty()) {
        config.database.path = PathBuf::from(path);
    }
    if let Some(raw) = env(BUSY_TIMEOUT_ENV).filter(|v| !v.is_empty()) {
        config.database.busy_timeout_ms = raw.trim().parse().map_err(|_| {
            Error::Config(format!("{BUSY_TIMEOUT_ENV} must be an integer, got '{raw}'"))
        })?;
    }
    if let Some(level) = env(LOG_LEVEL_ENV).filter(|v| !v.is_empty()) {
        config.log.level = level;
    }
    Ok(())
}
