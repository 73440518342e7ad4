//! Application configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, then the
//! optional `config.toml` in the user's config directory, then `GULLY_*`
//! environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "gully";
/// File name of the user configuration.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides, e.g. `GULLY_OVERS_PER_INNINGS=10`.
pub const ENV_PREFIX: &str = "GULLY";
/// Longest innings the scorer accepts.
pub const MAX_OVERS_PER_INNINGS: u32 = 50;

const DEFAULT_OVERS: i64 = 6;
const DEFAULT_TEAM_A: &str = "Team A";
const DEFAULT_TEAM_B: &str = "Team B";

const DEFAULT_CONFIG_TOML: &str = r#"# Gully cricket scorer settings.
# Every value can also be set with a GULLY_ environment variable,
# e.g. GULLY_OVERS_PER_INNINGS=10.

# Where players, match history and logs are kept.
# data_dir = "/path/to/gully"

# Overs per innings (1-50).
overs_per_innings = 6

team_a_name = "Team A"
team_b_name = "Team B"
"#;

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root for stored JSON files and logs.
    pub data_dir: PathBuf,
    /// Overs each side gets.
    pub overs_per_innings: u32,
    /// Display name of the first side.
    pub team_a_name: String,
    /// Display name of the second side.
    pub team_b_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            overs_per_innings: DEFAULT_OVERS as u32,
            team_a_name: DEFAULT_TEAM_A.to_string(),
            team_b_name: DEFAULT_TEAM_B.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load using `path` as the config file. A missing file is fine.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .set_default("data_dir", default_data_dir().to_string_lossy().into_owned())?
            .set_default("overs_per_innings", DEFAULT_OVERS)?
            .set_default("team_a_name", DEFAULT_TEAM_A)?
            .set_default("team_b_name", DEFAULT_TEAM_B)?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("invalid configuration values")?;
        config.validate()?;
        info!(
            data_dir = %config.data_dir.display(),
            overs = config.overs_per_innings,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Reject settings the scorer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_OVERS_PER_INNINGS).contains(&self.overs_per_innings) {
            bail!(
                "overs_per_innings must be between 1 and {MAX_OVERS_PER_INNINGS}, got {}",
                self.overs_per_innings
            );
        }
        let team_a = self.team_a_name.trim();
        let team_b = self.team_b_name.trim();
        if team_a.is_empty() || team_b.is_empty() {
            bail!("team names cannot be empty");
        }
        if team_a.eq_ignore_ascii_case(team_b) {
            bail!("team names must differ, both are '{team_a}'");
        }
        Ok(())
    }

    /// Directory for log files.
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Location of the user config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default data directory under the platform data dir.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write the commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.toml"))?;
        assert_eq!(config.overs_per_innings, 6);
        assert_eq!(config.team_a_name, "Team A");
        assert_eq!(config.team_b_name, "Team B");
        assert_eq!(config.data_dir, default_data_dir());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "overs_per_innings = 10\nteam_a_name = \"Strikers\"\ndata_dir = \"/srv/gully\"\n",
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.overs_per_innings, 10);
        assert_eq!(config.team_a_name, "Strikers");
        assert_eq!(config.team_b_name, "Team B");
        assert_eq!(config.data_dir, PathBuf::from("/srv/gully"));
        assert_eq!(config.logs_dir(), PathBuf::from("/srv/gully/logs"));
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, DEFAULT_CONFIG_TOML);

        fs::write(&path, "overs_per_innings = 3\n")?;
        write_default_config(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.overs_per_innings, 3);
        Ok(())
    }

    #[test]
    fn validation_rejects_unplayable_settings() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "overs_per_innings = 0\n")?;
        assert!(AppConfig::load_from(&path).is_err());

        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        config.overs_per_innings = 51;
        assert!(config.validate().is_err());
        config.overs_per_innings = 20;
        config.team_b_name = "  ".to_string();
        assert!(config.validate().is_err());
        config.team_b_name = "team a".to_string();
        assert!(config.validate().is_err());
        Ok(())
    }
}
