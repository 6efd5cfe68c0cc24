//! Runtime configuration resolved from flags and environment.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "birthday-reminder";
const DB_FILE_NAME: &str = "birthdays.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    /// Fills unset values with platform defaults and makes paths absolute.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        log_dir: Option<PathBuf>,
        log_level: Option<String>,
    ) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::data_dir()
                .context("no platform data directory; pass --data-dir")?
                .join(APP_DIR_NAME),
        };
        let data_dir = absolutize(&data_dir)?;
        let log_dir = match log_dir {
            Some(dir) => absolutize(&dir)?,
            None => data_dir.join(LOG_DIR_NAME),
        };
        let log_level =
            log_level.unwrap_or_else(|| birthday_core::default_log_level().to_string());

        Ok(Self {
            data_dir,
            log_dir,
            log_level,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("cannot resolve path `{}`", path.display()))
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use std::path::PathBuf;

    #[test]
    fn explicit_data_dir_drives_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config =
            AppConfig::resolve(Some(dir.path().to_path_buf()), None, Some("warn".into())).unwrap();

        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.log_dir, dir.path().join("logs"));
        assert_eq!(config.db_path(), dir.path().join("birthdays.sqlite3"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn relative_paths_become_absolute() {
        let config = AppConfig::resolve(
            Some(PathBuf::from("data")),
            Some(PathBuf::from("logs")),
            None,
        )
        .unwrap();

        assert!(config.data_dir.is_absolute());
        assert!(config.log_dir.is_absolute());
        assert_eq!(config.log_level, birthday_core::default_log_level());
    }
}
