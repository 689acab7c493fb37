//! Add-on configuration
//!
//! The supervisor renders user options to a JSON file inside the container
//! (`/data/options.json`). Config is read once at process start and never
//! re-read mid-cycle.
//!
//! # Fields
//!
//! - `access_token`: Dropbox OAuth token (secret, never logged in clear)
//! - `dropbox_dir`: remote base path for uploaded snapshots
//! - `keep`: retention count; absent or 0 disables pruning
//! - `mins_between_backups`: polling interval (default 10)
//! - `debug`: log verbosity flag
//! - `backup_dir`: local snapshot directory (default `/backup`)

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default options file rendered by the supervisor
pub const DEFAULT_CONFIG_PATH: &str = "/data/options.json";

fn default_mins_between_backups() -> u64 {
    10
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/backup")
}

/// Runtime configuration for the backup daemon
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Dropbox OAuth access token
    pub access_token: String,

    /// Remote directory snapshots are uploaded under
    pub dropbox_dir: String,

    /// Number of newest snapshots to retain; `None` or 0 disables pruning
    #[serde(default)]
    pub keep: Option<usize>,

    /// Minutes to sleep between backup cycles
    #[serde(default = "default_mins_between_backups")]
    pub mins_between_backups: u64,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Local directory the supervisor writes snapshots to
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl Config {
    /// Load and validate configuration from a JSON options file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Config(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the rest of the system relies on
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::Config("access_token must not be empty".into()));
        }
        if !self.dropbox_dir.starts_with('/') {
            return Err(Error::Config(format!(
                "dropbox_dir must be an absolute Dropbox path, got {:?}",
                self.dropbox_dir
            )));
        }
        if self.mins_between_backups == 0 {
            return Err(Error::Config(
                "mins_between_backups must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Effective retention limit
    ///
    /// `Some(0)` means the same as unset: pruning disabled.
    pub fn keep_limit(&self) -> Option<usize> {
        self.keep.filter(|k| *k > 0)
    }
}

// Manual Debug so the token never lands in a log line.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &"HIDDEN")
            .field("dropbox_dir", &self.dropbox_dir)
            .field("keep", &self.keep)
            .field("mins_between_backups", &self.mins_between_backups)
            .field("debug", &self.debug)
            .field("backup_dir", &self.backup_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_options(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_options(
            r#"{
                "access_token": "tok",
                "dropbox_dir": "/snapshots",
                "keep": 5,
                "mins_between_backups": 30,
                "debug": true
            }"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.access_token, "tok");
        assert_eq!(config.dropbox_dir, "/snapshots");
        assert_eq!(config.keep, Some(5));
        assert_eq!(config.mins_between_backups, 30);
        assert!(config.debug);
        assert_eq!(config.backup_dir, PathBuf::from("/backup"));
    }

    #[test]
    fn test_load_defaults() {
        let file = write_options(r#"{"access_token": "tok", "dropbox_dir": "/snapshots"}"#);

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.keep, None);
        assert_eq!(config.mins_between_backups, 10);
        assert!(!config.debug);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/options.json");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_token_rejected() {
        let file = write_options(r#"{"access_token": " ", "dropbox_dir": "/snapshots"}"#);
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_relative_dropbox_dir_rejected() {
        let file = write_options(r#"{"access_token": "tok", "dropbox_dir": "snapshots"}"#);
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_keep_limit_zero_disables() {
        let file =
            write_options(r#"{"access_token": "tok", "dropbox_dir": "/snapshots", "keep": 0}"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.keep, Some(0));
        assert_eq!(config.keep_limit(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let file = write_options(
            r#"{"access_token": "super-secret", "dropbox_dir": "/snapshots"}"#,
        );
        let config = Config::load(file.path()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("HIDDEN"));
    }
}
