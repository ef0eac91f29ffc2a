use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config as cfg;
use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "graphd.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ServerMode {
    /// One connection at a time, only the requested algorithm
    Serial,
    /// Worker pool taking turns at accept, four algorithms in parallel per connection
    LeaderFollower,
    /// Thread per connection feeding four persistent algorithm stages
    Pipeline,
}

impl Default for ServerMode {
    fn default() -> Self {
        Self::Pipeline
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServerMode::Serial => "serial",
            ServerMode::LeaderFollower => "leader-follower",
            ServerMode::Pipeline => "pipeline",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "graphd=info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_socket_path")]
    pub socket_path: PathBuf,
    #[serde(default)]
    pub mode: ServerMode,
    /// Leader-follower pool size
    #[serde(default = "ServerConfig::default_workers")]
    pub workers: usize,
    /// Seconds a connection may stay silent before its request read is abandoned
    #[serde(default = "ServerConfig::default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: Self::default_socket_path(),
            mode: ServerMode::default(),
            workers: Self::default_workers(),
            read_timeout_secs: Self::default_read_timeout_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    fn default_socket_path() -> PathBuf {
        PathBuf::from("mysocket")
    }

    fn default_workers() -> usize {
        8
    }

    fn default_read_timeout_secs() -> u64 {
        30
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Defaults, then the config file, then `GRAPHD__*` environment variables.
    ///
    /// An explicit `path` must exist; the implicit `graphd.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => cfg::File::from(path).required(true),
            None => cfg::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };
        cfg::Config::builder()
            .add_source(file)
            .add_source(cfg::Environment::with_prefix("GRAPHD").separator("__"))
            .build()
            .context("building configuration")?
            .try_deserialize::<Self>()
            .context("deserializing configuration")
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.socket_path.as_os_str().is_empty(),
            "socket_path cannot be empty"
        );
        anyhow::ensure!(self.workers > 0, "workers must be > 0");
        anyhow::ensure!(self.read_timeout_secs > 0, "read_timeout_secs must be > 0");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = ServerConfig::default();
        assert_eq!(config.mode, ServerMode::Pipeline);
        assert_eq!(config.workers, 8);
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
        config.validate().unwrap();
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphd.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "socket_path = \"/tmp/graphd.sock\"\nmode = \"leader-follower\"\nworkers = 3\nread_timeout_secs = 5\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/graphd.sock"));
        assert_eq!(config.mode, ServerMode::LeaderFollower);
        assert_eq!(config.workers, 3);
        assert_eq!(config.read_timeout_secs, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServerConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = ServerConfig {
            workers: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_read_timeout_rejected() {
        let config = ServerConfig {
            read_timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
