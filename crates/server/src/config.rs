//! Gateway configuration via `recordgate.toml` and command-line flags.
//!
//! The file is optional: every section and field has a default. Flags given
//! on the command line override the file.

use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches, Command};
use recordgate_executor::{ScanConfig, TaskRegistryConfig};
use recordgate_store::MemoryStoreConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "recordgate.toml";

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("config file '{path}': {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid configuration
    #[error("failed to parse config file '{path}': {reason}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser diagnostic
        reason: String,
    },

    /// A value is out of range
    #[error("invalid config: {reason}")]
    Invalid {
        /// Details
        reason: String,
    },
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

/// Whole gateway configuration.
///
/// # Example
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8080"
/// log_level = "debug"
///
/// [scan]
/// default_max_records = 100
///
/// [tasks]
/// retention_secs = 600
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP listener and logging
    #[serde(default)]
    pub server: ServerConfig,
    /// Scan page sizes
    #[serde(default)]
    pub scan: ScanConfig,
    /// Background task registry
    #[serde(default)]
    pub tasks: TaskRegistryConfig,
    /// In-process store
    #[serde(default)]
    pub store: MemoryStoreConfig,
}

impl GatewayConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Recordgate configuration

[server]
# Address the HTTP listener binds to
bind = "127.0.0.1:8080"
# trace | debug | info | warn | error
log_level = "info"

[scan]
# Page size when a request omits maxRecords
default_max_records = 100
# Largest page size a request may ask for
max_records_limit = 10000

[tasks]
# Seconds a finished task stays queryable (running tasks are never evicted)
retention_secs = 3600
# Tracked tasks, running and finished, before submissions are refused
max_tracked_tasks = 10000
# Milliseconds between polls of running jobs
poll_interval_ms = 100

[store]
namespaces = ["test"]
nodes = ["node-1"]
# Threads running background jobs
job_workers = 2
# Accepted jobs allowed to wait for a thread before new ones are refused
max_queued_jobs = 256
# Seconds a finished job's outcome stays queryable in the store
job_retention_secs = 600
# Records a job updates per namespace lock acquisition
job_batch_size = 128
"#
    }

    /// Parse config text.
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &content)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_string(),
            })
        };
        if self.scan.default_max_records == 0 {
            return invalid("scan.default_max_records must be positive");
        }
        if self.scan.default_max_records > self.scan.max_records_limit {
            return invalid("scan.default_max_records exceeds scan.max_records_limit");
        }
        if self.tasks.max_tracked_tasks == 0 {
            return invalid("tasks.max_tracked_tasks must be positive");
        }
        if self.store.job_workers == 0 {
            return invalid("store.job_workers must be positive");
        }
        if self.store.job_batch_size == 0 {
            return invalid("store.job_batch_size must be positive");
        }
        if self.store.nodes.is_empty() {
            return invalid("store.nodes must name at least one node");
        }
        if parse_level(&self.server.log_level).is_none() {
            return invalid("server.log_level must be trace, debug, info, warn or error");
        }
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(bind) = &args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(level) = &args.log_level {
            self.server.log_level = level.clone();
        }
    }

    /// Tracing level for `server.log_level`.
    pub fn log_level(&self) -> tracing::Level {
        parse_level(&self.server.log_level).unwrap_or(tracing::Level::INFO)
    }
}

fn parse_level(level: &str) -> Option<tracing::Level> {
    level.parse().ok()
}

// ============================================================================
// Command line
// ============================================================================

/// Parsed command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--config <path>`
    pub config: Option<PathBuf>,
    /// `--bind <addr>`
    pub bind: Option<String>,
    /// `--log-level <level>`
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Extract flags from clap matches.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        CliArgs {
            config: matches.get_one::<String>("config").map(PathBuf::from),
            bind: matches.get_one::<String>("bind").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
        }
    }
}

/// Build the clap command for the `recordgate` binary.
pub fn build_cli() -> Command {
    Command::new("recordgate")
        .about("HTTP gateway for a record store")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .help("Config file (created with defaults if missing)"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .help("Listen address, overrides [server] bind"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Log level, overrides [server] log_level"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_toml_parses_to_default() {
        let config =
            GatewayConfig::from_toml_str(Path::new("inline"), GatewayConfig::default_toml())
                .unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = GatewayConfig::from_toml_str(
            Path::new("inline"),
            "[tasks]\nretention_secs = 5\n",
        )
        .unwrap();
        assert_eq!(config.tasks.retention_secs, 5);
        assert_eq!(config.tasks.max_tracked_tasks, 10_000);
        assert_eq!(config.store.job_workers, 2);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn invalid_values_rejected() {
        let err = GatewayConfig::from_toml_str(
            Path::new("inline"),
            "[scan]\ndefault_max_records = 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = GatewayConfig::from_toml_str(Path::new("inline"), "[store]\njob_workers = 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err =
            GatewayConfig::from_toml_str(Path::new("inline"), "[server\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        GatewayConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        assert_eq!(
            GatewayConfig::from_file(&path).unwrap(),
            GatewayConfig::default()
        );
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server]\nbind = \"0.0.0.0:9000\"\n").unwrap();

        GatewayConfig::write_default_if_missing(&path).unwrap();
        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = GatewayConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn cli_overrides_file() {
        let matches = build_cli()
            .try_get_matches_from([
                "recordgate",
                "--config",
                "gw.toml",
                "--bind",
                "0.0.0.0:1",
                "--log-level",
                "debug",
            ])
            .unwrap();
        let args = CliArgs::from_matches(&matches);
        assert_eq!(args.config, Some(PathBuf::from("gw.toml")));

        let mut config = GatewayConfig::default();
        config.apply_cli(&args);
        assert_eq!(config.server.bind, "0.0.0.0:1");
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn cli_rejects_unknown_level() {
        assert!(build_cli()
            .try_get_matches_from(["recordgate", "--log-level", "loud"])
            .is_err());
    }
}
