//! Daemon configuration
//!
//! Built from an optional TOML file, then overridden by command-line flags
//! or their environment variables:
//!
//! ```toml
//! log_level = "info"
//!
//! [http]
//! address = "0.0.0.0"
//! port = 8080
//!
//! [fetch]
//! address = "lines-provider"
//! port = 8000
//!
//! [fetch.sports]
//! soccer = 1
//! football = 3
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use lines_fetcher::FetcherConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command-line arguments; every flag can also come from the environment
#[derive(Debug, Default, Parser)]
#[command(name = "linesd", version, about = "Sports lines daemon")]
pub struct Args {
    /// TOML config file
    #[arg(short, long, env = "KLP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address for the HTTP/WebSocket API
    #[arg(long, env = "KLP_HTTP_ADDRESS")]
    pub http_address: Option<String>,

    /// Port for the HTTP/WebSocket API
    #[arg(long, env = "KLP_HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Lines provider host
    #[arg(long, env = "FETCH_ADDRESS")]
    pub fetch_address: Option<String>,

    /// Lines provider port
    #[arg(long, env = "FETCH_PORT")]
    pub fetch_port: Option<u16>,

    /// Sports and polling intervals in seconds as JSON, e.g. '{"soccer": 1}'
    #[arg(long, env = "FETCH_SPORTS")]
    pub fetch_sports: Option<String>,

    /// Log level
    #[arg(long, env = "KLP_LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, env = "KLP_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid sports list: {0}")]
    InvalidSports(#[from] serde_json::Error),

    #[error("No sports configured to fetch")]
    NoSports,

    #[error("Polling interval for sport '{0}' must be greater than zero")]
    ZeroInterval(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    #[value(alias = "panic", alias = "fatal")]
    #[serde(alias = "panic", alias = "fatal")]
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// HTTP/WebSocket listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Upstream lines provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub address: String,
    pub port: u16,
    /// Sport -> polling interval in seconds
    pub sports: HashMap<String, u64>,
    /// Timeout for a single provider request in seconds
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 8000,
            sports: HashMap::new(),
            timeout_secs: 3,
        }
    }
}

impl FetchConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        let sports = self
            .sports
            .iter()
            .map(|(sport, secs)| (sport.clone(), Duration::from_secs(*secs)))
            .collect();
        FetcherConfig::new(self.base_url(), sports)
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub http: HttpConfig,
    pub fetch: FetchConfig,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the final configuration from arguments and validate it
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields with whatever was given on the command line
    pub fn apply(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(ref address) = args.http_address {
            self.http.address = address.clone();
        }
        if let Some(port) = args.http_port {
            self.http.port = port;
        }
        if let Some(ref address) = args.fetch_address {
            self.fetch.address = address.clone();
        }
        if let Some(port) = args.fetch_port {
            self.fetch.port = port;
        }
        if let Some(ref sports) = args.fetch_sports {
            self.fetch.sports = serde_json::from_str(sports)?;
        }
        if let Some(level) = args.log_level {
            self.log_level = level;
        }
        if let Some(format) = args.log_format {
            self.log_format = format;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.sports.is_empty() {
            return Err(ConfigError::NoSports);
        }
        if let Some((sport, _)) = self.fetch.sports.iter().find(|(_, secs)| **secs == 0) {
            return Err(ConfigError::ZeroInterval(sport.clone()));
        }
        Ok(())
    }
}
