//! Configuration module

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::logic::decision::DEFAULT_BENIGN_LABELS;
use crate::logic::error::IdsError;
use crate::logic::source::ControllerConfig;

/// What the process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Polling loop and prediction server
    All,
    Poll,
    Serve,
    /// Poll and log feature vectors only
    Features,
}

impl FromStr for Mode {
    type Err = IdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Mode::All),
            "poll" => Ok(Mode::Poll),
            "serve" => Ok(Mode::Serve),
            "features" => Ok(Mode::Features),
            other => Err(IdsError::Config(format!(
                "unknown IDS_MODE {:?} (expected all, poll, serve or features)",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::All => "all",
            Mode::Poll => "poll",
            Mode::Serve => "serve",
            Mode::Features => "features",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    pub mode: Mode,

    /// Controller REST base, e.g. `http://127.0.0.1:8181`
    pub controller_url: String,
    pub flows_path: String,
    pub controller_user: String,
    pub controller_password: String,
    pub http_timeout: Duration,

    pub poll_interval: Duration,

    /// Directory holding the trained model artifacts
    pub artifacts_dir: PathBuf,

    pub benign_labels: Vec<String>,

    /// Label the batch rule treats as normal; derived from the vocabulary when unset
    pub baseline_label: Option<String>,

    pub log_format: LogFormat,

    /// Environment (development, production)
    pub environment: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("mode", &self.mode)
            .field("controller", &self.controller())
            .field("poll_interval", &self.poll_interval)
            .field("artifacts_dir", &self.artifacts_dir)
            .field("benign_labels", &self.benign_labels)
            .field("baseline_label", &self.baseline_label)
            .field("log_format", &self.log_format)
            .field("environment", &self.environment)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, IdsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IdsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |key: &str, default: u64| {
            Duration::from_secs(
                lookup(key)
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|n: &u64| *n > 0)
                    .unwrap_or(default),
            )
        };

        let mode = match lookup("IDS_MODE") {
            Some(v) => v.parse()?,
            None => Mode::All,
        };

        let benign_labels = match lookup("IDS_BENIGN_LABELS") {
            Some(v) => parse_label_list(&v),
            None => DEFAULT_BENIGN_LABELS.iter().map(|s| s.to_string()).collect(),
        };

        let log_format = match lookup("IDS_LOG_FORMAT").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(5000),

            mode,

            controller_url: lookup("IDS_CONTROLLER_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8181".to_string()),

            flows_path: lookup("IDS_FLOWS_PATH")
                .unwrap_or_else(|| "/onos/v1/flows".to_string()),

            controller_user: lookup("IDS_CONTROLLER_USER")
                .unwrap_or_else(|| "onos".to_string()),

            controller_password: lookup("IDS_CONTROLLER_PASSWORD")
                .unwrap_or_else(|| "rocks".to_string()),

            http_timeout: secs("IDS_HTTP_TIMEOUT_SECS", 5),

            poll_interval: secs("IDS_POLL_INTERVAL_SECS", 2),

            artifacts_dir: lookup("IDS_ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("artifacts")),

            benign_labels,

            baseline_label: lookup("IDS_BASELINE_LABEL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            log_format,

            environment: lookup("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            base_url: self.controller_url.clone(),
            flows_path: self.flows_path.clone(),
            username: self.controller_user.clone(),
            password: self.controller_password.clone(),
            timeout: self.http_timeout,
        }
    }
}

fn parse_label_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
