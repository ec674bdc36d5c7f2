use crate::core::profile::{Profile, UnknownProfile};
use crate::core::rate::interval_for;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Error while loading config or validating run parameters.
///
/// Every variant is fatal and raised before the first event is synthesized.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    UnknownProfile(String),
    NegativeRate(i64),
    NegativeDuration(i64),
    InvalidSinkTarget(String),
    InvalidCompression(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config io error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::UnknownProfile(name) => write!(f, "{}", UnknownProfile(name.clone())),
            ConfigError::NegativeRate(value) => {
                write!(f, "events per second must not be negative: {value}")
            }
            ConfigError::NegativeDuration(value) => {
                write!(f, "duration in seconds must not be negative: {value}")
            }
            ConfigError::InvalidSinkTarget(target) => write!(f, "invalid sink target: {target}"),
            ConfigError::InvalidCompression(value) => {
                write!(f, "unsupported jsonl compression: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<UnknownProfile> for ConfigError {
    fn from(err: UnknownProfile) -> Self {
        ConfigError::UnknownProfile(err.0)
    }
}

pub const DEFAULT_RPS: i64 = 10;
pub const DEFAULT_SECONDS: i64 = 60;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Top-level generator configuration.
///
/// Every field is optional so command-line flags can fill in or override
/// whatever the file leaves out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

impl Config {
    /// Loads a config file from TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the run section into a plan, applying defaults.
    pub fn resolve(&self) -> Result<RunPlan, ConfigError> {
        RunPlan::new(
            self.run.rps.unwrap_or(DEFAULT_RPS),
            self.run.seconds.unwrap_or(DEFAULT_SECONDS),
            self.run.profile.as_deref().unwrap_or("normal"),
        )
    }
}

/// Rate, duration and traffic shape of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Target events per second.
    pub rps: Option<i64>,
    /// Run length in seconds.
    pub seconds: Option<i64>,
    /// Profile name (`normal`, `error_burst`, `latency_spike`, `new_signature`).
    pub profile: Option<String>,
    /// Optional RNG seed for deterministic output.
    pub seed: Option<u64>,
    /// Fixed deployment id instead of a random `vNNN`.
    pub deploy_id: Option<String>,
    /// Skip pacing and publish as fast as the sink accepts.
    pub no_throttle: Option<bool>,
}

/// Sink selection and sink-specific settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// `http(s)://...` endpoint, `file://dir` or a directory path.
    pub target: Option<String>,
    /// Force the dry-run sink regardless of `target`.
    pub dry_run: Option<bool>,
    /// Print a preview line per event in dry-run mode.
    pub echo: Option<bool>,
    /// Per-request timeout for the HTTP sink.
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub files: FileConfig,
}

/// Controls file output and rotation for the JSONL sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Target file size before a new file is started.
    #[serde(default = "default_target_size_mb")]
    pub target_size_mb: u64,
    /// Maximum age for a file before a new one is started.
    pub max_age_seconds: Option<u64>,
    pub compression: Option<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            target_size_mb: default_target_size_mb(),
            max_age_seconds: None,
            compression: None,
        }
    }
}

fn default_target_size_mb() -> u64 {
    64
}

/// Validated parameters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub events_per_second: u64,
    pub seconds: u64,
    pub profile: Profile,
}

impl RunPlan {
    /// Validates raw invocation values. Nothing is generated on error.
    pub fn new(events_per_second: i64, seconds: i64, profile: &str) -> Result<Self, ConfigError> {
        let profile: Profile = profile.parse()?;
        if events_per_second < 0 {
            return Err(ConfigError::NegativeRate(events_per_second));
        }
        if seconds < 0 {
            return Err(ConfigError::NegativeDuration(seconds));
        }
        Ok(Self {
            events_per_second: events_per_second as u64,
            seconds: seconds as u64,
            profile,
        })
    }

    /// Event budget for the run (`rate × duration`).
    pub fn total_events(&self) -> u64 {
        self.events_per_second.saturating_mul(self.seconds)
    }

    pub fn interval(&self) -> Duration {
        interval_for(self.events_per_second)
    }
}
