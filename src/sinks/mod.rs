//! Sink adapters and construction-time sink selection.
//!
//! A run talks to exactly one `EventSink`. Which one is decided here, once:
//! a live sink when the target can be set up, otherwise the dry-run sink.

pub mod dry_run;
pub mod http;
pub mod jsonl;

pub use dry_run::DryRunSink;
pub use http::HttpSink;
pub use jsonl::{JsonlCompression, JsonlOptions, JsonlSink};

use crate::core::config::{ConfigError, SinkConfig, DEFAULT_TIMEOUT_MS};
use crate::core::traits::EventSink;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Error while setting up a live sink.
#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
    Http(String),
    Unreachable { target: String, reason: String },
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(err) => write!(f, "sink io error: {err}"),
            SinkError::Http(err) => write!(f, "http client error: {err}"),
            SinkError::Unreachable { target, reason } => {
                write!(f, "sink {target} unreachable: {reason}")
            }
        }
    }
}

impl std::error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

/// Sink selection resolved from config and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    DryRun { echo: bool },
    Http { url: String, timeout: Duration },
    Jsonl(JsonlOptions),
}

impl SinkKind {
    /// Interprets the sink target.
    ///
    /// `http://` and `https://` select the HTTP sink, `file://` or a bare
    /// path selects the JSONL sink, and an empty target or `-` selects
    /// dry-run. An explicit dry-run echoes previews unless `echo` is off.
    pub fn from_config(config: &SinkConfig) -> Result<Self, ConfigError> {
        if config.dry_run.unwrap_or(false) {
            return Ok(SinkKind::DryRun {
                echo: config.echo.unwrap_or(true),
            });
        }

        let echo = config.echo.unwrap_or(false);

        let target = config.target.as_deref().map(str::trim).unwrap_or("");
        if target.is_empty() || target == "-" {
            return Ok(SinkKind::DryRun { echo });
        }

        if target.starts_with("http://") || target.starts_with("https://") {
            reqwest::Url::parse(target)
                .map_err(|_| ConfigError::InvalidSinkTarget(target.to_string()))?;
            let timeout = Duration::from_millis(config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
            return Ok(SinkKind::Http {
                url: target.to_string(),
                timeout,
            });
        }

        let dir = match target.strip_prefix("file://") {
            Some("") => return Err(ConfigError::InvalidSinkTarget(target.to_string())),
            Some(path) => PathBuf::from(path),
            None if target.contains("://") => {
                return Err(ConfigError::InvalidSinkTarget(target.to_string()))
            }
            None => PathBuf::from(target),
        };
        Ok(SinkKind::Jsonl(JsonlOptions::from_config(dir, &config.files)?))
    }
}

/// Builds the sink for `kind`.
///
/// A live sink that cannot be set up degrades to dry-run; the degradation is
/// logged here, once, rather than per event.
pub fn connect(kind: SinkKind) -> Box<dyn EventSink> {
    let live: Result<Box<dyn EventSink>, SinkError> = match kind {
        SinkKind::DryRun { echo } => {
            info!("running in dry-run mode, events are not transmitted");
            return Box::new(DryRunSink::new(echo));
        }
        SinkKind::Http { url, timeout } => {
            HttpSink::connect(&url, timeout).map(|sink| Box::new(sink) as Box<dyn EventSink>)
        }
        SinkKind::Jsonl(options) => JsonlSink::new(options)
            .map(|sink| Box::new(sink) as Box<dyn EventSink>)
            .map_err(SinkError::from),
    };

    match live {
        Ok(sink) => {
            info!(sink = sink.name(), "connected to sink");
            sink
        }
        Err(err) => {
            warn!(error = %err, "sink unavailable, falling back to dry-run");
            Box::new(DryRunSink::new(false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FileConfig;

    fn sink_config(target: Option<&str>) -> SinkConfig {
        SinkConfig {
            target: target.map(str::to_string),
            ..SinkConfig::default()
        }
    }

    #[test]
    fn target_selects_sink_kind() {
        assert_eq!(
            SinkKind::from_config(&sink_config(None)).expect("kind"),
            SinkKind::DryRun { echo: false }
        );
        assert_eq!(
            SinkKind::from_config(&sink_config(Some("-"))).expect("kind"),
            SinkKind::DryRun { echo: false }
        );
        assert!(matches!(
            SinkKind::from_config(&sink_config(Some("http://localhost:8080/logs"))).expect("kind"),
            SinkKind::Http { url, timeout }
                if url == "http://localhost:8080/logs" && timeout == Duration::from_secs(5)
        ));
        assert!(matches!(
            SinkKind::from_config(&sink_config(Some("file:///var/tmp/out"))).expect("kind"),
            SinkKind::Jsonl(options) if options.dir == PathBuf::from("/var/tmp/out")
        ));
        assert!(matches!(
            SinkKind::from_config(&sink_config(Some("out/events"))).expect("kind"),
            SinkKind::Jsonl(options) if options.dir == PathBuf::from("out/events")
        ));
    }

    #[test]
    fn dry_run_flag_wins_over_target() {
        let config = SinkConfig {
            target: Some("http://localhost:8080/logs".to_string()),
            dry_run: Some(true),
            echo: Some(true),
            ..SinkConfig::default()
        };
        assert_eq!(
            SinkKind::from_config(&config).expect("kind"),
            SinkKind::DryRun { echo: true }
        );
    }

    #[test]
    fn explicit_dry_run_echoes_unless_silenced() {
        let mut config = SinkConfig {
            dry_run: Some(true),
            ..SinkConfig::default()
        };
        assert_eq!(
            SinkKind::from_config(&config).expect("kind"),
            SinkKind::DryRun { echo: true }
        );

        config.echo = Some(false);
        assert_eq!(
            SinkKind::from_config(&config).expect("kind"),
            SinkKind::DryRun { echo: false }
        );

        let implicit = SinkConfig {
            target: Some("-".to_string()),
            ..SinkConfig::default()
        };
        assert_eq!(
            SinkKind::from_config(&implicit).expect("kind"),
            SinkKind::DryRun { echo: false }
        );
    }

    #[test]
    fn rejects_malformed_targets() {
        for target in ["pubsub://project/topic", "file://", "http://"] {
            assert!(
                matches!(
                    SinkKind::from_config(&sink_config(Some(target))),
                    Err(ConfigError::InvalidSinkTarget(_))
                ),
                "{target} accepted"
            );
        }

        let config = SinkConfig {
            target: Some("out".to_string()),
            files: FileConfig {
                compression: Some("lz4".to_string()),
                ..FileConfig::default()
            },
            ..SinkConfig::default()
        };
        assert!(matches!(
            SinkKind::from_config(&config),
            Err(ConfigError::InvalidCompression(_))
        ));
    }

    #[test]
    fn unavailable_live_sink_falls_back_to_dry_run() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}/", listener.local_addr().expect("addr"));
        drop(listener);

        let mut sink = connect(SinkKind::Http {
            url,
            timeout: Duration::from_millis(200),
        });
        assert_eq!(sink.name(), "dry-run");
        assert!(sink.publish(b"{}").is_ok());
    }

    #[test]
    fn jsonl_target_connects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options =
            JsonlOptions::from_config(dir.path().join("nested"), &FileConfig::default()).expect("options");
        let sink = connect(SinkKind::Jsonl(options));
        assert!(sink.name().starts_with("file://"));
        assert!(dir.path().join("nested").is_dir());
    }
}
