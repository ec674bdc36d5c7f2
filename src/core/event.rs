use serde::{Deserialize, Serialize};

/// One synthesized application log record.
///
/// Serialized as a flat JSON object; the serde names below are the wire
/// contract consumers of the sink decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Event timestamp (RFC3339, UTC).
    pub ts: String,
    /// Emitting service from the service catalog.
    pub service: String,
    pub severity: Severity,
    /// HTTP-style status code (200 or one of the error codes).
    pub status_code: u16,
    pub latency_ms: u32,
    pub message: String,
    /// Per-event correlation id (UUID v4).
    pub trace_id: String,
    pub request_path: String,
    pub env: String,
    /// Constant for every event emitted by one generator.
    pub deploy_id: String,
}

impl LogEvent {
    /// Encodes the event as the JSON payload handed to a sink.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `pad` keeps width specifiers like `{:5}` working.
        f.pad(self.as_str())
    }
}
