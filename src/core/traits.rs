use std::time::Instant;

/// Why a single publish attempt did not produce an acknowledgement.
#[derive(Debug)]
pub enum PublishError {
    Transport(String),
    Status(u16),
    Io(std::io::Error),
    Encode(serde_json::Error),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Transport(err) => write!(f, "transport error: {err}"),
            PublishError::Status(code) => write!(f, "sink rejected payload with status {code}"),
            PublishError::Io(err) => write!(f, "sink io error: {err}"),
            PublishError::Encode(err) => write!(f, "event encode error: {err}"),
        }
    }
}

impl std::error::Error for PublishError {}

impl From<std::io::Error> for PublishError {
    fn from(err: std::io::Error) -> Self {
        PublishError::Io(err)
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Encode(err)
    }
}

/// Accepts encoded events (message bus, HTTP collector, files, ...).
pub trait EventSink: Send {
    /// Publishes one payload and returns the sink-assigned message id.
    fn publish(&mut self, payload: &[u8]) -> Result<String, PublishError>;
    /// Flushes anything buffered. Called once when a run ends.
    fn flush(&mut self) -> Result<(), PublishError> {
        Ok(())
    }
    /// Short label used in logs and the run banner.
    fn name(&self) -> &str;
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn publish(&mut self, payload: &[u8]) -> Result<String, PublishError> {
        (**self).publish(payload)
    }

    fn flush(&mut self) -> Result<(), PublishError> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Keeps the publish loop on cadence.
pub trait Pacer {
    /// Blocks until the next iteration may start, given when the current one began.
    fn wait(&mut self, iteration_start: Instant);
}
