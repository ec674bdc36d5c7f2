use crate::core::event::LogEvent;
use crate::core::traits::{EventSink, PublishError};

/// Sink that accepts every payload without transmitting it.
#[derive(Debug, Default)]
pub struct DryRunSink {
    echo: bool,
    published: u64,
}

impl DryRunSink {
    /// `echo` prints a one-line preview of each event to stdout.
    pub fn new(echo: bool) -> Self {
        Self { echo, published: 0 }
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl EventSink for DryRunSink {
    fn publish(&mut self, payload: &[u8]) -> Result<String, PublishError> {
        self.published += 1;
        if self.echo {
            println!("{}", preview(payload));
        }
        Ok(format!("dry-run-{}", self.published))
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

fn preview(payload: &[u8]) -> String {
    match serde_json::from_slice::<LogEvent>(payload) {
        Ok(event) => {
            let message: String = event.message.chars().take(50).collect();
            format!(
                "[DRY-RUN] {:5} | {:20} | {message}",
                event.severity, event.service
            )
        }
        Err(_) => format!("[DRY-RUN] {} bytes", payload.len()),
    }
}
