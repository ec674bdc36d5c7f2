use super::SinkError;
use crate::core::traits::{EventSink, PublishError};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Response header carrying the collector-assigned message id.
pub const MESSAGE_ID_HEADER: &str = "x-message-id";

/// Publishes each payload as a JSON POST to an ingestion endpoint.
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    /// Builds the client and checks that the endpoint answers at all.
    ///
    /// Any HTTP status counts as reachable; only transport failures
    /// (refused, DNS, timeout) are reported as `Unreachable`.
    pub fn connect(url: &str, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|err| SinkError::Http(err.to_string()))?;

        match client.head(url).send() {
            Ok(response) => debug!(url, status = %response.status(), "sink endpoint reachable"),
            Err(err) => {
                return Err(SinkError::Unreachable {
                    target: url.to_string(),
                    reason: err.to_string(),
                })
            }
        }

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl EventSink for HttpSink {
    fn publish(&mut self, payload: &[u8]) -> Result<String, PublishError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .map_err(|err| PublishError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Status(status.as_u16()));
        }

        let message_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(message_id)
    }

    fn name(&self) -> &str {
        &self.url
    }
}
