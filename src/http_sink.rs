use crate::event::{ErrorEvent, EventSink};
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;

/// Error tracker sink that POSTs each [`ErrorEvent`] as a JSON document to
/// a fixed endpoint.
#[derive(Clone)]
pub struct HttpEventSink {
    client: Client,
    endpoint: String,
}

impl HttpEventSink {
    /// Construct a sink posting to `endpoint`, e.g.
    /// `https://tracker.example.com/api/events`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn send(&self, event: &ErrorEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let resp = self.client.post(&self.endpoint).json(event).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("tracker rejected event with status {}: {}", status, text).into())
        }
    }
}
