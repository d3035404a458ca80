use std::sync::Arc;

use async_trait::async_trait;
use fieldlog::bridge::TrackerConfig;
use fieldlog::context::Context;
use fieldlog::event::{ErrorEvent, EventSink};
use fieldlog::logger::Logger;

/// Example of integrating a completely custom error tracker by implementing
/// the `EventSink` trait directly. Imagine this talks to some proprietary
/// incident system for which this crate does not provide a built-in sink.
struct MyIncidentSink;

#[async_trait]
impl EventSink for MyIncidentSink {
    async fn send(&self, event: &ErrorEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Here you would call your own client library for the tracker.
        // For the sake of example we just print the event.
        println!("[my-incidents] {}", serde_json::to_string(event)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let logger = Logger::from_env();
    logger
        .bridge()
        .configure(
            TrackerConfig::new("incidents://local", "development", env!("CARGO_PKG_VERSION")),
            Arc::new(MyIncidentSink),
        )
        .expect("configure tracker");

    let ctx = Context::new().with_field("db", "my-incident-db");
    logger.info(&ctx, "custom backend example started");

    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "query timed out");
    logger.error(&ctx, "simulated error sent via custom backend", &err);

    logger.flush().await;
}
