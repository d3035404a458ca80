use crate::merge::TagMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;

/// What an [`ErrorEvent`] reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// A log message, reported from the error-level logger path.
    Message { message: String },
    /// An error value with its `source()` chain, outermost first.
    Exception { value: String, chain: Vec<String> },
}

impl Payload {
    pub fn exception(err: &(dyn Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Payload::Exception {
            value: err.to_string(),
            chain,
        }
    }
}

/// A tagged event submitted to the error tracker.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub timestamp: DateTime<Utc>,
    pub level: &'static str,
    pub environment: String,
    pub release: String,
    pub tags: TagMap,
    #[serde(flatten)]
    pub payload: Payload,
}

/// Asynchronous destination for [`ErrorEvent`]s.
///
/// The [`ErrorBridge`](crate::bridge::ErrorBridge) calls `send` from a
/// background task and never awaits it on the application thread.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver a single event to the tracker.
    ///
    /// **Returns**
    /// - `Ok(())` if the tracker accepted the event.
    /// - `Err(..)` on transport or HTTP failure. The event is dropped and
    ///   the failure reported on stderr.
    async fn send(&self, event: &ErrorEvent) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered events.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("checkout failed")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection reset")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    impl Error for Inner {}

    #[test]
    fn exception_collects_source_chain() {
        let payload = Payload::exception(&Outer(Inner));
        assert_eq!(
            payload,
            Payload::Exception {
                value: "checkout failed".to_string(),
                chain: vec!["connection reset".to_string()],
            }
        );
    }

    #[test]
    fn event_serializes_payload_inline() {
        let event = ErrorEvent {
            timestamp: Utc::now(),
            level: "error",
            environment: "prod".to_string(),
            release: "1.2.3".to_string(),
            tags: TagMap::from([("error".to_string(), "boom".to_string())]),
            payload: Payload::Message {
                message: "payment failed".to_string(),
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "message");
        assert_eq!(value["message"], "payment failed");
        assert_eq!(value["tags"]["error"], "boom");
        assert_eq!(value["release"], "1.2.3");
    }
}
