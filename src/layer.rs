use crate::bridge::ErrorBridge;
use crate::merge::TagMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that forwards `ERROR` events emitted through
/// `tracing` (typically by libraries) to an [`ErrorBridge`].
///
/// The event message becomes the report message, its other fields become
/// tags, and the event target is attached as the `target` tag. Events from
/// other levels are ignored.
pub struct ErrorReportLayer {
    bridge: Arc<ErrorBridge>,
    /// Error events seen by the layer.
    pub forwarded_events: Arc<AtomicU64>,
}

impl ErrorReportLayer {
    pub fn new(bridge: Arc<ErrorBridge>) -> Self {
        Self {
            bridge,
            forwarded_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Error value for events reported through the layer: the event message.
#[derive(Debug)]
struct TracingEventError(String);

impl fmt::Display for TracingEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for TracingEventError {}

impl<S> Layer<S> for ErrorReportLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() > Level::ERROR || !self.bridge.is_configured() {
            return;
        }

        let mut tags = TagMap::new();
        let mut message: Option<String> = None;
        event.record(&mut FieldVisitor {
            tags: &mut tags,
            message: &mut message,
        });
        tags.insert("target".to_string(), event.metadata().target().to_string());

        let message = message.unwrap_or_default();
        let err = TracingEventError(tags.remove("error").unwrap_or_else(|| message.clone()));

        self.forwarded_events.fetch_add(1, Ordering::Relaxed);
        self.bridge.report_message(&tags, &err, &message);
    }
}

pub struct FieldVisitor<'a> {
    pub tags: &'a mut TagMap,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.tags.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.tags.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.tags.insert(field.name().to_string(), format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{TrackerConfig, ERROR_TAG};
    use crate::event::Payload;
    use crate::memory_sink::MemoryEventSink;
    use tokio::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[tokio::test]
    async fn error_events_reach_the_bridge() {
        let sink = Arc::new(MemoryEventSink::new());
        let bridge = Arc::new(ErrorBridge::disabled());
        bridge
            .configure(TrackerConfig::new("http://tracker", "test", "0.1.0"), sink.clone())
            .unwrap();

        let layer = ErrorReportLayer::new(Arc::clone(&bridge));
        let forwarded = Arc::clone(&layer.forwarded_events);
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(user_id = 42, "not forwarded");
            tracing::error!(user_id = 42, reason = "invalid password", "authentication failed");
        });

        assert!(bridge.flush(Duration::from_secs(3)).await);
        assert_eq!(forwarded.load(Ordering::Relaxed), 1);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.tags["user_id"], "42");
        assert_eq!(event.tags["reason"], "invalid password");
        assert_eq!(event.tags[ERROR_TAG], "authentication failed");
        assert_eq!(
            event.payload,
            Payload::Message {
                message: "authentication failed".to_string()
            }
        );
    }

    #[test]
    fn unconfigured_bridge_skips_events() {
        let layer = ErrorReportLayer::new(Arc::new(ErrorBridge::disabled()));
        let forwarded = Arc::clone(&layer.forwarded_events);
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("dropped");
        });
        assert_eq!(forwarded.load(Ordering::Relaxed), 0);
    }
}
