use crate::env;
use crate::error::ConfigError;
use crate::event::{ErrorEvent, EventSink, Payload};
use crate::merge::TagMap;
use chrono::Utc;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};

/// Tag under which the error's display form is attached to every event.
pub const ERROR_TAG: &str = "error";

/// Error tracker settings, supplied once before the first error is
/// reported.
///
/// **Fields**
/// - `endpoint`: where the tracker accepts events; used by
///   [`HttpEventSink`](crate::http_sink::HttpEventSink).
/// - `environment`, `release`: labels stamped on every event.
/// - `channel_buffer`: events queued for delivery before new ones are
///   dropped.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub endpoint: String,
    pub environment: String,
    pub release: String,
    pub channel_buffer: usize,
}

impl TrackerConfig {
    pub fn new(
        endpoint: impl Into<String>,
        environment: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            environment: environment.into(),
            release: release.into(),
            channel_buffer: 256,
        }
    }

    /// Read the tracker settings from `FIELDLOG_TRACKER_*` variables.
    ///
    /// **Returns**
    /// - `Err(ConfigError::MissingEndpoint)` if the endpoint is unset or
    ///   empty. Environment and release default to empty labels.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env::env_or(env::TRACKER_ENDPOINT_ENV, "");
        if endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        Ok(Self::new(
            endpoint,
            env::env_or(env::TRACKER_ENVIRONMENT_ENV, ""),
            env::env_or(env::TRACKER_RELEASE_ENV, ""),
        ))
    }
}

enum Command {
    Event(ErrorEvent),
    Flush(oneshot::Sender<()>),
}

struct Reporter {
    sender: mpsc::Sender<Command>,
    environment: String,
    release: String,
}

/// Forwards error reports to an external tracker through an
/// [`EventSink`].
///
/// Until [`configure`](ErrorBridge::configure) succeeds every report is a
/// no-op. Delivery happens on a background task fed by a bounded channel,
/// so reporting never blocks the caller; when the channel is full the event
/// is dropped and counted.
pub struct ErrorBridge {
    reporter: OnceLock<Reporter>,
    /// Events submitted while configured.
    pub reported_events: AtomicU64,
    /// Events dropped because the channel was full or closed.
    pub dropped_events: AtomicU64,
}

impl Default for ErrorBridge {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ErrorBridge {
    /// A bridge with no tracker attached.
    pub fn disabled() -> Self {
        Self {
            reporter: OnceLock::new(),
            reported_events: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
        }
    }

    /// Attach a tracker and spawn the delivery task.
    ///
    /// Only the first successful call takes effect; later calls return
    /// `Ok(())` without replacing the sink.
    ///
    /// **Returns**
    /// - `Err(ConfigError::NoRuntime)` when called outside a Tokio runtime.
    pub fn configure(
        &self,
        config: TrackerConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), ConfigError> {
        if self.reporter.get().is_some() {
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        self.reporter.get_or_init(|| {
            let (tx, rx) = mpsc::channel(config.channel_buffer.max(16));
            runtime.spawn(deliver(rx, sink));
            Reporter {
                sender: tx,
                environment: config.environment,
                release: config.release,
            }
        });
        Ok(())
    }

    /// Attach an [`HttpEventSink`](crate::http_sink::HttpEventSink)
    /// pointed at `config.endpoint`.
    #[cfg(feature = "http-sink")]
    pub fn configure_http(&self, config: TrackerConfig) -> Result<(), ConfigError> {
        let sink = crate::http_sink::HttpEventSink::new(config.endpoint.clone());
        self.configure(config, Arc::new(sink))
    }

    pub fn is_configured(&self) -> bool {
        self.reporter.get().is_some()
    }

    /// Report an error together with the log message it was logged under.
    pub fn report_message(&self, tags: &TagMap, err: &(dyn Error + 'static), msg: &str) {
        self.submit(
            tags,
            err,
            Payload::Message {
                message: msg.to_string(),
            },
        );
    }

    /// Report an error value and its source chain, without a message.
    pub fn report_exception(&self, tags: &TagMap, err: &(dyn Error + 'static)) {
        self.submit(tags, err, Payload::exception(err));
    }

    fn submit(&self, tags: &TagMap, err: &(dyn Error + 'static), payload: Payload) {
        let Some(reporter) = self.reporter.get() else {
            return;
        };

        let mut tags = tags.clone();
        tags.insert(ERROR_TAG.to_string(), err.to_string());

        let event = ErrorEvent {
            timestamp: Utc::now(),
            level: "error",
            environment: reporter.environment.clone(),
            release: reporter.release.clone(),
            tags,
            payload,
        };

        self.reported_events.fetch_add(1, Ordering::Relaxed);
        if reporter.sender.try_send(Command::Event(event)).is_err() {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("error tracker channel full, dropping event");
        }
    }

    /// Wait until every event queued so far has been handed to the sink and
    /// the sink has flushed, for at most `wait`.
    ///
    /// **Returns**
    /// - `true` if the queue drained in time or no tracker is configured.
    /// - `false` on timeout or if the delivery task is gone.
    pub async fn flush(&self, wait: Duration) -> bool {
        let Some(reporter) = self.reporter.get() else {
            return true;
        };

        let drained = async {
            let (done_tx, done_rx) = oneshot::channel();
            reporter.sender.send(Command::Flush(done_tx)).await.ok()?;
            done_rx.await.ok()
        };

        matches!(timeout(wait, drained).await, Ok(Some(())))
    }
}

async fn deliver(mut rx: mpsc::Receiver<Command>, sink: Arc<dyn EventSink>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Event(event) => {
                if let Err(e) = sink.send(&event).await {
                    eprintln!("error sending event to tracker: {}", e);
                }
            }
            Command::Flush(done) => {
                if let Err(e) = sink.flush().await {
                    eprintln!("error flushing tracker sink: {}", e);
                }
                let _ = done.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::MemoryEventSink;
    use std::io;

    fn boom() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "boom")
    }

    #[test]
    fn unconfigured_bridge_ignores_reports() {
        let bridge = ErrorBridge::disabled();
        bridge.report_message(&TagMap::new(), &boom(), "failed");
        bridge.report_exception(&TagMap::new(), &boom());
        assert!(!bridge.is_configured());
        assert_eq!(bridge.reported_events.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn configure_outside_runtime_fails() {
        let bridge = ErrorBridge::disabled();
        let result = bridge.configure(
            TrackerConfig::new("http://tracker", "test", "0.0.0"),
            Arc::new(MemoryEventSink::new()),
        );
        assert!(matches!(result, Err(ConfigError::NoRuntime)));
    }

    #[tokio::test]
    async fn unconfigured_flush_returns_immediately() {
        let bridge = ErrorBridge::disabled();
        assert!(bridge.flush(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn message_report_carries_tags_and_error() {
        let sink = Arc::new(MemoryEventSink::new());
        let bridge = ErrorBridge::disabled();
        bridge
            .configure(TrackerConfig::new("http://tracker", "staging", "1.0.0"), sink.clone())
            .unwrap();

        let tags = TagMap::from([("userID".to_string(), "u-1".to_string())]);
        bridge.report_message(&tags, &boom(), "payment failed");
        assert!(bridge.flush(Duration::from_secs(3)).await);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.level, "error");
        assert_eq!(event.environment, "staging");
        assert_eq!(event.release, "1.0.0");
        assert_eq!(event.tags["userID"], "u-1");
        assert_eq!(event.tags[ERROR_TAG], "boom");
        assert_eq!(
            event.payload,
            Payload::Message {
                message: "payment failed".to_string()
            }
        );
        assert_eq!(sink.flush_count(), 1);
    }

    #[tokio::test]
    async fn exception_report_uses_error_value() {
        let sink = Arc::new(MemoryEventSink::new());
        let bridge = ErrorBridge::disabled();
        bridge
            .configure(TrackerConfig::new("http://tracker", "prod", "2.0.0"), sink.clone())
            .unwrap();

        bridge.report_exception(&TagMap::new(), &boom());
        assert!(bridge.flush(Duration::from_secs(3)).await);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0].payload, Payload::Exception { value, .. } if value == "boom"));
    }

    #[tokio::test]
    async fn second_configure_keeps_first_sink() {
        let first = Arc::new(MemoryEventSink::new());
        let second = Arc::new(MemoryEventSink::new());
        let bridge = ErrorBridge::disabled();
        let config = TrackerConfig::new("http://tracker", "prod", "1");
        bridge.configure(config.clone(), first.clone()).unwrap();
        bridge.configure(config, second.clone()).unwrap();

        bridge.report_exception(&TagMap::new(), &boom());
        assert!(bridge.flush(Duration::from_secs(3)).await);

        assert_eq!(first.events().len(), 1);
        assert!(second.events().is_empty());
    }
}
