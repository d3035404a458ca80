use crate::bridge::ErrorBridge;
use crate::layer::ErrorReportLayer;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the global `tracing` subscriber installed by
/// [`init_tracing_with_config`].
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`ErrorReportLayer`] so `tracing` events are also
///   printed to the console.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub enable_stdout: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that forwards `ERROR` events to
/// `bridge`.
///
/// Returns `false` if another global subscriber was already set.
pub fn init_tracing_with_config(bridge: Arc<ErrorBridge>, config: TracingConfig) -> bool {
    let layer = ErrorReportLayer::new(bridge);

    // Two subscriber shapes because the layered types differ.
    let installed = if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(e) = installed {
        eprintln!("tracing subscriber not installed: {}", e);
        return false;
    }
    true
}

/// Equivalent to [`init_tracing_with_config`] with
/// [`TracingConfig::default`].
pub fn init_tracing(bridge: Arc<ErrorBridge>) -> bool {
    init_tracing_with_config(bridge, TracingConfig::default())
}

/// Build the process logger from environment variables.
///
/// The logger writes to stdout at the `FIELDLOG_LEVEL` level. When
/// `FIELDLOG_TRACKER_ENDPOINT` is set, error reports are shipped there over
/// HTTP; otherwise the tracker stays disabled. Must be called inside a Tokio
/// runtime when a tracker endpoint is configured.
#[cfg(feature = "http-sink")]
pub fn logger_from_env() -> Result<Arc<crate::logger::Logger>, crate::error::ConfigError> {
    use crate::bridge::TrackerConfig;
    use crate::error::ConfigError;
    use crate::logger::{Logger, LoggerConfig};
    use crate::sink::StdoutSink;

    let bridge = Arc::new(ErrorBridge::disabled());
    match TrackerConfig::from_env() {
        Ok(tracker) => bridge.configure_http(tracker)?,
        Err(ConfigError::MissingEndpoint) => {}
        Err(e) => return Err(e),
    }
    Ok(Arc::new(Logger::with_bridge(
        LoggerConfig::from_env(),
        Arc::new(StdoutSink),
        bridge,
    )))
}
