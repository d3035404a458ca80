use crate::bridge::{ErrorBridge, ERROR_TAG};
use crate::context::Context;
use crate::env;
use crate::field::Field;
use crate::level::{AtomicLevel, Level};
use crate::merge::merge;
use crate::record::LogRecord;
use crate::registry::FieldRegistry;
use crate::sink::{RecordSink, StdoutSink};
use std::error::Error;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Duration;

/// Upper bound on how long [`Logger::flush`] waits for the error tracker.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

/// Startup configuration for a [`Logger`].
///
/// **Fields**
/// - `level`: minimum severity; records below it are never built.
/// - `registry`: context value keys merged into every record.
#[derive(Debug, Default)]
pub struct LoggerConfig {
    pub level: Level,
    pub registry: FieldRegistry,
}

impl LoggerConfig {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            registry: FieldRegistry::new(),
        }
    }

    /// Level from `FIELDLOG_LEVEL`, empty registry.
    pub fn from_env() -> Self {
        let raw = std::env::var(env::LEVEL_ENV).ok();
        Self::new(Level::from_env_value(raw.as_deref()))
    }

    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// Leveled, context-aware structured logger.
///
/// Build one per process at startup and share it by reference or `Arc`.
/// Every emit merges call-site fields, the context's field store and
/// registry lookups (see [`merge`](crate::merge::merge)), then writes one
/// [`LogRecord`] to the sink. Emits never fail: sink errors are reported on
/// stderr and otherwise ignored.
///
/// `error` and `error_with` also forward the merged tags to the
/// [`ErrorBridge`], which does nothing until a tracker is configured.
///
/// ```
/// use std::sync::Arc;
/// use fieldlog::context::Context;
/// use fieldlog::field::Field;
/// use fieldlog::level::Level;
/// use fieldlog::logger::{Logger, LoggerConfig};
/// use fieldlog::memory_sink::MemorySink;
///
/// let sink = Arc::new(MemorySink::new());
/// let logger = Logger::new(LoggerConfig::new(Level::Info), sink.clone());
///
/// let ctx = Context::new().with_field("order", "42");
/// logger.info_with(&ctx, "order placed", &Field::pairs(&["amount", "10"]));
/// logger.debug(&ctx, "suppressed");
///
/// assert_eq!(sink.records().len(), 1);
/// ```
pub struct Logger {
    level: AtomicLevel,
    registry: FieldRegistry,
    sink: Arc<dyn RecordSink>,
    bridge: Arc<ErrorBridge>,
    /// Records that the sink failed to write.
    pub failed_writes: AtomicU64,
}

impl Logger {
    pub fn new(config: LoggerConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self::with_bridge(config, sink, Arc::new(ErrorBridge::disabled()))
    }

    /// Build a logger that reports through an existing bridge.
    pub fn with_bridge(
        config: LoggerConfig,
        sink: Arc<dyn RecordSink>,
        bridge: Arc<ErrorBridge>,
    ) -> Self {
        Self {
            level: AtomicLevel::new(config.level),
            registry: config.registry,
            sink,
            bridge,
            failed_writes: AtomicU64::new(0),
        }
    }

    /// Logger writing JSON lines to stdout at the level from
    /// `FIELDLOG_LEVEL`.
    pub fn from_env() -> Self {
        Self::new(LoggerConfig::from_env(), Arc::new(StdoutSink))
    }

    pub fn level(&self) -> Level {
        self.level.get()
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.level.enabled(level)
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn bridge(&self) -> &Arc<ErrorBridge> {
        &self.bridge
    }

    #[track_caller]
    pub fn debug(&self, ctx: &Context, msg: &str) {
        self.emit(Level::Debug, ctx, msg, &[], None, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, ctx: &Context, msg: &str) {
        self.emit(Level::Info, ctx, msg, &[], None, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, ctx: &Context, msg: &str) {
        self.emit(Level::Warn, ctx, msg, &[], None, Location::caller());
    }

    /// Log at error level with an `error` field and report to the tracker.
    #[track_caller]
    pub fn error(&self, ctx: &Context, msg: &str, err: &(dyn Error + 'static)) {
        self.emit(Level::Error, ctx, msg, &[], Some(err), Location::caller());
    }

    #[track_caller]
    pub fn debug_with(&self, ctx: &Context, msg: &str, fields: &[Field]) {
        self.emit(Level::Debug, ctx, msg, fields, None, Location::caller());
    }

    #[track_caller]
    pub fn info_with(&self, ctx: &Context, msg: &str, fields: &[Field]) {
        self.emit(Level::Info, ctx, msg, fields, None, Location::caller());
    }

    #[track_caller]
    pub fn warn_with(&self, ctx: &Context, msg: &str, fields: &[Field]) {
        self.emit(Level::Warn, ctx, msg, fields, None, Location::caller());
    }

    #[track_caller]
    pub fn error_with(
        &self,
        ctx: &Context,
        msg: &str,
        err: &(dyn Error + 'static),
        fields: &[Field],
    ) {
        self.emit(Level::Error, ctx, msg, fields, Some(err), Location::caller());
    }

    /// Report `err` to the tracker with merged tags, without writing a log
    /// record.
    pub fn send_error(&self, ctx: &Context, err: &(dyn Error + 'static), fields: &[Field]) {
        if !self.bridge.is_configured() {
            return;
        }
        let merged = merge(ctx, &self.registry, fields);
        self.bridge.report_exception(&merged.tags, err);
    }

    /// Write a record built from `fields` alone, bypassing context merge and
    /// the tracker. Used for access logs.
    #[track_caller]
    pub fn log(&self, level: Level, msg: &str, fields: Vec<Field>) {
        if !self.enabled(level) {
            return;
        }
        self.write(LogRecord::new(level, msg, fields).with_caller(Location::caller()));
    }

    /// Drain the error tracker for at most [`FLUSH_TIMEOUT`], then sync the
    /// sink. Never fails; problems other than the benign terminal sync
    /// error are printed to stderr.
    pub async fn flush(&self) {
        if !self.bridge.flush(FLUSH_TIMEOUT).await {
            eprintln!("error tracker flush timed out after {:?}", FLUSH_TIMEOUT);
        }
        if let Err(e) = self.sink.sync() {
            if !e.is_benign_sync_error() {
                eprintln!("log sink flush failed: {}", e);
            }
        }
    }

    fn emit(
        &self,
        level: Level,
        ctx: &Context,
        msg: &str,
        call_site: &[Field],
        err: Option<&(dyn Error + 'static)>,
        caller: &'static Location<'static>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let merged = merge(ctx, &self.registry, call_site);
        let mut fields = merged.fields;
        if let Some(err) = err {
            fields.push(Field::str(ERROR_TAG, err.to_string()));
        }

        self.write(LogRecord::new(level, msg, fields).with_caller(caller));

        if let Some(err) = err {
            self.bridge.report_message(&merged.tags, err, msg);
        }
    }

    fn write(&self, record: LogRecord) {
        if let Err(e) = self.sink.write(&record) {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            eprintln!("error writing log record: {}", e);
        }
    }
}
