use crate::error::SinkError;
use crate::event::{ErrorEvent, EventSink};
use crate::record::LogRecord;
use crate::sink::RecordSink;
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all records and events.
///
/// Useful for measuring the overhead of merging and level checks without
/// any I/O, and for tests that don't care about output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl RecordSink for NoopSink {
    fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

#[async_trait]
impl EventSink for NoopSink {
    async fn send(&self, _event: &ErrorEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
