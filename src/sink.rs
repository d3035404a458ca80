use crate::error::SinkError;
use crate::record::LogRecord;
use std::io::{self, LineWriter, Write};
use std::sync::{Mutex, PoisonError};

/// Synchronous destination for [`LogRecord`]s written by the
/// [`Logger`](crate::logger::Logger).
///
/// `write` is called on the emitting thread, so implementations should be
/// quick and must be safe to call from many threads at once.
pub trait RecordSink: Send + Sync {
    /// Write a single record.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted.
    /// - `Err(..)` on serialization or I/O failure. The logger reports the
    ///   failure on stderr and carries on.
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;

    /// Persist buffered writes, if the sink buffers.
    ///
    /// Default implementation is a no-op.
    fn sync(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes each record as one JSON line to standard output.
///
/// `sync` flushes the stream and then fsyncs the underlying descriptor,
/// which fails harmlessly when stdout is a terminal or a pipe (see
/// [`SinkError::is_benign_sync_error`]).
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl RecordSink for StdoutSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }

    fn sync(&self) -> Result<(), SinkError> {
        let stdout = io::stdout();
        stdout.lock().flush()?;
        #[cfg(unix)]
        {
            use std::os::fd::AsFd;
            let fd = stdout.as_fd().try_clone_to_owned()?;
            std::fs::File::from(fd).sync_all()?;
        }
        Ok(())
    }
}

/// Writes JSON lines to any [`Write`] implementation, e.g. a file or an
/// in-memory buffer.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<LineWriter<W>>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(LineWriter::new(writer)),
        }
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        let writer = self
            .writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        writer.into_inner().map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write + Send> RecordSink for WriterSink<W> {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        Ok(())
    }

    fn sync(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::level::Level;

    #[test]
    fn writer_sink_emits_one_line_per_record() {
        let sink = WriterSink::new(Vec::new());
        sink.write(&LogRecord::new(Level::Info, "one", vec![Field::str("a", "1")]))
            .unwrap();
        sink.write(&LogRecord::new(Level::Warn, "two", Vec::new()))
            .unwrap();
        sink.sync().unwrap();

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["msg"], "one");
        assert_eq!(first["a"], "1");
    }

    #[test]
    fn stdout_sync_never_fails_with_a_real_error() {
        match StdoutSink.sync() {
            Ok(()) => {}
            Err(e) => assert!(e.is_benign_sync_error(), "unexpected sync error: {e}"),
        }
    }
}
