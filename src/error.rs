use std::io;

/// Error type returned when reading logger or tracker configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown log level: {0}")]
    UnknownLevel(String),

    #[error("tracker endpoint is not set")]
    MissingEndpoint,

    #[error("error tracker must be configured inside a Tokio runtime")]
    NoRuntime,
}

/// Error type returned by [`RecordSink`](crate::sink::RecordSink)
/// implementations.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("write record: {0}")]
    Io(#[from] io::Error),
}

// fsync on a terminal or pipe fails with ENOTTY or EINVAL. Nothing is
// buffered there, so the failure carries no information.
const ENOTTY: i32 = 25;
const EINVAL: i32 = 22;

impl SinkError {
    /// Whether this is the known harmless failure of syncing a
    /// terminal-backed or piped standard output.
    pub fn is_benign_sync_error(&self) -> bool {
        match self {
            SinkError::Io(err) => {
                matches!(err.raw_os_error(), Some(ENOTTY) | Some(EINVAL))
                    || err.kind() == io::ErrorKind::Unsupported
            }
            SinkError::Serialize(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_sync_errors_are_benign() {
        let enotty = SinkError::Io(io::Error::from_raw_os_error(ENOTTY));
        let einval = SinkError::Io(io::Error::from_raw_os_error(EINVAL));
        assert!(enotty.is_benign_sync_error());
        assert!(einval.is_benign_sync_error());
    }

    #[test]
    fn other_io_errors_are_reported() {
        let denied = SinkError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(!denied.is_benign_sync_error());
    }
}
