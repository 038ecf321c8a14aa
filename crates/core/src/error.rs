use std::time::Duration;

/// Errors that prevent an invocation from producing a captured result.
///
/// A child that starts and exits non-zero is *not* an error: its output is
/// returned with a failed exit status. These variants cover the cases where
/// there is no complete result to hand back.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// A payload could not be materialized as a temporary file.
    #[error("Failed to prepare {payload} payload file: {source}")]
    TempFile {
        payload: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The executable could not be spawned or its pipes were unavailable.
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child did not finish within the configured bound and was killed.
    #[error("Invocation timed out after {}ms", .elapsed.as_millis())]
    Timeout { elapsed: Duration },

    /// The caller cancelled the invocation; the child was killed.
    #[error("Invocation cancelled")]
    Cancelled,

    /// A blocking call was made from a thread already driving a tokio runtime.
    #[error("Blocking invocation called from within an async runtime")]
    InsideRuntime,

    /// Waiting on the child process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvokeError {
    /// Whether the failure happened before the child was running.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::TempFile { .. } | Self::Launch { .. } | Self::InsideRuntime
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_launch() {
        let err = InvokeError::Launch {
            program: "zenroom".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "Failed to launch zenroom: no such file");
        assert!(err.is_setup_failure());
    }

    #[test]
    fn display_timeout() {
        let err = InvokeError::Timeout {
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "Invocation timed out after 1500ms");
        assert!(!err.is_setup_failure());
    }

    #[test]
    fn display_temp_file() {
        let err = InvokeError::TempFile {
            payload: "keys",
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to prepare keys payload file: disk full"
        );
        assert!(err.is_setup_failure());
    }

    #[test]
    fn source_is_exposed() {
        let err = InvokeError::Launch {
            program: "zenroom".to_string(),
            source: std::io::Error::other("boom"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&InvokeError::Cancelled).is_none());
    }

    #[test]
    fn inside_runtime_is_setup_failure() {
        let err = InvokeError::InsideRuntime;
        assert_eq!(
            err.to_string(),
            "Blocking invocation called from within an async runtime"
        );
        assert!(err.is_setup_failure());
    }
}
