use thiserror::Error;

/// Error taxonomy for the compression engine.
///
/// `InvalidOptions` and `ProbeFailed` are raised before any subprocess is
/// spawned; `RunFailed` and `Cancelled` are terminal job results and only
/// ever surface through the job handle, never mid-stream.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("'{0}' not found. Is ffmpeg installed and in PATH?")]
    EngineNotFound(String),

    #[error("probe failed: {0}")]
    ProbeFailed(String),

    #[error("a compression job is already running")]
    AlreadyRunning,

    #[error("ffmpeg exited with {}", .exit_code.map(|c| format!("code {c}")).unwrap_or_else(|| "a signal".to_string()))]
    RunFailed {
        exit_code: Option<i32>,
        /// Last lines of ffmpeg stderr, for diagnostics.
        stderr_tail: String,
    },

    #[error("job cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CompressError {
    /// True for errors detected before the subprocess was launched.
    /// The remediation differs: fix options/environment vs. inspect the run.
    pub fn is_pre_launch(&self) -> bool {
        matches!(
            self,
            CompressError::InvalidOptions(_)
                | CompressError::EngineNotFound(_)
                | CompressError::ProbeFailed(_)
                | CompressError::AlreadyRunning
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_launch_classification() {
        assert!(CompressError::InvalidOptions("x".into()).is_pre_launch());
        assert!(CompressError::EngineNotFound("ffmpeg".into()).is_pre_launch());
        assert!(CompressError::ProbeFailed("no video".into()).is_pre_launch());
        assert!(CompressError::AlreadyRunning.is_pre_launch());

        assert!(
            !CompressError::RunFailed {
                exit_code: Some(1),
                stderr_tail: String::new(),
            }
            .is_pre_launch()
        );
        assert!(!CompressError::Cancelled.is_pre_launch());
    }

    #[test]
    fn test_run_failed_message_mentions_code() {
        let err = CompressError::RunFailed {
            exit_code: Some(187),
            stderr_tail: String::new(),
        };
        assert!(err.to_string().contains("187"));

        let err = CompressError::RunFailed {
            exit_code: None,
            stderr_tail: String::new(),
        };
        assert!(err.to_string().contains("signal"));
    }
}
