use thiserror::Error;

/// Errors raised by the encoder hook and the sinks it drives.
///
/// Construction and submission errors are fatal to the call that produced
/// them. Per-sample errors (`BufferUnavailable`, `TimestampUnavailable`,
/// `MetadataUnavailable`, `ConcurrentCompletion`) only cost the one sample.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("sink creation failed: {0}")]
    SinkCreationFailed(String),

    #[error("buffer unavailable: {0}")]
    BufferUnavailable(String),

    #[error("sample has no timestamp")]
    TimestampUnavailable,

    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("metadata size mismatch: expected {expected} bytes, got {actual}")]
    MetadataSizeMismatch { expected: usize, actual: usize },

    #[error("completion delivered while another completion was in flight")]
    ConcurrentCompletion,

    #[error("sample submission failed: {0}")]
    SubmissionFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl HookError {
    /// Whether the error only affects a single completed sample.
    pub fn is_per_sample(&self) -> bool {
        matches!(
            self,
            Self::BufferUnavailable(_)
                | Self::TimestampUnavailable
                | Self::MetadataUnavailable(_)
                | Self::MetadataSizeMismatch { .. }
                | Self::ConcurrentCompletion
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_message_names_both_sizes() {
        let err = HookError::MetadataSizeMismatch { expected: 16, actual: 8 };
        assert_eq!(err.to_string(), "metadata size mismatch: expected 16 bytes, got 8");
    }

    #[test]
    fn per_sample_classification() {
        assert!(HookError::TimestampUnavailable.is_per_sample());
        assert!(HookError::ConcurrentCompletion.is_per_sample());
        assert!(!HookError::SinkCreationFailed("x".into()).is_per_sample());
        assert!(!HookError::SubmissionFailed("x".into()).is_per_sample());
    }
}
