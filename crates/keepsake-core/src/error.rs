// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keepsake memory engine.

use thiserror::Error;

/// The primary error type used across all Keepsake services and adapter traits.
#[derive(Debug, Error)]
pub enum KeepsakeError {
    /// Malformed input (wrong embedding dimension, empty namespace fields,
    /// oversized content). Rejected immediately, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// The declared source type and the artifact bytes disagree.
    #[error("unsupported format: declared {declared}, detected {detected}")]
    UnsupportedFormat { declared: String, detected: String },

    /// Artifact exceeds the configured byte ceiling.
    #[error("size limit exceeded: {size} bytes > {limit} byte limit")]
    SizeLimitExceeded { size: usize, limit: usize },

    /// An external collaborator (embedding, transcription, captioning) is
    /// unavailable. Retried with bounded backoff, then surfaced.
    #[error("transient error from {service}")]
    Transient {
        service: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A namespace mismatch was detected in a result set. Fatal for the
    /// request and audit-logged; never silently corrected.
    #[error("security invariant violation: {0}")]
    SecurityInvariant(String),

    /// A deletion touched a namespace protected by a pending export.
    /// Surfaced to the caller, no automatic resolution.
    #[error("retention conflict: namespace {owner_id}/{companion_id} has a pending export")]
    RetentionConflict {
        owner_id: String,
        companion_id: String,
    },

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An external call exceeded its per-attempt timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeepsakeError {
    /// Whether a retry with backoff is permitted for this error.
    ///
    /// Only transient service failures and timeouts qualify; validation
    /// and security errors must surface unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            KeepsakeError::Transient { .. } | KeepsakeError::Timeout { .. }
        )
    }

    /// Shorthand for a transient error without an underlying source.
    pub fn transient(service: impl Into<String>) -> Self {
        KeepsakeError::Transient {
            service: service.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(KeepsakeError::transient("embedding").is_transient());
        assert!(
            KeepsakeError::Timeout {
                duration: std::time::Duration::from_secs(5)
            }
            .is_transient()
        );
        assert!(!KeepsakeError::Validation("bad dim".into()).is_transient());
        assert!(!KeepsakeError::SecurityInvariant("leak".into()).is_transient());
        assert!(
            !KeepsakeError::RetentionConflict {
                owner_id: "u1".into(),
                companion_id: "c1".into(),
            }
            .is_transient()
        );
    }

    #[test]
    fn error_display_includes_context() {
        let err = KeepsakeError::UnsupportedFormat {
            declared: "text".into(),
            detected: "png".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("text"));
        assert!(msg.contains("png"));

        let err = KeepsakeError::SizeLimitExceeded {
            size: 100,
            limit: 50,
        };
        assert!(err.to_string().contains("100"));
    }
}
