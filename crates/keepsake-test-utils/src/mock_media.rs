// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transcription and captioning adapters with canned output.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use keepsake_core::traits::adapter::ServiceAdapter;
use keepsake_core::types::{AdapterType, HealthStatus};
use keepsake_core::{CaptionAdapter, KeepsakeError, TranscriptionAdapter};

/// Mock transcriber returning a fixed transcript.
pub struct MockTranscriber {
    transcript: String,
    fail_remaining: AtomicU32,
}

impl MockTranscriber {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            fail_remaining: AtomicU32::new(0),
        }
    }

    /// Fail the next `n` calls with a transient error.
    pub fn with_failures(self, n: u32) -> Self {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    fn take_failure(&self) -> bool {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return true;
        }
        false
    }
}

#[async_trait]
impl ServiceAdapter for MockTranscriber {
    fn name(&self) -> &str {
        "mock-transcriber"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transcription
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl TranscriptionAdapter for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, KeepsakeError> {
        if self.take_failure() {
            return Err(KeepsakeError::transient("mock-transcriber"));
        }
        Ok(self.transcript.clone())
    }
}

/// Mock captioner returning a fixed caption.
pub struct MockCaptioner {
    caption: String,
}

impl MockCaptioner {
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
        }
    }
}

#[async_trait]
impl ServiceAdapter for MockCaptioner {
    fn name(&self) -> &str {
        "mock-captioner"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Caption
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CaptionAdapter for MockCaptioner {
    async fn caption(&self, _image: &[u8]) -> Result<String, KeepsakeError> {
        Ok(self.caption.clone())
    }
}
