// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcription and captioning adapter traits.
//!
//! Speech-to-text and image captioning are external collaborators; the
//! engine only wraps their text output. Failures propagate as transient
//! errors and are retried by the caller, never swallowed.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::traits::adapter::ServiceAdapter;

/// Adapter for transcribing audio artifacts to text.
#[async_trait]
pub trait TranscriptionAdapter: ServiceAdapter {
    /// Transcribe raw audio bytes to plain text.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, KeepsakeError>;
}

/// Adapter for captioning image artifacts.
#[async_trait]
pub trait CaptionAdapter: ServiceAdapter {
    /// Describe raw image bytes as plain text.
    async fn caption(&self, image: &[u8]) -> Result<String, KeepsakeError>;
}
