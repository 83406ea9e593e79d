// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact normalization: heterogeneous uploads in, plain text out.
//!
//! Text and chat artifacts get encoding detection and whitespace cleanup.
//! Voice delegates to the transcription collaborator, photo to the
//! captioning collaborator, both behind bounded backoff. The normalizer
//! persists nothing; it only returns normalized text plus source metadata.

use std::sync::Arc;

use tracing::debug;

use keepsake_core::retry::{BackoffPolicy, with_backoff};
use keepsake_core::{
    CaptionAdapter, KeepsakeError, NormalizedText, SourceType, TranscriptionAdapter,
};

/// What the artifact bytes actually look like, from magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectedMedia {
    Image(&'static str),
    Audio(&'static str),
    Unknown,
}

/// Sniff well-known image and audio container signatures.
fn sniff(bytes: &[u8]) -> DetectedMedia {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return DetectedMedia::Image("png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return DetectedMedia::Image("jpeg");
    }
    if bytes.starts_with(b"GIF8") {
        return DetectedMedia::Image("gif");
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") {
        if &bytes[8..12] == b"WEBP" {
            return DetectedMedia::Image("webp");
        }
        if &bytes[8..12] == b"WAVE" {
            return DetectedMedia::Audio("wav");
        }
    }
    if bytes.starts_with(b"ID3") || bytes.starts_with(&[0xFF, 0xFB]) {
        return DetectedMedia::Audio("mp3");
    }
    if bytes.starts_with(b"OggS") {
        return DetectedMedia::Audio("ogg");
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return DetectedMedia::Audio("m4a");
    }
    DetectedMedia::Unknown
}

/// Converts uploaded artifacts into normalized plain text.
pub struct Normalizer {
    transcriber: Arc<dyn TranscriptionAdapter>,
    captioner: Arc<dyn CaptionAdapter>,
    max_artifact_bytes: usize,
    policy: BackoffPolicy,
}

impl Normalizer {
    pub fn new(
        transcriber: Arc<dyn TranscriptionAdapter>,
        captioner: Arc<dyn CaptionAdapter>,
        max_artifact_bytes: usize,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            transcriber,
            captioner,
            max_artifact_bytes,
            policy,
        }
    }

    /// Normalize an artifact according to its declared source type.
    ///
    /// Fails with `SizeLimitExceeded` past the byte ceiling,
    /// `UnsupportedFormat` when declaration and content disagree, and a
    /// transient error when a delegated collaborator stays unavailable
    /// through the retry budget.
    pub async fn normalize(
        &self,
        artifact: &[u8],
        declared: SourceType,
    ) -> Result<NormalizedText, KeepsakeError> {
        if artifact.len() > self.max_artifact_bytes {
            return Err(KeepsakeError::SizeLimitExceeded {
                size: artifact.len(),
                limit: self.max_artifact_bytes,
            });
        }

        let detected = sniff(artifact);
        match declared {
            SourceType::Text | SourceType::Chat => {
                if let DetectedMedia::Image(fmt) | DetectedMedia::Audio(fmt) = detected {
                    return Err(KeepsakeError::UnsupportedFormat {
                        declared: declared.as_str().into(),
                        detected: fmt.into(),
                    });
                }
                let (text, lossy) = decode_utf8(artifact);
                if lossy {
                    debug!(source = declared.as_str(), "artifact was not valid UTF-8, decoded lossily");
                }
                Ok(NormalizedText {
                    text: clean_text(&text),
                    source_type: declared,
                    lossy_decoded: lossy,
                })
            }
            SourceType::Voice => {
                if let DetectedMedia::Image(fmt) = detected {
                    return Err(KeepsakeError::UnsupportedFormat {
                        declared: "voice".into(),
                        detected: fmt.into(),
                    });
                }
                let transcriber = self.transcriber.clone();
                let text = with_backoff(self.policy, "transcription", || {
                    let transcriber = transcriber.clone();
                    async move { transcriber.transcribe(artifact).await }
                })
                .await?;
                Ok(NormalizedText {
                    text: clean_text(&text),
                    source_type: SourceType::Voice,
                    lossy_decoded: false,
                })
            }
            SourceType::Photo => {
                if let DetectedMedia::Audio(fmt) = detected {
                    return Err(KeepsakeError::UnsupportedFormat {
                        declared: "photo".into(),
                        detected: fmt.into(),
                    });
                }
                let captioner = self.captioner.clone();
                let text = with_backoff(self.policy, "captioning", || {
                    let captioner = captioner.clone();
                    async move { captioner.caption(artifact).await }
                })
                .await?;
                Ok(NormalizedText {
                    text: clean_text(&text),
                    source_type: SourceType::Photo,
                    lossy_decoded: false,
                })
            }
        }
    }
}

/// Decode bytes as UTF-8, falling back to a lossy decode.
fn decode_utf8(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), false),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), true),
    }
}

/// Whitespace and structure cleanup.
///
/// Normalizes line endings, strips control characters, trims trailing
/// space per line, and collapses runs of blank lines into paragraph
/// breaks.
fn clean_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();
    for line in unified.split('\n') {
        let cleaned: String = line
            .chars()
            .filter(|c| !c.is_control() || *c == '\t')
            .collect();
        lines.push(cleaned.trim_end().to_string());
    }

    let mut out = String::new();
    let mut blank_run = 0usize;
    for line in &lines {
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            if blank_run > 0 {
                out.push_str("\n\n");
            } else {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line);
    }
    out
}
