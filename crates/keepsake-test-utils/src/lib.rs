// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mock adapters for fast, CI-runnable Keepsake tests.
//!
//! No external services: the mock embedder hashes words into stable
//! vectors, and the media mocks return canned text.

pub mod mock_embedder;
pub mod mock_media;

pub use mock_embedder::MockEmbedder;
pub use mock_media::{MockCaptioner, MockTranscriber};
