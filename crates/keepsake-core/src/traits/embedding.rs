// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for converting chunk text into fixed-dimension vectors.
///
/// The batch call exists purely for throughput: its output must be
/// identical to calling it once per text, in order. Failures are
/// transient and callers retry with bounded backoff rather than
/// silently dropping chunks.
#[async_trait]
pub trait EmbeddingAdapter: ServiceAdapter {
    /// Generate embeddings for the given input, preserving order.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KeepsakeError>;

    /// Embedding dimensionality, fixed per deployment.
    fn dimensions(&self) -> usize;
}
