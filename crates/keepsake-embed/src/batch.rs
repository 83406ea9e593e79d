// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order-preserving batch embedding with bounded concurrency and retry.
//!
//! Batching exists purely for throughput: the output of `embed_many` is
//! identical to calling the adapter once per text, in order. Sub-batches
//! run concurrently up to a configurable cap so the external service is
//! never overwhelmed, and each sub-batch is retried with bounded backoff
//! so a transient failure never silently drops chunks.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};

use keepsake_config::EmbeddingConfig;
use keepsake_core::retry::{BackoffPolicy, with_backoff};
use keepsake_core::types::EmbeddingInput;
use keepsake_core::{EmbeddingAdapter, KeepsakeError};

/// Wraps an [`EmbeddingAdapter`] with batching, concurrency, and retry.
pub struct BatchEmbedder {
    adapter: Arc<dyn EmbeddingAdapter>,
    batch_size: usize,
    concurrency: usize,
    policy: BackoffPolicy,
}

impl BatchEmbedder {
    /// Creates a batch embedder from the embedding config section.
    pub fn new(adapter: Arc<dyn EmbeddingAdapter>, config: &EmbeddingConfig) -> Self {
        Self {
            adapter,
            batch_size: config.batch_size.max(1),
            concurrency: config.embed_concurrency.max(1),
            policy: BackoffPolicy {
                max_attempts: config.retry_attempts,
                base_delay: Duration::from_millis(config.retry_base_delay_ms),
                factor: 2,
                attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            },
        }
    }

    /// Embedding dimensionality of the wrapped adapter.
    pub fn dimensions(&self) -> usize {
        self.adapter.dimensions()
    }

    /// Embed a single text with retry.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, KeepsakeError> {
        let mut vectors = self.embed_many(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| KeepsakeError::Internal("embedding service returned no vector".into()))
    }

    /// Embed many texts, preserving input order.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KeepsakeError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<Vec<String>> = texts
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        // `buffered` (not `buffer_unordered`) keeps sub-batch order, which
        // keeps the final flattened order equal to the input order.
        let results: Vec<Vec<Vec<f32>>> = stream::iter(batches.into_iter().map(|batch| {
            let adapter = self.adapter.clone();
            let policy = self.policy;
            async move {
                with_backoff(policy, "embedding", || {
                    let adapter = adapter.clone();
                    let texts = batch.clone();
                    async move {
                        let output = adapter.embed(EmbeddingInput { texts }).await?;
                        Ok(output.embeddings)
                    }
                })
                .await
            }
        }))
        .buffered(self.concurrency)
        .try_collect()
        .await?;

        let vectors: Vec<Vec<f32>> = results.into_iter().flatten().collect();
        if vectors.len() != texts.len() {
            return Err(KeepsakeError::Internal(format!(
                "embedding service returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}
