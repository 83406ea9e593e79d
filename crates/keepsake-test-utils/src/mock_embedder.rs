// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mock embedding adapter.
//!
//! Produces an L2-normalized bag-of-words hash embedding: texts sharing
//! words get correlated vectors, so recall-style tests behave like a real
//! semantic embedder without any external service. Failure injection
//! exercises retry paths.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use keepsake_core::traits::adapter::ServiceAdapter;
use keepsake_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use keepsake_core::{EmbeddingAdapter, KeepsakeError};

/// Mock embedder with deterministic output and optional failure injection.
pub struct MockEmbedder {
    dims: usize,
    fail_remaining: AtomicU32,
}

impl MockEmbedder {
    /// Create a mock embedder producing vectors of the given dimension.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            fail_remaining: AtomicU32::new(0),
        }
    }

    /// Fail the next `n` embed calls with a transient error.
    pub fn with_failures(self, n: u32) -> Self {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Deterministic bag-of-words hash embedding, L2-normalized.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // DefaultHasher with default keys is deterministic per build.
            let mut hasher = std::hash::DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let dim = (hasher.finish() as usize) % self.dims;
            vector[dim] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl ServiceAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, KeepsakeError> {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(KeepsakeError::transient("mock-embedder"));
        }

        let embeddings = input.texts.iter().map(|t| self.embed_text(t)).collect();
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dims,
        })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
