// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding generation for the Keepsake memory engine.
//!
//! - **HttpEmbedder**: OpenAI-compatible `/v1/embeddings` client
//! - **BatchEmbedder**: order-preserving batching with bounded
//!   concurrency and retry

pub mod batch;
pub mod client;

pub use batch::BatchEmbedder;
pub use client::HttpEmbedder;
