// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion pipeline for the Keepsake memory engine.
//!
//! ## Architecture
//!
//! - **Normalizer**: heterogeneous artifacts to plain text, delegating
//!   voice and photo to external collaborators
//! - **Chunker**: semantic splitting into token-bounded candidates
//! - **classify**: memory type categorization from content
//! - **IngestPipeline**: upload sessions with per-file status,
//!   idempotent chunk writes, and cancellation

pub mod chunker;
pub mod classify;
pub mod normalizer;
pub mod pipeline;

pub use chunker::Chunker;
pub use classify::categorize_memory;
pub use normalizer::Normalizer;
pub use pipeline::{ArtifactUpload, IngestPipeline};
