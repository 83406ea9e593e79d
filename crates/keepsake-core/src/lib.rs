// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keepsake memory engine.
//!
//! This crate provides the foundational trait definitions, error types,
//! domain types, and retry primitives used throughout the Keepsake
//! workspace. All external-collaborator adapters implement traits
//! defined here.

pub mod error;
pub mod profile;
pub mod retry;
pub mod session;
pub mod tokens;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KeepsakeError;
pub use profile::{PersonalizationLevel, PersonalizationProfile, ProfileStage};
pub use session::{FileStatus, SessionStatus, UploadFileRecord, UploadSession};
pub use types::{
    ChunkCandidate, ChunkDraft, ChunkStatus, MemoryChunk, MemoryType, Namespace, NormalizedText,
    PrivacyLevel, RetentionClass, ScoredChunk, SearchFilters, SourceType,
};

// Re-export adapter traits at crate root.
pub use traits::{CaptionAdapter, EmbeddingAdapter, ServiceAdapter, TranscriptionAdapter};
