// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keepsake: a memory processing and retrieval engine for personalized
//! AI companions.
//!
//! Ingests personal artifacts (text, transcribed audio, captioned
//! images, chat exports), turns them into a queryable, namespace-isolated
//! memory store with hybrid search, derives a persona profile from the
//! accumulated memories, and assembles bounded generation context for
//! the conversational front end.
//!
//! ## Boundary surface
//!
//! [`MemoryEngine`] is the narrow interface external collaborators use:
//!
//! - upload handling: [`MemoryEngine::submit_artifact`] /
//!   [`MemoryEngine::submit_batch`]
//! - chat layer: [`MemoryEngine::get_context`]
//! - account management: [`MemoryEngine::export_all`] /
//!   [`MemoryEngine::delete_all`]
//! - maintenance: [`MemoryEngine::apply_retention`]

pub mod engine;

pub use engine::{EngineAdapters, MemoryEngine, RetentionReport};

// Re-export the pieces callers need to drive the engine.
pub use keepsake_config::{KeepsakeConfig, load_config, load_config_from_str};
pub use keepsake_core::{
    CaptionAdapter, EmbeddingAdapter, KeepsakeError, MemoryType, Namespace, PersonalizationLevel,
    PersonalizationProfile, ProfileStage, RetentionClass, SessionStatus, SourceType,
    TranscriptionAdapter, UploadSession,
};
pub use keepsake_embed::HttpEmbedder;
pub use keepsake_ingest::ArtifactUpload;
pub use keepsake_privacy::{DeletionReport, ExportBundle};
pub use keepsake_retrieval::{ContextMemory, ConversationContext};
