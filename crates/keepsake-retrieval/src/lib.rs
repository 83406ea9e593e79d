// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-time context assembly for the Keepsake memory engine.
//!
//! The orchestrator is the sole read-path entry point for the chat
//! layer: it embeds the live query, runs hybrid search, applies the
//! emotional-significance boost, and packs memories plus the persona
//! directive into a bounded [`ConversationContext`].

pub mod context;
pub mod orchestrator;

pub use context::{ContextMemory, ConversationContext};
pub use orchestrator::RetrievalOrchestrator;
