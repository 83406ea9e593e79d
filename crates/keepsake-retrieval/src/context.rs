// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context types handed to the external generation call.

use serde::{Deserialize, Serialize};

use keepsake_core::MemoryType;

/// One memory selected into the generation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMemory {
    pub chunk_id: String,
    pub content: String,
    pub memory_type: MemoryType,
    /// Final ranking score after the emotional-significance boost.
    pub score: f32,
}

/// Bounded context for one conversation turn.
///
/// A context with zero memories and only the persona directive is a
/// valid state (cold start or graceful degradation), not a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub owner_id: String,
    pub companion_id: String,
    /// Directive instructing the generator how to sound like the profile.
    pub persona_directive: String,
    /// Selected memories in rank order.
    pub memories: Vec<ContextMemory>,
    /// Token-equivalents consumed by the memories.
    pub memory_tokens: usize,
    /// Token-equivalents consumed by the persona directive.
    pub persona_tokens: usize,
    /// True when a memory-layer failure degraded this turn to a
    /// persona-only context.
    pub degraded: bool,
}

impl ConversationContext {
    /// A persona-only context.
    pub fn persona_only(
        owner_id: impl Into<String>,
        companion_id: impl Into<String>,
        persona_directive: String,
        degraded: bool,
    ) -> Self {
        let persona_tokens = keepsake_core::tokens::token_count(&persona_directive);
        Self {
            owner_id: owner_id.into(),
            companion_id: companion_id.into(),
            persona_directive,
            memories: Vec::new(),
            memory_tokens: 0,
            persona_tokens,
            degraded,
        }
    }
}
