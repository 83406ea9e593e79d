// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval orchestrator: query-time composition of persona directive
//! and retrieved memories into a bounded conversation context.
//!
//! Owns no persistent state. Embeds the live query, runs hybrid search
//! with a generous k, boosts emotionally tagged memories, and greedily
//! packs ranked chunks into the token budget. A fixed budget slice is
//! always reserved for the persona directive so personality never gets
//! crowded out by memory content. Memory-layer failures degrade to a
//! persona-only context; the conversation turn never hard-fails.

use std::sync::Arc;

use metrics::counter;
use tracing::warn;

use keepsake_config::RetrievalConfig;
use keepsake_core::tokens::token_count;
use keepsake_core::{KeepsakeError, MemoryType, Namespace, ScoredChunk, SearchFilters};
use keepsake_embed::BatchEmbedder;
use keepsake_memory::MemoryStore;
use keepsake_persona::default_persona_prompt;
use keepsake_storage::{Database, queries::profiles};

use crate::context::{ContextMemory, ConversationContext};

/// Pure query-time composition layer over the store and the profile.
pub struct RetrievalOrchestrator {
    store: Arc<MemoryStore>,
    embedder: Arc<BatchEmbedder>,
    db: Database,
    config: RetrievalConfig,
}

impl RetrievalOrchestrator {
    pub fn new(
        store: Arc<MemoryStore>,
        embedder: Arc<BatchEmbedder>,
        db: Database,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            db,
            config,
        }
    }

    /// Assemble the context for one conversation turn.
    ///
    /// An empty namespace yields a persona-only context with zero chunks;
    /// that is an explicit, valid state, not an error. Only a security
    /// invariant violation fails the request.
    pub async fn build_context(
        &self,
        namespace: &Namespace,
        live_query: &str,
        max_tokens: usize,
    ) -> Result<ConversationContext, KeepsakeError> {
        if !namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }
        counter!("keepsake_context_builds_total").increment(1);

        let persona_directive = self.persona_directive(namespace).await;
        let persona_tokens = token_count(&persona_directive);
        let reserved = self.config.persona_reserved_tokens.min(max_tokens);
        let memory_budget = max_tokens.saturating_sub(reserved);

        if memory_budget == 0 {
            return Ok(ConversationContext::persona_only(
                namespace.owner_id.clone(),
                namespace.companion_id.clone(),
                persona_directive,
                false,
            ));
        }

        let query_embedding = match self.embedder.embed_one(live_query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "query embedding failed, degrading to persona-only context");
                counter!("keepsake_context_degraded_total").increment(1);
                return Ok(ConversationContext::persona_only(
                    namespace.owner_id.clone(),
                    namespace.companion_id.clone(),
                    persona_directive,
                    true,
                ));
            }
        };

        let mut ranked = match self
            .store
            .search(
                namespace,
                live_query,
                &query_embedding,
                self.config.search_k,
                &SearchFilters::default(),
            )
            .await
        {
            Ok(results) => results,
            // A namespace mismatch is fatal for the request, never
            // silently degraded.
            Err(e @ KeepsakeError::SecurityInvariant(_)) => return Err(e),
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "search failed, degrading to persona-only context");
                counter!("keepsake_context_degraded_total").increment(1);
                return Ok(ConversationContext::persona_only(
                    namespace.owner_id.clone(),
                    namespace.companion_id.clone(),
                    persona_directive,
                    true,
                ));
            }
        };

        self.apply_emotional_boost(&mut ranked);

        // Greedy pack in rank order until the memory budget is spent.
        let mut memories = Vec::new();
        let mut used = 0usize;
        for scored in ranked {
            let tokens = token_count(&scored.chunk.content);
            if used + tokens > memory_budget {
                break;
            }
            used += tokens;
            memories.push(ContextMemory {
                chunk_id: scored.chunk.id,
                content: scored.chunk.content,
                memory_type: scored.chunk.memory_type,
                score: scored.score,
            });
        }

        Ok(ConversationContext {
            owner_id: namespace.owner_id.clone(),
            companion_id: namespace.companion_id.clone(),
            persona_directive,
            memories,
            memory_tokens: used,
            persona_tokens,
            degraded: false,
        })
    }

    /// Stored persona directive, or the default when the profile is
    /// missing or empty. A profile read failure degrades to the default
    /// rather than failing the turn.
    async fn persona_directive(&self, namespace: &Namespace) -> String {
        match profiles::get_profile(&self.db, &namespace.owner_id, &namespace.companion_id).await {
            Ok(Some(profile)) if !profile.persona_prompt.is_empty() => profile.persona_prompt,
            Ok(_) => default_persona_prompt(),
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "profile read failed, using default persona");
                default_persona_prompt()
            }
        }
    }

    /// Multiply emotionally tagged memories' scores and re-rank.
    fn apply_emotional_boost(&self, ranked: &mut [ScoredChunk]) {
        for scored in ranked.iter_mut() {
            if scored.chunk.memory_type == MemoryType::Emotional {
                scored.score *= self.config.emotional_boost;
            }
        }
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.chunk.created_at.cmp(&a.chunk.created_at))
        });
    }
}
