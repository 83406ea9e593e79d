// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile lifecycle: the Empty -> Seeded -> Enhanced state machine and
//! incremental trait updates.
//!
//! Updates blend prior weights with fresh evidence using exponential
//! decay, so the cost of an update is bounded by the new data volume
//! rather than the full history. The stage only ever advances.

use tracing::debug;

use keepsake_config::PersonaConfig;
use keepsake_core::{KeepsakeError, PersonalizationProfile, ProfileStage};

use crate::analyzer::Analyzer;
use crate::prompt::build_persona_prompt;

/// Drives profile creation and incremental updates.
pub struct ProfileEngine {
    analyzer: Analyzer,
    config: PersonaConfig,
}

impl ProfileEngine {
    pub fn new(config: &PersonaConfig) -> Result<Self, KeepsakeError> {
        Ok(Self {
            analyzer: Analyzer::new()?,
            config: config.clone(),
        })
    }

    /// Stage implied by the namespace's current memory volume and
    /// diversity. The Enhanced stage needs both volume and at least
    /// `enhance_min_type_diversity` distinct memory types, so a
    /// one-dimensional memory set cannot overfit the personality.
    fn implied_stage(&self, chunk_count: u64, distinct_types: usize) -> ProfileStage {
        if chunk_count >= self.config.enhance_threshold
            && distinct_types >= self.config.enhance_min_type_diversity
        {
            ProfileStage::Enhanced
        } else if chunk_count >= self.config.seed_threshold {
            ProfileStage::Seeded
        } else {
            ProfileStage::Empty
        }
    }

    /// Next stage for a profile: monotonically advancing.
    pub fn next_stage(
        &self,
        current: ProfileStage,
        chunk_count: u64,
        distinct_types: usize,
    ) -> ProfileStage {
        current.max(self.implied_stage(chunk_count, distinct_types))
    }

    /// Incrementally fold new chunk texts and interaction texts into the
    /// profile, then regenerate the persona directive.
    ///
    /// `chunk_count` and `distinct_types` describe the whole namespace
    /// and drive the stage transition; only `new_texts` and
    /// `new_interactions` are analyzed.
    pub fn update(
        &self,
        profile: &mut PersonalizationProfile,
        new_texts: &[String],
        new_interactions: &[String],
        chunk_count: u64,
        distinct_types: usize,
    ) {
        let mut evidence: Vec<String> = Vec::with_capacity(new_texts.len() + new_interactions.len());
        evidence.extend_from_slice(new_texts);
        evidence.extend_from_slice(new_interactions);

        if !evidence.is_empty() {
            let analysis = self.analyzer.analyze(&evidence);
            let alpha = self.config.decay_alpha.clamp(0.0, 1.0);
            let first_evidence = profile.analyzed_chunks == 0 && profile.interaction_count == 0;

            for (name, fresh) in analysis.personality {
                let blended = if first_evidence {
                    fresh
                } else {
                    let old = profile.personality_traits.get(&name).copied().unwrap_or(fresh);
                    (1.0 - alpha) * old + alpha * fresh
                };
                profile.personality_traits.insert(name, blended.clamp(0.0, 1.0));
            }
            for (name, fresh) in analysis.style {
                let blended = if first_evidence {
                    fresh
                } else {
                    let old = profile.communication_style.get(&name).copied().unwrap_or(fresh);
                    (1.0 - alpha) * old + alpha * fresh
                };
                profile
                    .communication_style
                    .insert(name, blended.clamp(0.0, 1.0));
            }

            profile.analyzed_chunks += new_texts.len() as u64;
            profile.interaction_count += new_interactions.len() as u64;
        }

        let next = self.next_stage(profile.stage, chunk_count, distinct_types);
        if next != profile.stage {
            debug!(
                owner_id = %profile.owner_id,
                companion_id = %profile.companion_id,
                from = profile.stage.as_str(),
                to = next.as_str(),
                "profile stage advanced"
            );
        }
        profile.stage = next;
        profile.persona_prompt = build_persona_prompt(profile);
    }
}
