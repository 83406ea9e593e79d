// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personalization profile types.
//!
//! A profile is derived data: fully reconstructible from the chunk set plus
//! the interaction log. Persistence exists only to make reads cheap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Profile maturity stage. Advances monotonically as memory volume and
/// diversity cross configured thresholds; it never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStage {
    Empty,
    Seeded,
    Enhanced,
}

impl ProfileStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStage::Empty => "empty",
            ProfileStage::Seeded => "seeded",
            ProfileStage::Enhanced => "enhanced",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "seeded" => ProfileStage::Seeded,
            "enhanced" => ProfileStage::Enhanced,
            _ => ProfileStage::Empty,
        }
    }
}

/// Feature tier for a profile, set by the account-management collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalizationLevel {
    Basic,
    Enhanced,
    Premium,
}

impl PersonalizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalizationLevel::Basic => "basic",
            PersonalizationLevel::Enhanced => "enhanced",
            PersonalizationLevel::Premium => "premium",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "enhanced" => PersonalizationLevel::Enhanced,
            "premium" => PersonalizationLevel::Premium,
            _ => PersonalizationLevel::Basic,
        }
    }
}

/// One personalization profile per `(owner_id, companion_id)` namespace.
///
/// Trait and style maps use `BTreeMap` so that iteration order, and
/// therefore the generated persona prompt, is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationProfile {
    pub owner_id: String,
    pub companion_id: String,
    pub stage: ProfileStage,
    /// Fixed-vocabulary personality trait weights, each in `0.0..=1.0`.
    pub personality_traits: BTreeMap<String, f64>,
    /// Fixed-vocabulary communication style weights, each in `0.0..=1.0`.
    pub communication_style: BTreeMap<String, f64>,
    /// Generated directive text handed to the external generator.
    pub persona_prompt: String,
    /// Optional pointer to a fine-tuned adapter weight set.
    pub adapter_reference: Option<String>,
    pub personalization_level: PersonalizationLevel,
    /// Number of chunks already folded into the trait weights. Incremental
    /// updates analyze only chunks beyond this count.
    pub analyzed_chunks: u64,
    pub interaction_count: u64,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

impl PersonalizationProfile {
    /// A fresh, empty profile for a namespace.
    pub fn empty(owner_id: impl Into<String>, companion_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            companion_id: companion_id.into(),
            stage: ProfileStage::Empty,
            personality_traits: BTreeMap::new(),
            communication_style: BTreeMap::new(),
            persona_prompt: String::new(),
            adapter_reference: None,
            personalization_level: PersonalizationLevel::Basic,
            analyzed_chunks: 0,
            interaction_count: 0,
            updated_at: String::new(),
        }
    }

    /// Top `n` personality traits by weight, descending.
    pub fn dominant_traits(&self, n: usize) -> Vec<(&str, f64)> {
        let mut traits: Vec<(&str, f64)> = self
            .personality_traits
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        traits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        traits.truncate(n);
        traits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_ordering_is_monotonic() {
        assert!(ProfileStage::Empty < ProfileStage::Seeded);
        assert!(ProfileStage::Seeded < ProfileStage::Enhanced);
    }

    #[test]
    fn stage_roundtrip() {
        for stage in [
            ProfileStage::Empty,
            ProfileStage::Seeded,
            ProfileStage::Enhanced,
        ] {
            assert_eq!(ProfileStage::from_str_value(stage.as_str()), stage);
        }
    }

    #[test]
    fn dominant_traits_sorted_descending() {
        let mut profile = PersonalizationProfile::empty("u1", "c1");
        profile.personality_traits.insert("warmth".into(), 0.9);
        profile.personality_traits.insert("formality".into(), 0.2);
        profile.personality_traits.insert("playfulness".into(), 0.7);

        let top = profile.dominant_traits(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "warmth");
        assert_eq!(top[1].0, "playfulness");
    }

    #[test]
    fn empty_profile_defaults() {
        let profile = PersonalizationProfile::empty("u1", "c1");
        assert_eq!(profile.stage, ProfileStage::Empty);
        assert_eq!(
            profile.personalization_level,
            PersonalizationLevel::Basic
        );
        assert!(profile.adapter_reference.is_none());
        assert_eq!(profile.analyzed_chunks, 0);
    }
}
