// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic persona directive generation.
//!
//! Template expansion over the profile's trait and style maps: the same
//! profile always yields byte-identical output, which makes the directive
//! testable and cacheable at the generation layer.

use keepsake_core::{PersonalizationProfile, ProfileStage};

fn trait_description(name: &str) -> &'static str {
    match name {
        "openness" => "creative and open to new experiences",
        "conscientiousness" => "organized and reliable",
        "extraversion" => "social and energetic",
        "agreeableness" => "kind and cooperative",
        "neuroticism" => "emotionally sensitive",
        _ => "balanced",
    }
}

fn style_description(name: &str) -> Option<&'static str> {
    match name {
        "formal" => Some("You communicate in a respectful and polite manner"),
        "casual" => Some("You use casual, friendly language"),
        "emotional" => Some("You express emotions openly and connect on an emotional level"),
        "analytical" => Some("You think through things logically and provide reasoned responses"),
        "storytelling" => Some("You enjoy sharing experiences and memories through stories"),
        _ => None,
    }
}

/// Directive used before any memories have shaped the profile.
pub fn default_persona_prompt() -> String {
    "You are a caring and empathetic AI companion with a balanced personality.\n\
     \n\
     Personality: You are quite kind and cooperative, with moderate openness to \
     new experiences and a stable emotional nature.\n\
     \n\
     Communication: You use casual, friendly language and connect on an emotional level.\n\
     \n\
     Behavioral Guidelines:\n\
     - Always show genuine care and emotional intelligence\n\
     - Be supportive and understanding in all interactions\n\
     - Remember and reference previous conversations when relevant\n\
     - Maintain consistency in your caring, supportive personality\n\
     - Remember that you are a companion, not just an assistant"
        .to_string()
}

/// Build the persona directive for a profile.
///
/// Pure function: iteration order comes from the profile's BTreeMaps plus
/// explicit weight sorting, so unchanged profiles produce byte-identical
/// directives.
pub fn build_persona_prompt(profile: &PersonalizationProfile) -> String {
    if profile.stage == ProfileStage::Empty {
        return default_persona_prompt();
    }

    let mut sections: Vec<String> = Vec::new();
    sections.push(
        "You are a deeply personalized AI companion with the following personality \
         characteristics:"
            .to_string(),
    );

    // Dominant traits, strongest first; name order breaks weight ties.
    let mut dominant: Vec<(&String, f64)> = profile
        .personality_traits
        .iter()
        .filter(|(_, w)| **w > 0.6)
        .map(|(name, w)| (name, *w))
        .collect();
    dominant.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    if !dominant.is_empty() {
        let described: Vec<String> = dominant
            .iter()
            .take(3)
            .map(|(name, weight)| {
                let intensity = if *weight > 0.8 { "very" } else { "quite" };
                format!("{intensity} {}", trait_description(name))
            })
            .collect();
        sections.push(format!("Personality: You are {}.", described.join(", ")));
    } else {
        sections.push(
            "Personality: Balanced, with moderate traits across all dimensions.".to_string(),
        );
    }

    // Top two communication styles above threshold.
    let mut styles: Vec<(&String, f64)> = profile
        .communication_style
        .iter()
        .filter(|(_, w)| **w > 0.4)
        .map(|(name, w)| (name, *w))
        .collect();
    styles.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    let style_lines: Vec<&'static str> = styles
        .iter()
        .take(2)
        .filter_map(|(name, _)| style_description(name))
        .collect();
    if !style_lines.is_empty() {
        sections.push(format!("Communication: {}.", style_lines.join(". ")));
    }

    sections.push(
        "Behavioral Guidelines:\n\
         - Always stay in character based on the personality traits above\n\
         - Reference shared memories and experiences when relevant\n\
         - Adapt your communication style to match the described patterns\n\
         - Show genuine care and emotional intelligence\n\
         - Be consistent in your personality across all interactions\n\
         - Remember that you are a companion, not just an assistant"
            .to_string(),
    );
    sections.push(
        "Memory Integration: You have access to shared memories and should reference \
         them naturally in conversation to maintain continuity and emotional connection."
            .to_string(),
    );

    sections.join("\n\n")
}
