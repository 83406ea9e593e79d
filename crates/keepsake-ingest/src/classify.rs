// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory type categorization from chunk content.
//!
//! Keyword indicator scan: the type with the most indicator hits wins.
//! When nothing matches, chat-sourced chunks default to conversational
//! and everything else to factual.

use keepsake_core::{MemoryType, SourceType};

const EMOTIONAL: &[&str] = &[
    "feel", "felt", "emotion", "heart", "soul", "love", "loved", "hate", "fear", "joy", "sad",
    "happy", "cried", "miss", "missed",
];

const FACTUAL: &[&str] = &[
    "fact", "information", "data", "statistics", "research", "study", "report", "address",
    "number", "birthday",
];

const CONVERSATIONAL: &[&str] = &[
    "said", "told", "asked", "replied", "conversation", "chat", "talk", "talked", "discuss",
    "discussed",
];

const EXPERIENTIAL: &[&str] = &[
    "experience", "happened", "went", "did", "saw", "heard", "visited", "lived", "trip",
    "remember",
];

/// Categorize a chunk's memory type from its content.
pub fn categorize_memory(content: &str, source: SourceType) -> MemoryType {
    let words: Vec<String> = content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let score = |indicators: &[&str]| -> usize {
        words.iter().filter(|w| indicators.contains(&w.as_str())).count()
    };

    let scores = [
        (MemoryType::Emotional, score(EMOTIONAL)),
        (MemoryType::Conversational, score(CONVERSATIONAL)),
        (MemoryType::Experiential, score(EXPERIENTIAL)),
        (MemoryType::Factual, score(FACTUAL)),
    ];

    if let Some((memory_type, hits)) = scores.iter().max_by_key(|(_, hits)| *hits) {
        if *hits > 0 {
            return *memory_type;
        }
    }

    match source {
        SourceType::Chat => MemoryType::Conversational,
        _ => MemoryType::Factual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotional_content_is_detected() {
        let ty = categorize_memory(
            "I felt my heart ache when she cried at the airport",
            SourceType::Text,
        );
        assert_eq!(ty, MemoryType::Emotional);
    }

    #[test]
    fn conversational_content_is_detected() {
        let ty = categorize_memory(
            "she said she would call and then asked about the weekend",
            SourceType::Text,
        );
        assert_eq!(ty, MemoryType::Conversational);
    }

    #[test]
    fn experiential_content_is_detected() {
        let ty = categorize_memory(
            "we went to the lighthouse and saw the storm roll in",
            SourceType::Text,
        );
        assert_eq!(ty, MemoryType::Experiential);
    }

    #[test]
    fn neutral_text_defaults_by_source() {
        assert_eq!(
            categorize_memory("teal, size medium, apartment 4b", SourceType::Text),
            MemoryType::Factual
        );
        assert_eq!(
            categorize_memory("teal, size medium, apartment 4b", SourceType::Chat),
            MemoryType::Conversational
        );
    }
}
