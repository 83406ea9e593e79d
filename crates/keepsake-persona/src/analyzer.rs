// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical trait analysis over memory content.
//!
//! Scores the fixed vocabulary by keyword occurrence and regex pattern
//! matches, normalized per 100 words and squashed through a shifted
//! sigmoid. Output weights are bounded to `0.0..=1.0` regardless of
//! memory volume, so traits cannot drift unboundedly as memories
//! accumulate.

use std::collections::BTreeMap;

use regex::Regex;

use keepsake_core::KeepsakeError;

use crate::vocabulary::{COMMUNICATION_STYLES, PERSONALITY_TRAITS, TraitLexicon};

/// Minimum words before an analysis is considered reliable; below this
/// the neutral default weights are returned.
const MIN_WORDS: usize = 50;

const KEYWORD_POINTS: f64 = 0.1;
const PATTERN_POINTS: f64 = 0.15;

/// Result of one analysis pass.
#[derive(Debug, Clone)]
pub struct TraitAnalysis {
    pub personality: BTreeMap<String, f64>,
    pub style: BTreeMap<String, f64>,
    pub word_count: usize,
    /// Confidence in `0.0..=1.0`, grown by evidence volume.
    pub confidence: f64,
}

struct CompiledLexicon {
    name: &'static str,
    keywords: &'static [&'static str],
    patterns: Vec<Regex>,
    weight: f64,
}

fn compile(lexicons: &'static [TraitLexicon]) -> Result<Vec<CompiledLexicon>, KeepsakeError> {
    lexicons
        .iter()
        .map(|lexicon| {
            let patterns = lexicon
                .patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        KeepsakeError::Internal(format!("invalid vocabulary pattern {p:?}: {e}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CompiledLexicon {
                name: lexicon.name,
                keywords: lexicon.keywords,
                patterns,
                weight: lexicon.weight,
            })
        })
        .collect()
}

/// Scores the fixed trait vocabulary against memory content.
pub struct Analyzer {
    personality: Vec<CompiledLexicon>,
    styles: Vec<CompiledLexicon>,
}

impl Analyzer {
    pub fn new() -> Result<Self, KeepsakeError> {
        Ok(Self {
            personality: compile(PERSONALITY_TRAITS)?,
            styles: compile(COMMUNICATION_STYLES)?,
        })
    }

    /// Analyze a set of memory texts into bounded trait weights.
    ///
    /// Deterministic: the same texts always produce the same weights.
    pub fn analyze(&self, texts: &[String]) -> TraitAnalysis {
        let combined = texts.join(" ").to_lowercase();
        let word_count = combined.split_whitespace().count();

        if word_count < MIN_WORDS {
            return Self::default_analysis(word_count, texts.len());
        }

        let per_hundred = word_count as f64 / 100.0;

        let personality = self
            .personality
            .iter()
            .map(|lexicon| {
                let raw = lexicon_points(lexicon, &combined) * lexicon.weight / per_hundred;
                (lexicon.name.to_string(), shifted_sigmoid(raw))
            })
            .collect();

        let style = self
            .styles
            .iter()
            .map(|lexicon| {
                let raw = lexicon_hits(lexicon, &combined) / per_hundred;
                (lexicon.name.to_string(), raw.min(1.0))
            })
            .collect();

        TraitAnalysis {
            personality,
            style,
            word_count,
            confidence: confidence(word_count, texts.len()),
        }
    }

    /// Neutral weights for namespaces with too little evidence: slightly
    /// agreeable, emotionally stable, casually spoken.
    pub fn default_analysis(word_count: usize, memory_count: usize) -> TraitAnalysis {
        let personality = BTreeMap::from([
            ("openness".to_string(), 0.5),
            ("conscientiousness".to_string(), 0.5),
            ("extraversion".to_string(), 0.5),
            ("agreeableness".to_string(), 0.6),
            ("neuroticism".to_string(), 0.3),
        ]);
        let style = BTreeMap::from([
            ("formal".to_string(), 0.3),
            ("casual".to_string(), 0.5),
            ("emotional".to_string(), 0.4),
            ("analytical".to_string(), 0.3),
            ("storytelling".to_string(), 0.4),
        ]);
        TraitAnalysis {
            personality,
            style,
            word_count,
            confidence: confidence(word_count, memory_count).min(0.1),
        }
    }
}

/// Weighted keyword and pattern points for a personality lexicon.
fn lexicon_points(lexicon: &CompiledLexicon, text: &str) -> f64 {
    let keyword_score: f64 = lexicon
        .keywords
        .iter()
        .map(|k| text.matches(k).count() as f64 * KEYWORD_POINTS)
        .sum();
    let pattern_score: f64 = lexicon
        .patterns
        .iter()
        .map(|p| p.find_iter(text).count() as f64 * PATTERN_POINTS)
        .sum();
    keyword_score + pattern_score
}

/// Raw hit count for a style lexicon.
fn lexicon_hits(lexicon: &CompiledLexicon, text: &str) -> f64 {
    let keyword_hits: usize = lexicon.keywords.iter().map(|k| text.matches(k).count()).sum();
    let pattern_hits: usize = lexicon.patterns.iter().map(|p| p.find_iter(text).count()).sum();
    (keyword_hits + pattern_hits) as f64
}

/// Sigmoid shifted so zero evidence lands well below neutral.
fn shifted_sigmoid(score: f64) -> f64 {
    (1.0 / (1.0 + (-score + 2.0).exp())).clamp(0.0, 1.0)
}

/// Confidence from evidence volume: word count dominates, memory count
/// contributes.
fn confidence(word_count: usize, memory_count: usize) -> f64 {
    let word_confidence = (word_count as f64 / 1000.0).min(1.0);
    let memory_confidence = (memory_count as f64 / 20.0).min(1.0);
    word_confidence * 0.7 + memory_confidence * 0.3
}
