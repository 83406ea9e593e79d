// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed, versioned trait vocabulary.
//!
//! The analyzer scores exactly these traits and styles; the vocabulary
//! never grows at runtime, so weights stay bounded and tests stay
//! reproducible. Bump the version when lexicons change so persisted
//! profiles can be re-derived.

/// Version of the trait vocabulary baked into this build.
pub const VOCABULARY_VERSION: u32 = 1;

/// Lexical markers for one trait or communication style.
pub struct TraitLexicon {
    pub name: &'static str,
    /// Plain keywords counted by substring occurrence.
    pub keywords: &'static [&'static str],
    /// Regex patterns counted by match.
    pub patterns: &'static [&'static str],
    /// Direction and strength of the evidence.
    pub weight: f64,
}

/// Big Five personality traits.
pub const PERSONALITY_TRAITS: &[TraitLexicon] = &[
    TraitLexicon {
        name: "openness",
        keywords: &[
            "creative",
            "imaginative",
            "curious",
            "artistic",
            "adventurous",
            "explore",
            "different",
            "unique",
        ],
        patterns: &[
            r"\b(try|explore|discover|create|imagine|wonder)\b",
            r"\b(art|music|book|travel|culture)\b",
        ],
        weight: 1.0,
    },
    TraitLexicon {
        name: "conscientiousness",
        keywords: &[
            "organized",
            "responsible",
            "disciplined",
            "careful",
            "reliable",
            "plan",
            "schedule",
            "goal",
        ],
        patterns: &[
            r"\b(plan|organize|schedule|prepare|goal|target)\b",
            r"\b(work|study|complete|finish|accomplish)\b",
        ],
        weight: 1.0,
    },
    TraitLexicon {
        name: "extraversion",
        keywords: &[
            "social",
            "outgoing",
            "energetic",
            "talkative",
            "party",
            "friends",
            "people",
            "meeting",
        ],
        patterns: &[
            r"\b(party|social|friends|people|crowd|gathering)\b",
            r"\b(talk|speak|chat|discuss|share)\b",
        ],
        weight: 1.0,
    },
    TraitLexicon {
        name: "agreeableness",
        keywords: &[
            "kind",
            "helpful",
            "cooperative",
            "trusting",
            "caring",
            "compassionate",
            "support",
            "help",
        ],
        patterns: &[
            r"\b(help|support|care|love|kind|nice|good)\b",
            r"\b(family|friend|relationship|together)\b",
        ],
        weight: 1.0,
    },
    TraitLexicon {
        name: "neuroticism",
        keywords: &[
            "anxious",
            "worried",
            "stressed",
            "nervous",
            "tense",
            "moody",
            "upset",
        ],
        patterns: &[
            r"\b(worry|stress|anxious|nervous|scared|afraid)\b",
            r"\b(sad|angry|upset|frustrated|disappointed)\b",
        ],
        // Inverted: heavy markers lower the stability score.
        weight: -1.0,
    },
];

/// Communication styles.
pub const COMMUNICATION_STYLES: &[TraitLexicon] = &[
    TraitLexicon {
        name: "formal",
        keywords: &["please", "thank you", "respectfully", "sincerely"],
        patterns: &[r"\b(would|could|might|may)\b"],
        weight: 1.0,
    },
    TraitLexicon {
        name: "casual",
        keywords: &["hey", "yeah", "cool", "awesome", "fun", "lol", "haha"],
        patterns: &[r"\b(gonna|wanna|gotta)\b"],
        weight: 1.0,
    },
    TraitLexicon {
        name: "emotional",
        keywords: &["feel", "heart", "soul", "love", "passion", "feeling"],
        patterns: &[r"\b(happy|sad|excited|angry|joy)\b"],
        weight: 1.0,
    },
    TraitLexicon {
        name: "analytical",
        keywords: &["think", "analyze", "consider", "reason", "logic", "evidence"],
        patterns: &[r"\b(fact|data|evidence|research|study)\b"],
        weight: 1.0,
    },
    TraitLexicon {
        name: "storytelling",
        keywords: &["story", "remember", "once", "happened", "experience", "moment"],
        patterns: &[r"\b(time|moment|day|when|where)\b"],
        weight: 1.0,
    },
];
