// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid ranking primitives: sparse keyword overlap, FTS query building,
//! and the weighted dense/sparse combination.
//!
//! The final rank is `dense_weight * cosine + sparse_weight * overlap`
//! (defaults 0.7 / 0.3, tunable in config), with ties broken by recency.

/// Tokenize text into lowercase alphanumeric terms.
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Sparse keyword-overlap score in `0.0..=1.0`: the fraction of distinct
/// query terms that appear in the content.
pub fn keyword_overlap(query: &str, content: &str) -> f32 {
    let query_terms: std::collections::HashSet<String> = terms(query).into_iter().collect();
    if query_terms.is_empty() {
        return 0.0;
    }
    let content_terms: std::collections::HashSet<String> = terms(content).into_iter().collect();
    let hits = query_terms
        .iter()
        .filter(|t| content_terms.contains(*t))
        .count();
    hits as f32 / query_terms.len() as f32
}

/// Build an FTS5 MATCH expression from free-form query text.
///
/// Each term is double-quoted so user punctuation cannot produce FTS5
/// syntax errors. Returns `None` for queries with no indexable terms.
pub fn fts_match_query(query: &str) -> Option<String> {
    let terms = terms(query);
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

/// Combine dense and sparse scores into the hybrid rank.
///
/// Negative cosine values are clamped to zero so an anti-correlated
/// embedding cannot drag a strong keyword match below unrelated chunks.
pub fn combine(dense: f32, sparse: f32, dense_weight: f32, sparse_weight: f32) -> f32 {
    dense_weight * dense.max(0.0) + sparse_weight * sparse
}
