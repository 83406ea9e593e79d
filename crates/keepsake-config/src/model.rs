// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keepsake memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Keepsake configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeepsakeConfig {
    /// Ingestion intake settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Semantic chunking settings.
    #[serde(default)]
    pub chunker: ChunkerConfig,

    /// External embedding service settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Hybrid search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Personalization engine settings.
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Retrieval orchestrator settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Retention and garbage-collection settings.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Ingestion intake configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Maximum artifact size in bytes. Larger uploads are rejected
    /// before any processing.
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: usize,

    /// Default retention class per source type. Chat exports age out
    /// quickly; typed text is kept indefinitely unless overridden.
    #[serde(default = "default_text_retention")]
    pub text_retention: String,

    #[serde(default = "default_chat_retention")]
    pub chat_retention: String,

    #[serde(default = "default_voice_retention")]
    pub voice_retention: String,

    #[serde(default = "default_photo_retention")]
    pub photo_retention: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_artifact_bytes: default_max_artifact_bytes(),
            text_retention: default_text_retention(),
            chat_retention: default_chat_retention(),
            voice_retention: default_voice_retention(),
            photo_retention: default_photo_retention(),
        }
    }
}

fn default_max_artifact_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_text_retention() -> String {
    "long_term".to_string()
}

fn default_chat_retention() -> String {
    "short_term".to_string()
}

fn default_voice_retention() -> String {
    "mid_term".to_string()
}

fn default_photo_retention() -> String {
    "mid_term".to_string()
}

/// Semantic chunking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkerConfig {
    /// Minimum chunk size in token-equivalent units. Chunks are flushed
    /// once they reach at least this size.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,

    /// Maximum chunk size in token-equivalent units. A single sentence
    /// exceeding this is hard-split with a truncation marker.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Maximum chunk content length in characters, validated on write.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_tokens: default_min_tokens(),
            max_tokens: default_max_tokens(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

fn default_min_tokens() -> usize {
    500
}

fn default_max_tokens() -> usize {
    1500
}

fn default_max_chunk_chars() -> usize {
    10_000
}

/// External embedding service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service (OpenAI-compatible shape).
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// API key. `None` requires an environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of the embedding model.
    #[serde(default = "default_embedding_model")]
    pub model_name: String,

    /// Embedding dimensionality, fixed per deployment and validated on
    /// every chunk write.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// Maximum texts per HTTP request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum concurrent in-flight batch requests.
    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,

    /// Retry attempts for a failed service call.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds (doubles per attempt).
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Hard timeout per attempt in seconds.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            api_key: None,
            model_name: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            batch_size: default_batch_size(),
            embed_concurrency: default_embed_concurrency(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embedding_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    16
}

fn default_embed_concurrency() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_attempt_timeout_secs() -> u64 {
    10
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("keepsake").join("keepsake.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("keepsake.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Hybrid search configuration.
///
/// The dense/sparse weights are reasonable defaults, not confirmed
/// product requirements; both are tunable here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Weight of the dense cosine-similarity score.
    #[serde(default = "default_dense_weight")]
    pub dense_weight: f32,

    /// Weight of the sparse keyword-overlap score.
    #[serde(default = "default_sparse_weight")]
    pub sparse_weight: f32,

    /// Maximum candidates pulled from the keyword index before fusion.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dense_weight: default_dense_weight(),
            sparse_weight: default_sparse_weight(),
            max_candidates: default_max_candidates(),
        }
    }
}

fn default_dense_weight() -> f32 {
    0.7
}

fn default_sparse_weight() -> f32 {
    0.3
}

fn default_max_candidates() -> usize {
    50
}

/// Personalization engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaConfig {
    /// Chunk count at which a profile advances from Empty to Seeded.
    #[serde(default = "default_seed_threshold")]
    pub seed_threshold: u64,

    /// Chunk count required for the Enhanced stage.
    #[serde(default = "default_enhance_threshold")]
    pub enhance_threshold: u64,

    /// Distinct memory types required for the Enhanced stage, so one
    /// dimension of evidence cannot overfit the personality.
    #[serde(default = "default_enhance_min_type_diversity")]
    pub enhance_min_type_diversity: usize,

    /// Exponential decay factor blending new evidence into existing
    /// trait weights. Higher values favor recent evidence.
    #[serde(default = "default_decay_alpha")]
    pub decay_alpha: f64,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            seed_threshold: default_seed_threshold(),
            enhance_threshold: default_enhance_threshold(),
            enhance_min_type_diversity: default_enhance_min_type_diversity(),
            decay_alpha: default_decay_alpha(),
        }
    }
}

fn default_seed_threshold() -> u64 {
    20
}

fn default_enhance_threshold() -> u64 {
    100
}

fn default_enhance_min_type_diversity() -> usize {
    3
}

fn default_decay_alpha() -> f64 {
    0.3
}

/// Retrieval orchestrator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Candidate count requested from the memory store per query.
    #[serde(default = "default_search_k")]
    pub search_k: usize,

    /// Ranking multiplier applied to memories tagged emotional.
    /// A reasonable default, flagged for product validation.
    #[serde(default = "default_emotional_boost")]
    pub emotional_boost: f32,

    /// Token budget always reserved for the persona directive so
    /// personality never gets crowded out by memory content.
    #[serde(default = "default_persona_reserved_tokens")]
    pub persona_reserved_tokens: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_k: default_search_k(),
            emotional_boost: default_emotional_boost(),
            persona_reserved_tokens: default_persona_reserved_tokens(),
        }
    }
}

fn default_search_k() -> usize {
    50
}

fn default_emotional_boost() -> f32 {
    1.2
}

fn default_persona_reserved_tokens() -> usize {
    512
}

/// Retention and garbage-collection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Age in days after which short-term chunks are hard-deleted by
    /// the retention sweep. Mid- and long-term chunks are exempt.
    #[serde(default = "default_short_term_ttl_days")]
    pub short_term_ttl_days: i64,

    /// Age in days after which terminal upload sessions are
    /// garbage-collected.
    #[serde(default = "default_session_retention_days")]
    pub session_retention_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            short_term_ttl_days: default_short_term_ttl_days(),
            session_retention_days: default_session_retention_days(),
        }
    }
}

fn default_short_term_ttl_days() -> i64 {
    30
}

fn default_session_retention_days() -> i64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = KeepsakeConfig::default();
        assert_eq!(config.ingest.max_artifact_bytes, 50 * 1024 * 1024);
        assert_eq!(config.chunker.min_tokens, 500);
        assert_eq!(config.chunker.max_tokens, 1500);
        assert_eq!(config.embedding.dimensions, 384);
        assert!((config.search.dense_weight - 0.7).abs() < f32::EPSILON);
        assert!((config.search.sparse_weight - 0.3).abs() < f32::EPSILON);
        assert!((config.retrieval.emotional_boost - 1.2).abs() < f32::EPSILON);
        assert_eq!(config.persona.seed_threshold, 20);
        assert_eq!(config.retention.short_term_ttl_days, 30);
    }

    #[test]
    fn retention_defaults_by_source() {
        let config = IngestConfig::default();
        assert_eq!(config.text_retention, "long_term");
        assert_eq!(config.chat_retention, "short_term");
        assert_eq!(config.voice_retention, "mid_term");
        assert_eq!(config.photo_retention, "mid_term");
    }

    #[test]
    fn config_serde_roundtrip() {
        let config = KeepsakeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: KeepsakeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.embedding.dimensions, config.embedding.dimensions);
        assert_eq!(parsed.retrieval.search_k, config.retrieval.search_k);
    }
}
