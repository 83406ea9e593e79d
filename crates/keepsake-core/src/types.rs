// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Keepsake workspace.
//!
//! Timestamps are ISO-8601 UTC strings throughout, matching the SQLite
//! storage format (`strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`). ISO-8601
//! sorts lexicographically, so recency comparisons work on the raw strings.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The `(owner_id, companion_id)` pair that strictly isolates one user's
/// one companion's memories. Every read and write is scoped to a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub owner_id: String,
    pub companion_id: String,
}

impl Namespace {
    pub fn new(owner_id: impl Into<String>, companion_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            companion_id: companion_id.into(),
        }
    }

    /// Both components must be non-empty for a namespace to be addressable.
    pub fn is_valid(&self) -> bool {
        !self.owner_id.is_empty() && !self.companion_id.is_empty()
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.companion_id)
    }
}

/// Category of a memory, used for retrieval boosts and trait diversity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Emotional,
    Factual,
    Conversational,
    Experiential,
}

impl MemoryType {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Emotional => "emotional",
            MemoryType::Factual => "factual",
            MemoryType::Conversational => "conversational",
            MemoryType::Experiential => "experiential",
        }
    }

    /// Parse from SQLite string. Unknown values fall back to factual.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "emotional" => MemoryType::Emotional,
            "conversational" => MemoryType::Conversational,
            "experiential" => MemoryType::Experiential,
            _ => MemoryType::Factual,
        }
    }
}

/// Origin of an uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Text,
    Voice,
    Photo,
    Chat,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Text => "text",
            SourceType::Voice => "voice",
            SourceType::Photo => "photo",
            SourceType::Chat => "chat",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "voice" => SourceType::Voice,
            "photo" => SourceType::Photo,
            "chat" => SourceType::Chat,
            _ => SourceType::Text,
        }
    }
}

/// Lifecycle status of a stored chunk.
///
/// `Tombstoned` chunks are invisible to search and awaiting purge; the
/// two-phase namespace deletion flips status first, then purges rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Active,
    Tombstoned,
}

impl ChunkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStatus::Active => "active",
            ChunkStatus::Tombstoned => "tombstoned",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "tombstoned" => ChunkStatus::Tombstoned,
            _ => ChunkStatus::Active,
        }
    }
}

/// Policy tag controlling how long a chunk survives before automatic deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionClass {
    ShortTerm,
    MidTerm,
    LongTerm,
}

impl RetentionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionClass::ShortTerm => "short_term",
            RetentionClass::MidTerm => "mid_term",
            RetentionClass::LongTerm => "long_term",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "short_term" => RetentionClass::ShortTerm,
            "mid_term" => RetentionClass::MidTerm,
            _ => RetentionClass::LongTerm,
        }
    }
}

/// Access scope of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    /// Only the owning user can access.
    Private,
    /// The owning companion can access.
    Companion,
    /// May be shared with the owner's other companions.
    Shared,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::Private => "private",
            PrivacyLevel::Companion => "companion",
            PrivacyLevel::Shared => "shared",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "companion" => PrivacyLevel::Companion,
            "shared" => PrivacyLevel::Shared,
            _ => PrivacyLevel::Private,
        }
    }
}

/// The atomic retrievable unit: normalized memory text plus its embedding
/// and metadata.
///
/// Content and embedding are immutable once written. Re-embedding means
/// writing a new chunk and tombstoning the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryChunk {
    pub id: String,
    pub owner_id: String,
    pub companion_id: String,
    pub content: String,
    /// Embedding vector; dimensionality is fixed per deployment.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub memory_type: MemoryType,
    pub source_type: SourceType,
    pub status: ChunkStatus,
    pub retention_class: RetentionClass,
    pub privacy_level: PrivacyLevel,
    /// SHA-256 of the content, hex-encoded. Used for dedup diagnostics.
    pub content_hash: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

impl MemoryChunk {
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.owner_id.clone(), self.companion_id.clone())
    }
}

/// Input for a chunk write: everything the caller decides. The store
/// assigns the id, content hash, and creation timestamp.
#[derive(Debug, Clone)]
pub struct ChunkDraft {
    pub namespace: Namespace,
    pub content: String,
    pub embedding: Vec<f32>,
    pub memory_type: MemoryType,
    pub source_type: SourceType,
    pub retention_class: RetentionClass,
    pub privacy_level: PrivacyLevel,
}

/// A chunk with its combined retrieval score from hybrid search.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: MemoryChunk,
    /// Weighted sum of dense cosine similarity and sparse keyword overlap.
    pub score: f32,
}

/// Optional metadata filters applied inside the namespace during search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub memory_type: Option<MemoryType>,
    pub source_type: Option<SourceType>,
}

/// Output of the Normalizer: plain text plus source metadata.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub text: String,
    pub source_type: SourceType,
    /// True when the raw bytes were not valid UTF-8 and a lossy decode
    /// was applied.
    pub lossy_decoded: bool,
}

/// A chunk candidate produced by the Chunker, before embedding.
///
/// `index` preserves source order; downstream consumers rely on the
/// sequence for conversational-thread reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCandidate {
    pub content: String,
    pub index: usize,
    /// Set when a single oversized sentence was hard-split at a token
    /// boundary.
    pub truncated: bool,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter. Vector order matches input order.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Identifies the type of adapter behind a trait object.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Transcription,
    Caption,
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Compute cosine similarity between two vectors of equal length.
///
/// For L2-normalized vectors this is the dot product; for unnormalized
/// vectors the norms are divided out.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// SHA-256 content hash, hex-encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
