// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with vector BLOB storage and FTS5 keyword
//! candidates.
//!
//! The store exclusively owns chunk persistence. Every operation is scoped
//! to a `(owner_id, companion_id)` namespace, and every search result is
//! re-verified against the requested namespace before it leaves this
//! module. Writes within one namespace are serialized to preserve chunk
//! ordering; writes to different namespaces proceed in parallel up to the
//! single-writer connection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use keepsake_core::types::{blob_to_vec, cosine_similarity, vec_to_blob};
use keepsake_core::{
    ChunkDraft, ChunkStatus, KeepsakeError, MemoryChunk, MemoryType, Namespace, PrivacyLevel,
    RetentionClass, ScoredChunk, SearchFilters, SourceType,
};
use keepsake_storage::{Database, map_tr_err};
use metrics::counter;
use tracing::{debug, error, info, warn};

use crate::search::{combine, fts_match_query, keyword_overlap};

/// Result of a retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionOutcome {
    /// Short-term chunks hard-deleted because their age exceeded the TTL.
    pub expired_short_term: u64,
    /// Tombstoned chunks purged as a backstop for async purges.
    pub purged_tombstones: u64,
}

/// Persistent, namespace-isolated store for memory chunks.
pub struct MemoryStore {
    db: Database,
    dimensions: usize,
    max_content_chars: usize,
    dense_weight: f32,
    sparse_weight: f32,
    max_candidates: usize,
    /// Per-namespace write locks preserving chunk-ordering invariants.
    namespace_locks: DashMap<Namespace, Arc<tokio::sync::Mutex<()>>>,
}

impl MemoryStore {
    /// Creates a store over an opened database.
    pub fn new(db: Database, config: &keepsake_config::KeepsakeConfig) -> Self {
        Self {
            db,
            dimensions: config.embedding.dimensions,
            max_content_chars: config.chunker.max_chunk_chars,
            dense_weight: config.search.dense_weight,
            sparse_weight: config.search.sparse_weight,
            max_candidates: config.search.max_candidates,
            namespace_locks: DashMap::new(),
        }
    }

    /// Embedding dimensionality enforced on every write.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn namespace_lock(&self, namespace: &Namespace) -> Arc<tokio::sync::Mutex<()>> {
        self.namespace_locks
            .entry(namespace.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn validate_draft(&self, draft: &ChunkDraft) -> Result<(), KeepsakeError> {
        if !draft.namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }
        if draft.content.trim().is_empty() {
            return Err(KeepsakeError::Validation("content must be non-empty".into()));
        }
        if draft.content.chars().count() > self.max_content_chars {
            return Err(KeepsakeError::Validation(format!(
                "content exceeds {} character limit",
                self.max_content_chars
            )));
        }
        if draft.embedding.len() != self.dimensions {
            return Err(KeepsakeError::Validation(format!(
                "embedding dimension {} does not match deployment dimension {}",
                draft.embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }

    /// Persist a chunk and index it for vector and keyword search.
    ///
    /// The idempotency token makes retried writes safe: a second write
    /// with the same token stores nothing and returns the original chunk
    /// id. Content and embedding are immutable once written.
    pub async fn write(
        &self,
        draft: ChunkDraft,
        idempotency_token: &str,
    ) -> Result<String, KeepsakeError> {
        self.validate_draft(&draft)?;
        if idempotency_token.is_empty() {
            return Err(KeepsakeError::Validation(
                "idempotency token must be non-empty".into(),
            ));
        }

        let lock = self.namespace_lock(&draft.namespace);
        let _guard = lock.lock().await;

        let id = uuid::Uuid::new_v4().to_string();
        let content_hash = keepsake_core::types::content_hash(&draft.content);
        let embedding_blob = vec_to_blob(&draft.embedding);
        let token = idempotency_token.to_string();
        let namespace = draft.namespace.clone();
        let log_namespace = draft.namespace.clone();

        let (stored_id, inserted) = self
            .db
            .connection()
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO chunks (id, owner_id, companion_id, content, embedding,
                        memory_type, source_type, status, retention_class, privacy_level,
                        content_hash, idempotency_token)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active', ?8, ?9, ?10, ?11)
                     ON CONFLICT(idempotency_token) DO NOTHING",
                    rusqlite::params![
                        id,
                        namespace.owner_id,
                        namespace.companion_id,
                        draft.content,
                        embedding_blob,
                        draft.memory_type.as_str(),
                        draft.source_type.as_str(),
                        draft.retention_class.as_str(),
                        draft.privacy_level.as_str(),
                        content_hash,
                        token,
                    ],
                )?;
                let stored_id: String = conn.query_row(
                    "SELECT id FROM chunks WHERE idempotency_token = ?1",
                    rusqlite::params![token],
                    |row| row.get(0),
                )?;
                Ok((stored_id, inserted > 0))
            })
            .await
            .map_err(map_tr_err)?;

        if inserted {
            counter!("keepsake_chunks_written_total").increment(1);
            debug!(namespace = %log_namespace, chunk_id = %stored_id, "chunk written");
        } else {
            counter!("keepsake_chunks_deduplicated_total").increment(1);
            debug!(
                namespace = %log_namespace,
                chunk_id = %stored_id,
                "idempotent write, chunk already stored"
            );
        }
        Ok(stored_id)
    }

    /// Get one chunk by id, scoped to its namespace.
    pub async fn get(
        &self,
        namespace: &Namespace,
        id: &str,
    ) -> Result<Option<MemoryChunk>, KeepsakeError> {
        let id = id.to_string();
        let ns = namespace.clone();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CHUNK_COLUMNS} FROM chunks
                     WHERE id = ?1 AND owner_id = ?2 AND companion_id = ?3",
                ))?;
                let result = stmt.query_row(
                    rusqlite::params![id, ns.owner_id, ns.companion_id],
                    row_to_chunk,
                );
                match result {
                    Ok(chunk) => Ok(Some(chunk)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Hybrid search: dense cosine similarity fused with sparse keyword
    /// overlap by weighted sum, ties broken by recency.
    ///
    /// Never returns chunks outside the requested namespace. This is
    /// verified on every result row, not assumed by construction; a
    /// mismatch fails the whole request with a security error.
    pub async fn search(
        &self,
        namespace: &Namespace,
        query_text: &str,
        query_embedding: &[f32],
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<ScoredChunk>, KeepsakeError> {
        if !namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }
        if query_embedding.len() != self.dimensions {
            return Err(KeepsakeError::Validation(format!(
                "query embedding dimension {} does not match deployment dimension {}",
                query_embedding.len(),
                self.dimensions
            )));
        }
        counter!("keepsake_search_total").increment(1);

        // Dense pass: cosine against every active embedding in the namespace.
        let dense = self.dense_scores(namespace, query_embedding, filters).await?;
        let mut dense_top: Vec<(&String, &f32)> = dense.iter().collect();
        dense_top.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        let mut candidate_ids: HashSet<String> = dense_top
            .iter()
            .take(self.max_candidates)
            .map(|(id, _)| (*id).clone())
            .collect();

        // Sparse pass: FTS5 keyword candidates within the namespace.
        candidate_ids.extend(self.keyword_candidates(namespace, query_text, filters).await?);

        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = candidate_ids.into_iter().collect();
        let chunks = self.get_active_by_ids(&ids).await?;

        let mut scored: Vec<ScoredChunk> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.owner_id != namespace.owner_id || chunk.companion_id != namespace.companion_id
            {
                error!(
                    audit = true,
                    requested = %namespace,
                    returned = %chunk.namespace(),
                    chunk_id = %chunk.id,
                    "namespace mismatch in search result set"
                );
                counter!("keepsake_security_invariant_violations_total").increment(1);
                return Err(KeepsakeError::SecurityInvariant(format!(
                    "search result {} belongs to {}, requested {}",
                    chunk.id,
                    chunk.namespace(),
                    namespace
                )));
            }
            let dense_score = dense.get(&chunk.id).copied().unwrap_or(0.0);
            let sparse_score = keyword_overlap(query_text, &chunk.content);
            let score = combine(dense_score, sparse_score, self.dense_weight, self.sparse_weight);
            scored.push(ScoredChunk { chunk, score });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.chunk.created_at.cmp(&a.chunk.created_at))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Cosine similarity for every active chunk in the namespace.
    async fn dense_scores(
        &self,
        namespace: &Namespace,
        query_embedding: &[f32],
        filters: &SearchFilters,
    ) -> Result<HashMap<String, f32>, KeepsakeError> {
        let (filter_sql, filter_params) = filter_clause(filters, 3);
        let ns = namespace.clone();
        let rows: Vec<(String, Vec<u8>)> = self
            .db
            .connection()
            .call(move |conn| {
                let sql = format!(
                    "SELECT id, embedding FROM chunks
                     WHERE owner_id = ?1 AND companion_id = ?2 AND status = 'active'{filter_sql}"
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut params: Vec<String> = vec![ns.owner_id, ns.companion_id];
                params.extend(filter_params);
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        let mut scores = HashMap::with_capacity(rows.len());
        for (id, blob) in rows {
            let embedding = blob_to_vec(&blob);
            if embedding.len() != query_embedding.len() {
                warn!(chunk_id = %id, "stored embedding has unexpected dimension, skipping");
                continue;
            }
            scores.insert(id, cosine_similarity(query_embedding, &embedding));
        }
        Ok(scores)
    }

    /// FTS5 keyword candidates within the namespace, best matches first.
    async fn keyword_candidates(
        &self,
        namespace: &Namespace,
        query_text: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<String>, KeepsakeError> {
        let Some(match_query) = fts_match_query(query_text) else {
            return Ok(Vec::new());
        };
        let (filter_sql, filter_params) = filter_clause_prefixed(filters, "c.", 4);
        let ns = namespace.clone();
        let limit = self.max_candidates;
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!(
                    "SELECT c.id FROM chunks_fts
                     JOIN chunks c ON c.rowid = chunks_fts.rowid
                     WHERE chunks_fts MATCH ?1
                       AND c.owner_id = ?2 AND c.companion_id = ?3
                       AND c.status = 'active'{filter_sql}
                     ORDER BY bm25(chunks_fts) LIMIT {limit}"
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut params: Vec<String> =
                    vec![match_query, ns.owner_id, ns.companion_id];
                params.extend(filter_params);
                let ids = stmt
                    .query_map(rusqlite::params_from_iter(params.iter()), |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(ids)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Fetch active chunks by id.
    async fn get_active_by_ids(&self, ids: &[String]) -> Result<Vec<MemoryChunk>, KeepsakeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        self.db
            .connection()
            .call(move |conn| {
                let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
                let sql = format!(
                    "SELECT {CHUNK_COLUMNS} FROM chunks
                     WHERE id IN ({}) AND status = 'active'",
                    placeholders.join(", ")
                );
                let mut stmt = conn.prepare(&sql)?;
                let chunks = stmt
                    .query_map(rusqlite::params_from_iter(ids.iter()), row_to_chunk)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(chunks)
            })
            .await
            .map_err(map_tr_err)
    }

    /// All active chunks in a namespace in write order. Used by export and
    /// profile analysis.
    pub async fn list_active(&self, namespace: &Namespace) -> Result<Vec<MemoryChunk>, KeepsakeError> {
        let ns = namespace.clone();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CHUNK_COLUMNS} FROM chunks
                     WHERE owner_id = ?1 AND companion_id = ?2 AND status = 'active'
                     ORDER BY created_at ASC, rowid ASC"
                ))?;
                let chunks = stmt
                    .query_map(
                        rusqlite::params![ns.owner_id, ns.companion_id],
                        row_to_chunk,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(chunks)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Active chunk count in a namespace.
    pub async fn count_active(&self, namespace: &Namespace) -> Result<u64, KeepsakeError> {
        let ns = namespace.clone();
        self.db
            .connection()
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM chunks
                     WHERE owner_id = ?1 AND companion_id = ?2 AND status = 'active'",
                    rusqlite::params![ns.owner_id, ns.companion_id],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of distinct memory types among active chunks. Feeds the
    /// profile diversity requirement.
    pub async fn distinct_memory_types(&self, namespace: &Namespace) -> Result<usize, KeepsakeError> {
        let ns = namespace.clone();
        self.db
            .connection()
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(DISTINCT memory_type) FROM chunks
                     WHERE owner_id = ?1 AND companion_id = ?2 AND status = 'active'",
                    rusqlite::params![ns.owner_id, ns.companion_id],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Contents of active chunks after the first `offset` in write order.
    /// Lets profile updates analyze only new evidence.
    pub async fn contents_after(
        &self,
        namespace: &Namespace,
        offset: u64,
    ) -> Result<Vec<(String, MemoryType)>, KeepsakeError> {
        let ns = namespace.clone();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT content, memory_type FROM chunks
                     WHERE owner_id = ?1 AND companion_id = ?2 AND status = 'active'
                     ORDER BY created_at ASC, rowid ASC
                     LIMIT -1 OFFSET ?3",
                )?;
                let rows = stmt
                    .query_map(
                        rusqlite::params![ns.owner_id, ns.companion_id, offset as i64],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                MemoryType::from_str_value(&row.get::<_, String>(1)?),
                            ))
                        },
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Hard-delete every chunk in a namespace, returning the count for
    /// audit purposes.
    ///
    /// Two-phase: one atomic status flip makes all chunks invisible to
    /// `search`, then the underlying rows are purged asynchronously. A
    /// concurrent search sees either the full pre-deletion set or nothing.
    pub async fn delete_namespace(&self, namespace: &Namespace) -> Result<u64, KeepsakeError> {
        if !namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }
        let lock = self.namespace_lock(namespace);
        let _guard = lock.lock().await;

        let ns = namespace.clone();
        let tombstoned = self
            .db
            .connection()
            .call(move |conn| {
                let flipped = conn.execute(
                    "UPDATE chunks SET status = 'tombstoned'
                     WHERE owner_id = ?1 AND companion_id = ?2 AND status = 'active'",
                    rusqlite::params![ns.owner_id, ns.companion_id],
                )?;
                Ok(flipped as u64)
            })
            .await
            .map_err(map_tr_err)?;

        counter!("keepsake_namespace_deleted_chunks_total").increment(tombstoned);
        info!(namespace = %namespace, tombstoned, "namespace tombstoned, purging");

        // Purge off the caller's path; the retention sweep re-purges any
        // tombstones left behind by a crashed task.
        let db = self.db.clone();
        let ns = namespace.clone();
        tokio::spawn(async move {
            let result = db
                .connection()
                .call(move |conn| -> Result<usize, rusqlite::Error> {
                    let purged = conn.execute(
                        "DELETE FROM chunks
                         WHERE owner_id = ?1 AND companion_id = ?2 AND status = 'tombstoned'",
                        rusqlite::params![ns.owner_id, ns.companion_id],
                    )?;
                    Ok(purged)
                })
                .await;
            if let Err(e) = result {
                warn!(error = %e, "async tombstone purge failed, retention sweep will retry");
            }
        });

        Ok(tombstoned)
    }

    /// Periodic sweep: hard-delete expired short-term chunks and purge
    /// leftover tombstones.
    ///
    /// `cutoff` is an ISO-8601 timestamp; short-term chunks created before
    /// it are removed. Namespaces in `exempt` (those with a pending
    /// export) are skipped this round. Mid- and long-term chunks are
    /// never touched.
    pub async fn apply_retention(
        &self,
        cutoff: &str,
        exempt: &[Namespace],
    ) -> Result<RetentionOutcome, KeepsakeError> {
        let cutoff = cutoff.to_string();
        let exempt: Vec<(String, String)> = exempt
            .iter()
            .map(|ns| (ns.owner_id.clone(), ns.companion_id.clone()))
            .collect();
        let outcome = self
            .db
            .connection()
            .call(move |conn| {
                let mut exempt_sql = String::new();
                let mut params: Vec<String> = vec![cutoff.clone()];
                for (owner, companion) in &exempt {
                    let a = params.len() + 1;
                    let b = params.len() + 2;
                    exempt_sql
                        .push_str(&format!(" AND NOT (owner_id = ?{a} AND companion_id = ?{b})"));
                    params.push(owner.clone());
                    params.push(companion.clone());
                }
                let expired = conn.execute(
                    &format!(
                        "DELETE FROM chunks
                         WHERE retention_class = 'short_term' AND created_at < ?1{exempt_sql}"
                    ),
                    rusqlite::params_from_iter(params.iter()),
                )?;
                let purged = conn.execute("DELETE FROM chunks WHERE status = 'tombstoned'", [])?;
                Ok(RetentionOutcome {
                    expired_short_term: expired as u64,
                    purged_tombstones: purged as u64,
                })
            })
            .await
            .map_err(map_tr_err)?;

        counter!("keepsake_retention_purged_total").increment(outcome.expired_short_term);
        if outcome.expired_short_term > 0 || outcome.purged_tombstones > 0 {
            info!(
                expired = outcome.expired_short_term,
                purged = outcome.purged_tombstones,
                "retention sweep complete"
            );
        }
        Ok(outcome)
    }
}

const CHUNK_COLUMNS: &str = "id, owner_id, companion_id, content, embedding, memory_type, \
     source_type, status, retention_class, privacy_level, content_hash, created_at";

/// Convert a rusqlite row (in `CHUNK_COLUMNS` order) to a MemoryChunk.
fn row_to_chunk(row: &rusqlite::Row) -> Result<MemoryChunk, rusqlite::Error> {
    let embedding_blob: Vec<u8> = row.get(4)?;
    Ok(MemoryChunk {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        companion_id: row.get(2)?,
        content: row.get(3)?,
        embedding: blob_to_vec(&embedding_blob),
        memory_type: MemoryType::from_str_value(&row.get::<_, String>(5)?),
        source_type: SourceType::from_str_value(&row.get::<_, String>(6)?),
        status: ChunkStatus::from_str_value(&row.get::<_, String>(7)?),
        retention_class: RetentionClass::from_str_value(&row.get::<_, String>(8)?),
        privacy_level: PrivacyLevel::from_str_value(&row.get::<_, String>(9)?),
        content_hash: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Build an optional metadata filter clause starting at parameter `start`.
fn filter_clause(filters: &SearchFilters, start: usize) -> (String, Vec<String>) {
    filter_clause_prefixed(filters, "", start)
}

fn filter_clause_prefixed(
    filters: &SearchFilters,
    prefix: &str,
    start: usize,
) -> (String, Vec<String>) {
    let mut sql = String::new();
    let mut params = Vec::new();
    if let Some(memory_type) = filters.memory_type {
        sql.push_str(&format!(" AND {prefix}memory_type = ?{}", start + params.len()));
        params.push(memory_type.as_str().to_string());
    }
    if let Some(source_type) = filters.source_type {
        sql.push_str(&format!(" AND {prefix}source_type = ?{}", start + params.len()));
        params.push(source_type.as_str().to_string());
    }
    (sql, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_config::KeepsakeConfig;

    const DIMS: usize = 4;

    fn test_config() -> KeepsakeConfig {
        let mut config = KeepsakeConfig::default();
        config.embedding.dimensions = DIMS;
        config
    }

    async fn setup_store() -> MemoryStore {
        let db = Database::open_in_memory().await.unwrap();
        MemoryStore::new(db, &test_config())
    }

    fn draft(ns: &Namespace, content: &str, embedding: Vec<f32>) -> ChunkDraft {
        ChunkDraft {
            namespace: ns.clone(),
            content: content.to_string(),
            embedding,
            memory_type: MemoryType::Factual,
            source_type: SourceType::Text,
            retention_class: RetentionClass::LongTerm,
            privacy_level: PrivacyLevel::Private,
        }
    }

    fn unit(dim: usize) -> Vec<f32> {
        let mut v = vec![0.0; DIMS];
        v[dim] = 1.0;
        v
    }

    #[tokio::test]
    async fn write_and_get_roundtrip() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        let id = store
            .write(draft(&ns, "she loves rainy evenings", unit(0)), "tok-1")
            .await
            .unwrap();

        let chunk = store.get(&ns, &id).await.unwrap().unwrap();
        assert_eq!(chunk.content, "she loves rainy evenings");
        assert_eq!(chunk.embedding, unit(0));
        assert_eq!(chunk.status, ChunkStatus::Active);
        assert!(!chunk.content_hash.is_empty());
        assert!(!chunk.created_at.is_empty());
    }

    #[tokio::test]
    async fn write_rejects_wrong_dimension() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");
        let result = store
            .write(draft(&ns, "bad embedding", vec![0.1; DIMS + 1]), "tok-1")
            .await;
        assert!(matches!(result, Err(KeepsakeError::Validation(_))));
    }

    #[tokio::test]
    async fn write_rejects_invalid_namespace_and_content() {
        let store = setup_store().await;

        let bad_ns = Namespace::new("", "c1");
        let result = store.write(draft(&bad_ns, "content", unit(0)), "tok-1").await;
        assert!(matches!(result, Err(KeepsakeError::Validation(_))));

        let ns = Namespace::new("u1", "c1");
        let result = store.write(draft(&ns, "   ", unit(0)), "tok-2").await;
        assert!(matches!(result, Err(KeepsakeError::Validation(_))));

        let result = store.write(draft(&ns, "content", unit(0)), "").await;
        assert!(matches!(result, Err(KeepsakeError::Validation(_))));
    }

    #[tokio::test]
    async fn idempotent_write_stores_one_chunk() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        let first = store
            .write(draft(&ns, "her favorite color is teal", unit(1)), "tok-same")
            .await
            .unwrap();
        let second = store
            .write(draft(&ns, "her favorite color is teal", unit(1)), "tok-same")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count_active(&ns).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_never_crosses_namespaces() {
        let store = setup_store().await;
        let ns_a = Namespace::new("userA", "X");
        let ns_b = Namespace::new("userB", "X");

        store
            .write(draft(&ns_a, "she loves rainy evenings", unit(0)), "tok-a")
            .await
            .unwrap();

        let results = store
            .search(&ns_b, "rainy evenings", &unit(0), 10, &SearchFilters::default())
            .await
            .unwrap();
        assert!(results.is_empty(), "namespace B must never see A's chunks");

        let results = store
            .search(&ns_a, "rainy evenings", &unit(0), 10, &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn basic_recall_ranks_keyword_match_first() {
        let store = setup_store().await;
        let ns = Namespace::new("U1", "C1");

        store
            .write(draft(&ns, "she loves rainy evenings", unit(0)), "t1")
            .await
            .unwrap();
        store
            .write(draft(&ns, "her favorite color is teal", unit(1)), "t2")
            .await
            .unwrap();
        store
            .write(draft(&ns, "we met in Goa in 2019", unit(2)), "t3")
            .await
            .unwrap();

        // Query embedding points at the teal chunk's direction.
        let results = store
            .search(
                &ns,
                "what is her favorite color",
                &unit(1),
                10,
                &SearchFilters::default(),
            )
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert!(results[0].chunk.content.contains("teal"));
        assert!(results[0].score > results.last().unwrap().score);
    }

    #[tokio::test]
    async fn sparse_signal_alone_still_ranks() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        store
            .write(draft(&ns, "her favorite color is teal", unit(1)), "t1")
            .await
            .unwrap();
        store
            .write(draft(&ns, "we met in Goa in 2019", unit(2)), "t2")
            .await
            .unwrap();

        // Orthogonal query embedding: dense contributes nothing.
        let results = store
            .search(
                &ns,
                "favorite color",
                &unit(3),
                10,
                &SearchFilters::default(),
            )
            .await
            .unwrap();

        assert_eq!(results[0].chunk.content, "her favorite color is teal");
    }

    #[tokio::test]
    async fn equal_scores_tie_break_by_recency() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        let old_id = store
            .write(draft(&ns, "alpha beta", unit(0)), "t1")
            .await
            .unwrap();
        let new_id = store
            .write(draft(&ns, "alpha beta", unit(0)), "t2")
            .await
            .unwrap();

        // Force distinct, ordered timestamps.
        let (old, new) = (old_id.clone(), new_id.clone());
        store
            .db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE chunks SET created_at = '2026-01-01T00:00:00.000Z' WHERE id = ?1",
                    rusqlite::params![old],
                )?;
                conn.execute(
                    "UPDATE chunks SET created_at = '2026-02-01T00:00:00.000Z' WHERE id = ?1",
                    rusqlite::params![new],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let results = store
            .search(&ns, "alpha beta", &unit(0), 10, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!((results[0].score - results[1].score).abs() < f32::EPSILON);
        assert_eq!(results[0].chunk.id, new_id, "newer chunk wins the tie");
    }

    #[tokio::test]
    async fn memory_type_filter_applies() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        let mut emotional = draft(&ns, "that goodbye broke her heart", unit(0));
        emotional.memory_type = MemoryType::Emotional;
        store.write(emotional, "t1").await.unwrap();
        store
            .write(draft(&ns, "her heart rate is 62 bpm", unit(0)), "t2")
            .await
            .unwrap();

        let filters = SearchFilters {
            memory_type: Some(MemoryType::Emotional),
            source_type: None,
        };
        let results = store
            .search(&ns, "heart", &unit(0), 10, &filters)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.memory_type, MemoryType::Emotional);
    }

    #[tokio::test]
    async fn delete_namespace_counts_and_hides_everything() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");
        let other = Namespace::new("u2", "c1");

        for i in 0..3 {
            store
                .write(draft(&ns, &format!("memory number {i}"), unit(0)), &format!("t{i}"))
                .await
                .unwrap();
        }
        store
            .write(draft(&other, "untouched memory", unit(0)), "other")
            .await
            .unwrap();

        let deleted = store.delete_namespace(&ns).await.unwrap();
        assert_eq!(deleted, 3);

        let results = store
            .search(&ns, "memory", &unit(0), 10, &SearchFilters::default())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(store.count_active(&other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deletion_is_atomic_for_concurrent_search() {
        let store = Arc::new(setup_store().await);
        let ns = Namespace::new("U1", "C1");

        for i in 0..3 {
            store
                .write(draft(&ns, &format!("shared memory {i}"), unit(0)), &format!("t{i}"))
                .await
                .unwrap();
        }

        let search_store = store.clone();
        let search_ns = ns.clone();
        let searcher = tokio::spawn(async move {
            search_store
                .search(
                    &search_ns,
                    "shared memory",
                    &unit(0),
                    10,
                    &SearchFilters::default(),
                )
                .await
                .unwrap()
        });
        let delete_store = store.clone();
        let delete_ns = ns.clone();
        let deleter =
            tokio::spawn(async move { delete_store.delete_namespace(&delete_ns).await.unwrap() });

        let results = searcher.await.unwrap();
        let deleted = deleter.await.unwrap();

        assert_eq!(deleted, 3);
        assert!(
            results.len() == 3 || results.is_empty(),
            "search must see the full pre-deletion set or nothing, saw {}",
            results.len()
        );
    }

    #[tokio::test]
    async fn retention_expires_only_old_short_term() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        let mut short = draft(&ns, "ephemeral chat line", unit(0));
        short.retention_class = RetentionClass::ShortTerm;
        let short_id = store.write(short, "t1").await.unwrap();

        let mut mid = draft(&ns, "mid-term memory", unit(1));
        mid.retention_class = RetentionClass::MidTerm;
        let mid_id = store.write(mid, "t2").await.unwrap();

        let long_id = store
            .write(draft(&ns, "long-term memory", unit(2)), "t3")
            .await
            .unwrap();

        // Age all three chunks past the cutoff.
        store
            .db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE chunks SET created_at = '2020-01-01T00:00:00.000Z'",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let outcome = store
            .apply_retention("2025-01-01T00:00:00.000Z", &[])
            .await
            .unwrap();

        assert_eq!(outcome.expired_short_term, 1);
        assert!(store.get(&ns, &short_id).await.unwrap().is_none());
        assert!(store.get(&ns, &mid_id).await.unwrap().is_some());
        assert!(store.get(&ns, &long_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn retention_skips_exempt_namespaces() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        let mut short = draft(&ns, "protected by pending export", unit(0));
        short.retention_class = RetentionClass::ShortTerm;
        let id = store.write(short, "t1").await.unwrap();
        store
            .db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE chunks SET created_at = '2020-01-01T00:00:00.000Z'",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let outcome = store
            .apply_retention("2025-01-01T00:00:00.000Z", std::slice::from_ref(&ns))
            .await
            .unwrap();

        assert_eq!(outcome.expired_short_term, 0);
        assert!(store.get(&ns, &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn contents_after_skips_analyzed_prefix() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        for i in 0..5 {
            store
                .write(draft(&ns, &format!("memory {i}"), unit(0)), &format!("t{i}"))
                .await
                .unwrap();
        }

        let tail = store.contents_after(&ns, 3).await.unwrap();
        assert_eq!(tail.len(), 2);
    }

    #[tokio::test]
    async fn list_active_preserves_write_order() {
        let store = setup_store().await;
        let ns = Namespace::new("u1", "c1");

        for i in 0..4 {
            store
                .write(draft(&ns, &format!("entry {i}"), unit(0)), &format!("t{i}"))
                .await
                .unwrap();
        }

        let chunks = store.list_active(&ns).await.unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["entry 0", "entry 1", "entry 2", "entry 3"]);
    }
}
