// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion pipeline: normalize, chunk, embed, and persist one upload
//! batch under an `UploadSession`.
//!
//! Failures are recorded per file and never abort sibling files in the
//! same session. Cancellation is honored between files; chunks already
//! written stay written and the session ends in `Cancelled`. Deleting a
//! cancelled session's partial output is a separate, explicit operation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use keepsake_config::IngestConfig;
use keepsake_core::{
    ChunkDraft, FileStatus, KeepsakeError, Namespace, PrivacyLevel, RetentionClass, SessionStatus,
    SourceType, UploadFileRecord, UploadSession,
};
use keepsake_embed::BatchEmbedder;
use keepsake_memory::MemoryStore;
use keepsake_storage::{Database, queries::sessions};

use crate::chunker::Chunker;
use crate::classify::categorize_memory;
use crate::normalizer::Normalizer;

/// One artifact within an upload batch.
#[derive(Debug, Clone)]
pub struct ArtifactUpload {
    /// Caller-facing file reference, unique within the batch.
    pub file_ref: String,
    pub bytes: Vec<u8>,
    pub declared: SourceType,
    /// Overrides the source-type retention heuristic when set.
    pub retention_override: Option<RetentionClass>,
}

/// Write-path pipeline from raw artifacts to indexed memory chunks.
pub struct IngestPipeline {
    normalizer: Normalizer,
    chunker: Chunker,
    embedder: Arc<BatchEmbedder>,
    store: Arc<MemoryStore>,
    db: Database,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(
        normalizer: Normalizer,
        chunker: Chunker,
        embedder: Arc<BatchEmbedder>,
        store: Arc<MemoryStore>,
        db: Database,
        config: IngestConfig,
    ) -> Self {
        Self {
            normalizer,
            chunker,
            embedder,
            store,
            db,
            config,
        }
    }

    /// Process an upload batch, returning the session id.
    ///
    /// The caller-supplied idempotency token seeds per-chunk tokens, so a
    /// retried submission cannot duplicate chunks.
    pub async fn submit(
        &self,
        namespace: &Namespace,
        uploads: Vec<ArtifactUpload>,
        idempotency_token: &str,
        cancel: &CancellationToken,
    ) -> Result<String, KeepsakeError> {
        if !namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }
        if idempotency_token.is_empty() {
            return Err(KeepsakeError::Validation(
                "idempotency token must be non-empty".into(),
            ));
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let session = UploadSession {
            session_id: session_id.clone(),
            owner_id: namespace.owner_id.clone(),
            companion_id: namespace.companion_id.clone(),
            status: SessionStatus::Pending,
            files: uploads
                .iter()
                .map(|u| UploadFileRecord {
                    file_ref: u.file_ref.clone(),
                    status: FileStatus::Pending,
                    error: None,
                    chunks_created: 0,
                })
                .collect(),
            total_chunks_created: 0,
            started_at: String::new(),
            completed_at: None,
        };
        sessions::create_session(&self.db, &session).await?;
        sessions::set_session_status(&self.db, &session_id, SessionStatus::Processing).await?;
        info!(namespace = %namespace, session_id, files = uploads.len(), "ingestion started");

        let mut completed = 0usize;
        let mut failed = 0usize;
        let mut cancelled = false;

        for upload in &uploads {
            if cancel.is_cancelled() {
                cancelled = true;
                sessions::record_file_result(
                    &self.db,
                    &session_id,
                    &upload.file_ref,
                    FileStatus::Skipped,
                    None,
                    0,
                )
                .await?;
                continue;
            }

            match self.process_file(namespace, upload, idempotency_token).await {
                Ok(chunks) => {
                    completed += 1;
                    sessions::record_file_result(
                        &self.db,
                        &session_id,
                        &upload.file_ref,
                        FileStatus::Completed,
                        None,
                        chunks,
                    )
                    .await?;
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        namespace = %namespace,
                        session_id,
                        file_ref = %upload.file_ref,
                        error = %e,
                        "file ingestion failed, continuing with siblings"
                    );
                    sessions::record_file_result(
                        &self.db,
                        &session_id,
                        &upload.file_ref,
                        FileStatus::Failed,
                        Some(e.to_string()),
                        0,
                    )
                    .await?;
                }
            }
        }

        let final_status = if cancelled {
            SessionStatus::Cancelled
        } else if failed > 0 && completed == 0 && !uploads.is_empty() {
            SessionStatus::Failed
        } else {
            SessionStatus::Completed
        };
        sessions::set_session_status(&self.db, &session_id, final_status).await?;
        metrics::counter!("keepsake_ingest_sessions_total").increment(1);
        info!(
            session_id,
            status = final_status.as_str(),
            completed,
            failed,
            "ingestion finished"
        );
        Ok(session_id)
    }

    /// Normalize, chunk, embed, and write one artifact.
    async fn process_file(
        &self,
        namespace: &Namespace,
        upload: &ArtifactUpload,
        batch_token: &str,
    ) -> Result<u64, KeepsakeError> {
        let normalized = self
            .normalizer
            .normalize(&upload.bytes, upload.declared)
            .await?;
        let candidates = self.chunker.chunk(&normalized.text);
        if candidates.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_many(&texts).await?;

        let retention = upload
            .retention_override
            .unwrap_or_else(|| self.retention_for(upload.declared));

        let mut written = 0u64;
        for (candidate, embedding) in candidates.iter().zip(vectors) {
            let draft = ChunkDraft {
                namespace: namespace.clone(),
                content: candidate.content.clone(),
                embedding,
                memory_type: categorize_memory(&candidate.content, upload.declared),
                source_type: upload.declared,
                retention_class: retention,
                privacy_level: PrivacyLevel::Private,
            };
            let token = format!("{batch_token}:{}:{}", upload.file_ref, candidate.index);
            self.store.write(draft, &token).await?;
            written += 1;
        }
        Ok(written)
    }

    /// Retention class heuristic from the declared source type.
    fn retention_for(&self, source: SourceType) -> RetentionClass {
        let configured = match source {
            SourceType::Text => &self.config.text_retention,
            SourceType::Chat => &self.config.chat_retention,
            SourceType::Voice => &self.config.voice_retention,
            SourceType::Photo => &self.config.photo_retention,
        };
        RetentionClass::from_str_value(configured)
    }
}
