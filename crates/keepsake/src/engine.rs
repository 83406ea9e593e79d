// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine facade: the narrow request/response surface the rest of
//! the product calls into.
//!
//! External collaborators never touch the memory store directly. Upload
//! handling calls `submit_artifact`, the chat layer calls `get_context`,
//! and account management calls `export_all` / `delete_all`. Everything
//! else is wiring.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use keepsake_config::KeepsakeConfig;
use keepsake_core::retry::BackoffPolicy;
use keepsake_core::{
    CaptionAdapter, EmbeddingAdapter, KeepsakeError, Namespace, PersonalizationLevel,
    PersonalizationProfile, SourceType, TranscriptionAdapter, UploadSession,
};
use keepsake_embed::BatchEmbedder;
use keepsake_ingest::{ArtifactUpload, Chunker, IngestPipeline, Normalizer};
use keepsake_memory::MemoryStore;
use keepsake_persona::ProfileEngine;
use keepsake_privacy::{DeletionReport, DeletionService, ExportBundle, ExportGuards, ExportService};
use keepsake_retrieval::{ConversationContext, RetrievalOrchestrator};
use keepsake_storage::{Database, queries::profiles, queries::sessions};

/// External collaborators the engine delegates to.
pub struct EngineAdapters {
    pub embedder: Arc<dyn EmbeddingAdapter>,
    pub transcriber: Arc<dyn TranscriptionAdapter>,
    pub captioner: Arc<dyn CaptionAdapter>,
}

/// Result of one retention sweep across chunks and sessions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RetentionReport {
    pub expired_short_term: u64,
    pub purged_tombstones: u64,
    pub sessions_purged: u64,
}

/// Memory Processing & Retrieval Engine.
pub struct MemoryEngine {
    config: KeepsakeConfig,
    db: Database,
    store: Arc<MemoryStore>,
    pipeline: IngestPipeline,
    orchestrator: RetrievalOrchestrator,
    profile_engine: ProfileEngine,
    exports: ExportService,
    deletions: DeletionService,
    guards: ExportGuards,
}

impl MemoryEngine {
    /// Open the configured database and wire all services.
    pub async fn new(
        config: KeepsakeConfig,
        adapters: EngineAdapters,
    ) -> Result<Self, KeepsakeError> {
        let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
        Self::with_database(config, adapters, db)
    }

    /// Wire all services over an already-open database. Used by tests
    /// and embedders that manage the database lifecycle themselves.
    pub fn with_database(
        config: KeepsakeConfig,
        adapters: EngineAdapters,
        db: Database,
    ) -> Result<Self, KeepsakeError> {
        let store = Arc::new(MemoryStore::new(db.clone(), &config));
        let batch_embedder = Arc::new(BatchEmbedder::new(adapters.embedder, &config.embedding));

        let retry_policy = BackoffPolicy {
            max_attempts: config.embedding.retry_attempts,
            base_delay: Duration::from_millis(config.embedding.retry_base_delay_ms),
            factor: 2,
            attempt_timeout: Duration::from_secs(config.embedding.attempt_timeout_secs),
        };
        let normalizer = Normalizer::new(
            adapters.transcriber,
            adapters.captioner,
            config.ingest.max_artifact_bytes,
            retry_policy,
        );
        let chunker = Chunker::new(&config.chunker);
        let pipeline = IngestPipeline::new(
            normalizer,
            chunker,
            batch_embedder.clone(),
            store.clone(),
            db.clone(),
            config.ingest.clone(),
        );

        let orchestrator = RetrievalOrchestrator::new(
            store.clone(),
            batch_embedder,
            db.clone(),
            config.retrieval.clone(),
        );
        let profile_engine = ProfileEngine::new(&config.persona)?;

        let guards = ExportGuards::new();
        let exports = ExportService::new(db.clone(), store.clone(), guards.clone());
        let deletions = DeletionService::new(db.clone(), store.clone(), guards.clone());

        Ok(Self {
            config,
            db,
            store,
            pipeline,
            orchestrator,
            profile_engine,
            exports,
            deletions,
            guards,
        })
    }

    /// Ingest one artifact, returning the upload session id.
    pub async fn submit_artifact(
        &self,
        owner_id: &str,
        companion_id: &str,
        artifact: Vec<u8>,
        declared: SourceType,
        idempotency_token: &str,
    ) -> Result<String, KeepsakeError> {
        let namespace = Namespace::new(owner_id, companion_id);
        let upload = ArtifactUpload {
            file_ref: "artifact".to_string(),
            bytes: artifact,
            declared,
            retention_override: None,
        };
        self.pipeline
            .submit(
                &namespace,
                vec![upload],
                idempotency_token,
                &CancellationToken::new(),
            )
            .await
    }

    /// Ingest a multi-file batch under one session. The cancellation
    /// token stops processing between files; chunks already written are
    /// retained and reflected in the session status.
    pub async fn submit_batch(
        &self,
        owner_id: &str,
        companion_id: &str,
        uploads: Vec<ArtifactUpload>,
        idempotency_token: &str,
        cancel: &CancellationToken,
    ) -> Result<String, KeepsakeError> {
        let namespace = Namespace::new(owner_id, companion_id);
        self.pipeline
            .submit(&namespace, uploads, idempotency_token, cancel)
            .await
    }

    /// Upload session status for audit and ingestion UI detail.
    pub async fn session_status(
        &self,
        session_id: &str,
    ) -> Result<Option<UploadSession>, KeepsakeError> {
        sessions::get_session(&self.db, session_id).await
    }

    /// Sole entry point for the chat layer: bounded conversation context
    /// for one turn.
    pub async fn get_context(
        &self,
        owner_id: &str,
        companion_id: &str,
        live_query: &str,
        max_tokens: usize,
    ) -> Result<ConversationContext, KeepsakeError> {
        let namespace = Namespace::new(owner_id, companion_id);
        self.orchestrator
            .build_context(&namespace, live_query, max_tokens)
            .await
    }

    /// Incrementally fold newly written chunks and fresh interaction
    /// texts into the namespace's profile, persisting the result.
    pub async fn update_profile(
        &self,
        owner_id: &str,
        companion_id: &str,
        new_interactions: &[String],
    ) -> Result<PersonalizationProfile, KeepsakeError> {
        let namespace = Namespace::new(owner_id, companion_id);
        if !namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }

        let mut profile = profiles::get_profile(&self.db, owner_id, companion_id)
            .await?
            .unwrap_or_else(|| PersonalizationProfile::empty(owner_id, companion_id));

        let new_texts: Vec<String> = self
            .store
            .contents_after(&namespace, profile.analyzed_chunks)
            .await?
            .into_iter()
            .map(|(content, _)| content)
            .collect();
        let chunk_count = self.store.count_active(&namespace).await?;
        let distinct_types = self.store.distinct_memory_types(&namespace).await?;

        self.profile_engine.update(
            &mut profile,
            &new_texts,
            new_interactions,
            chunk_count,
            distinct_types,
        );
        profiles::upsert_profile(&self.db, &profile).await?;
        Ok(profile)
    }

    /// Attach or clear a fine-tuned adapter reference. Premium feature.
    pub async fn set_adapter_reference(
        &self,
        owner_id: &str,
        companion_id: &str,
        adapter_reference: Option<String>,
    ) -> Result<(), KeepsakeError> {
        let mut profile = profiles::get_profile(&self.db, owner_id, companion_id)
            .await?
            .ok_or_else(|| {
                KeepsakeError::Validation(format!(
                    "no profile exists for {owner_id}/{companion_id}"
                ))
            })?;
        if profile.personalization_level != PersonalizationLevel::Premium {
            return Err(KeepsakeError::Validation(
                "adapter references require the premium personalization level".into(),
            ));
        }
        profile.adapter_reference = adapter_reference;
        profiles::upsert_profile(&self.db, &profile).await
    }

    /// Export all memories, the profile, and session history for a
    /// namespace.
    pub async fn export_all(
        &self,
        owner_id: &str,
        companion_id: &str,
    ) -> Result<ExportBundle, KeepsakeError> {
        self.exports
            .export_all(&Namespace::new(owner_id, companion_id))
            .await
    }

    /// Hard-delete all data for a namespace.
    pub async fn delete_all(
        &self,
        owner_id: &str,
        companion_id: &str,
    ) -> Result<DeletionReport, KeepsakeError> {
        self.deletions
            .delete_all(&Namespace::new(owner_id, companion_id))
            .await
    }

    /// Periodic retention sweep: expire short-term chunks past TTL,
    /// purge leftover tombstones, and garbage-collect old terminal
    /// upload sessions. Namespaces with a pending export are skipped
    /// this round.
    pub async fn apply_retention(&self) -> Result<RetentionReport, KeepsakeError> {
        let now = Utc::now();
        let chunk_cutoff = (now - chrono::Duration::days(self.config.retention.short_term_ttl_days))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let session_cutoff = (now
            - chrono::Duration::days(self.config.retention.session_retention_days))
        .to_rfc3339_opts(SecondsFormat::Millis, true);

        let exempt = self.guards.active_namespaces();
        let outcome = self.store.apply_retention(&chunk_cutoff, &exempt).await?;
        let sessions_purged = sessions::gc_terminal_sessions(&self.db, &session_cutoff).await?;

        let report = RetentionReport {
            expired_short_term: outcome.expired_short_term,
            purged_tombstones: outcome.purged_tombstones,
            sessions_purged,
        };
        info!(
            expired = report.expired_short_term,
            tombstones = report.purged_tombstones,
            sessions = report.sessions_purged,
            "retention sweep applied"
        );
        Ok(report)
    }

    /// Close the underlying database, flushing outstanding work.
    pub async fn close(self) -> Result<(), KeepsakeError> {
        self.db.close().await
    }
}
