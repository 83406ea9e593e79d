// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-namespace deletion.
//!
//! Hard-deletes chunks (via the store's tombstone-then-purge), the
//! personalization profile, and upload session history. A namespace with
//! a pending export is never deleted; the conflict surfaces to the
//! caller with no automatic resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use keepsake_core::{KeepsakeError, Namespace};
use keepsake_memory::MemoryStore;
use keepsake_storage::{Database, queries::profiles, queries::sessions};

use crate::guard::ExportGuards;

/// Confirmation returned to the account-management collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionReport {
    pub owner_id: String,
    pub companion_id: String,
    pub chunks_deleted: u64,
    pub profile_deleted: bool,
    pub sessions_deleted: u64,
}

/// Executes right-to-erasure requests.
pub struct DeletionService {
    db: Database,
    store: Arc<MemoryStore>,
    guards: ExportGuards,
}

impl DeletionService {
    pub fn new(db: Database, store: Arc<MemoryStore>, guards: ExportGuards) -> Self {
        Self { db, store, guards }
    }

    /// Hard-delete everything stored for a namespace.
    pub async fn delete_all(&self, namespace: &Namespace) -> Result<DeletionReport, KeepsakeError> {
        if !namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }
        if self.guards.is_active(namespace) {
            return Err(KeepsakeError::RetentionConflict {
                owner_id: namespace.owner_id.clone(),
                companion_id: namespace.companion_id.clone(),
            });
        }

        let chunks_deleted = self.store.delete_namespace(namespace).await?;
        let profile_deleted =
            profiles::delete_profile(&self.db, &namespace.owner_id, &namespace.companion_id)
                .await?;
        let sessions_deleted = sessions::delete_sessions_for_namespace(
            &self.db,
            &namespace.owner_id,
            &namespace.companion_id,
        )
        .await?;

        metrics::counter!("keepsake_namespace_deletions_total").increment(1);
        info!(
            namespace = %namespace,
            chunks_deleted,
            profile_deleted,
            sessions_deleted,
            "namespace deleted"
        );

        Ok(DeletionReport {
            owner_id: namespace.owner_id.clone(),
            companion_id: namespace.companion_id.clone(),
            chunks_deleted,
            profile_deleted,
            sessions_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_config::KeepsakeConfig;
    use keepsake_core::{
        ChunkDraft, MemoryType, PersonalizationProfile, PrivacyLevel, RetentionClass,
        SearchFilters, SessionStatus, SourceType, UploadSession,
    };

    const DIMS: usize = 4;

    fn test_config() -> KeepsakeConfig {
        let mut config = KeepsakeConfig::default();
        config.embedding.dimensions = DIMS;
        config
    }

    async fn setup() -> (DeletionService, Arc<MemoryStore>, Database, ExportGuards) {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(MemoryStore::new(db.clone(), &test_config()));
        let guards = ExportGuards::new();
        let service = DeletionService::new(db.clone(), store.clone(), guards.clone());
        (service, store, db, guards)
    }

    fn draft(ns: &Namespace, content: &str) -> ChunkDraft {
        ChunkDraft {
            namespace: ns.clone(),
            content: content.to_string(),
            embedding: vec![0.5; DIMS],
            memory_type: MemoryType::Factual,
            source_type: SourceType::Text,
            retention_class: RetentionClass::LongTerm,
            privacy_level: PrivacyLevel::Private,
        }
    }

    #[tokio::test]
    async fn delete_all_removes_every_trace() {
        let (service, store, db, _guards) = setup().await;
        let ns = Namespace::new("u1", "c1");

        store.write(draft(&ns, "memory one"), "t1").await.unwrap();
        store.write(draft(&ns, "memory two"), "t2").await.unwrap();
        profiles::upsert_profile(&db, &PersonalizationProfile::empty("u1", "c1"))
            .await
            .unwrap();
        sessions::create_session(
            &db,
            &UploadSession {
                session_id: "s1".into(),
                owner_id: "u1".into(),
                companion_id: "c1".into(),
                status: SessionStatus::Completed,
                files: vec![],
                total_chunks_created: 2,
                started_at: "2026-03-01T00:00:00.000Z".into(),
                completed_at: None,
            },
        )
        .await
        .unwrap();

        let report = service.delete_all(&ns).await.unwrap();
        assert_eq!(report.chunks_deleted, 2);
        assert!(report.profile_deleted);
        assert_eq!(report.sessions_deleted, 1);

        let results = store
            .search(&ns, "memory", &vec![0.5; DIMS], 10, &SearchFilters::default())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(profiles::get_profile(&db, "u1", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_export_blocks_deletion() {
        let (service, store, _db, guards) = setup().await;
        let ns = Namespace::new("u1", "c1");
        store.write(draft(&ns, "protected memory"), "t1").await.unwrap();

        let guard = guards.begin(&ns);
        let result = service.delete_all(&ns).await;
        assert!(matches!(result, Err(KeepsakeError::RetentionConflict { .. })));

        // Once the export finishes, deletion proceeds.
        drop(guard);
        let report = service.delete_all(&ns).await.unwrap();
        assert_eq!(report.chunks_deleted, 1);
    }

    #[tokio::test]
    async fn deleting_untouched_namespace_reports_zero() {
        let (service, _store, _db, _guards) = setup().await;
        let report = service.delete_all(&Namespace::new("u1", "c1")).await.unwrap();
        assert_eq!(report.chunks_deleted, 0);
        assert!(!report.profile_deleted);
        assert_eq!(report.sessions_deleted, 0);
    }
}
