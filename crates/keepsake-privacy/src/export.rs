// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-namespace data export.
//!
//! Produces a serialized bundle of chunks (content and metadata, not raw
//! embeddings), the personalization profile, and upload session history.
//! The namespace is guard-protected for the duration of the export so a
//! concurrent deletion cannot hollow out the bundle mid-read.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use keepsake_core::{KeepsakeError, MemoryChunk, Namespace, PersonalizationProfile, UploadSession};
use keepsake_memory::MemoryStore;
use keepsake_storage::{Database, queries::profiles, queries::sessions};

use crate::guard::ExportGuards;

/// Serialized chunk-plus-profile bundle handed to account management.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportBundle {
    pub exported_at: String,
    pub owner_id: String,
    pub companion_id: String,
    /// Chunks in write order. Embeddings are deployment-internal and
    /// excluded from serialization.
    pub chunks: Vec<MemoryChunk>,
    pub profile: Option<PersonalizationProfile>,
    pub sessions: Vec<UploadSession>,
}

/// Builds export bundles for the account-management collaborator.
pub struct ExportService {
    db: Database,
    store: Arc<MemoryStore>,
    guards: ExportGuards,
}

impl ExportService {
    pub fn new(db: Database, store: Arc<MemoryStore>, guards: ExportGuards) -> Self {
        Self { db, store, guards }
    }

    /// Export everything stored for a namespace.
    pub async fn export_all(&self, namespace: &Namespace) -> Result<ExportBundle, KeepsakeError> {
        if !namespace.is_valid() {
            return Err(KeepsakeError::Validation(
                "owner_id and companion_id must be non-empty".into(),
            ));
        }

        // Guard held for the whole read so deletion cannot interleave.
        let _guard = self.guards.begin(namespace);

        let chunks = self.store.list_active(namespace).await?;
        let profile =
            profiles::get_profile(&self.db, &namespace.owner_id, &namespace.companion_id).await?;
        let sessions = sessions::list_sessions_for_namespace(
            &self.db,
            &namespace.owner_id,
            &namespace.companion_id,
        )
        .await?;

        metrics::counter!("keepsake_exports_total").increment(1);
        info!(namespace = %namespace, chunks = chunks.len(), "namespace exported");

        Ok(ExportBundle {
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            owner_id: namespace.owner_id.clone(),
            companion_id: namespace.companion_id.clone(),
            chunks,
            profile,
            sessions,
        })
    }
}
