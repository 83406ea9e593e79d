// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-export guards.
//!
//! A namespace with an export in flight is protected from deletion:
//! `delete_all` surfaces a retention conflict and the retention sweep
//! skips the namespace for that round. Guards are reference-counted RAII
//! handles, so overlapping exports of the same namespace compose.

use std::sync::Arc;

use dashmap::DashMap;

use keepsake_core::Namespace;

/// Registry of namespaces with a pending export.
#[derive(Clone, Default)]
pub struct ExportGuards {
    inner: Arc<DashMap<Namespace, u32>>,
}

impl ExportGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a namespace as export-protected until the guard drops.
    pub fn begin(&self, namespace: &Namespace) -> ExportGuard {
        *self.inner.entry(namespace.clone()).or_insert(0) += 1;
        ExportGuard {
            registry: self.inner.clone(),
            namespace: namespace.clone(),
        }
    }

    /// Whether the namespace currently has a pending export.
    pub fn is_active(&self, namespace: &Namespace) -> bool {
        self.inner.get(namespace).is_some_and(|count| *count > 0)
    }

    /// Namespaces currently protected; handed to the retention sweep.
    pub fn active_namespaces(&self) -> Vec<Namespace> {
        self.inner
            .iter()
            .filter(|entry| *entry.value() > 0)
            .map(|entry| entry.key().clone())
            .collect()
    }
}

/// RAII handle releasing the export protection on drop.
pub struct ExportGuard {
    registry: Arc<DashMap<Namespace, u32>>,
    namespace: Namespace,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        let remove = match self.registry.get_mut(&self.namespace) {
            Some(mut count) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        };
        if remove {
            self.registry.remove_if(&self.namespace, |_, count| *count == 0);
        }
    }
}
