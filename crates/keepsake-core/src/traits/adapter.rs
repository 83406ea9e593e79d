// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait implemented by every external-collaborator adapter.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::types::{AdapterType, HealthStatus};

/// Common lifecycle surface for adapters wrapping external services.
///
/// Adapters are registered as trait objects, so all methods must be
/// object-safe.
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// Stable identifier for logging and registry lookup.
    fn name(&self) -> &str;

    /// Adapter implementation version.
    fn version(&self) -> semver::Version;

    /// Which kind of collaborator this adapter wraps.
    fn adapter_type(&self) -> AdapterType;

    /// Probe the underlying service.
    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError>;

    /// Release any held resources. Default is a no-op.
    async fn shutdown(&self) -> Result<(), KeepsakeError> {
        Ok(())
    }
}
