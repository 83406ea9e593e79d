// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keepsake.toml` > `~/.config/keepsake/keepsake.toml`
//! > `/etc/keepsake/keepsake.toml` with environment variable overrides via
//! the `KEEPSAKE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KeepsakeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keepsake/keepsake.toml` (system-wide)
/// 3. `~/.config/keepsake/keepsake.toml` (user XDG config)
/// 4. `./keepsake.toml` (local directory)
/// 5. `KEEPSAKE_*` environment variables
pub fn load_config() -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file("/etc/keepsake/keepsake.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keepsake/keepsake.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("keepsake.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example,
/// `KEEPSAKE_EMBEDDING_BASE_URL` must map to `embedding.base_url`,
/// not `embedding.base.url`.
fn env_provider() -> Env {
    Env::prefixed("KEEPSAKE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("ingest_", "ingest.", 1)
            .replacen("chunker_", "chunker.", 1)
            .replacen("embedding_", "embedding.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("search_", "search.", 1)
            .replacen("persona_", "persona.", 1)
            .replacen("retrieval_", "retrieval.", 1)
            .replacen("retention_", "retention.", 1);
        mapped.into()
    })
}
