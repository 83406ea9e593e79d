// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Keepsake memory engine.
//!
//! Layered TOML configuration via figment: compiled defaults, system and
//! XDG config files, a local `keepsake.toml`, and `KEEPSAKE_*` environment
//! variable overrides, merged in that order.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    ChunkerConfig, EmbeddingConfig, IngestConfig, KeepsakeConfig, PersonaConfig, RetentionConfig,
    RetrievalConfig, SearchConfig, StorageConfig,
};
