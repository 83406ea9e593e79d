// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Namespace-isolated memory store with hybrid search.
//!
//! ## Architecture
//!
//! - **MemoryStore**: SQLite persistence with BLOB vectors and FTS5,
//!   idempotent writes, per-namespace write serialization
//! - **search**: dense cosine + sparse keyword-overlap fusion by
//!   weighted sum, ties broken by recency
//! - **Deletion**: tombstone-then-purge so concurrent reads see either
//!   the full pre-deletion set or nothing
//! - **Retention**: periodic sweep expiring short-term chunks past TTL

pub mod search;
pub mod store;

pub use search::{combine, fts_match_query, keyword_overlap};
pub use store::{MemoryStore, RetentionOutcome};
