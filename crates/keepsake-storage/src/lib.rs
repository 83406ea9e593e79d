// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Keepsake memory engine.
//!
//! Provides the single-writer [`Database`] handle, embedded refinery
//! migrations, and query modules for upload sessions and personalization
//! profiles. Chunk persistence lives in `keepsake-memory`, which owns the
//! memory store exclusively.

pub mod database;
pub mod migrations;
pub mod queries;

pub use database::{Database, map_tr_err};
