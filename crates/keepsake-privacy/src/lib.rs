// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data subject rights tooling for the Keepsake memory engine.
//!
//! - **ExportService**: serialized chunk+profile bundles
//! - **DeletionService**: hard deletion of a namespace
//! - **ExportGuards**: pending exports block deletion and exempt the
//!   namespace from the retention sweep

pub mod delete;
pub mod export;
pub mod guard;

pub use delete::{DeletionReport, DeletionService};
pub use export::{ExportBundle, ExportService};
pub use guard::{ExportGuard, ExportGuards};
