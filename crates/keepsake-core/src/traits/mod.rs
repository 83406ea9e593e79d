// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for external collaborators.
//!
//! All adapters extend the [`ServiceAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod embedding;
pub mod media;

pub use adapter::ServiceAdapter;
pub use embedding::EmbeddingAdapter;
pub use media::{CaptionAdapter, TranscriptionAdapter};
