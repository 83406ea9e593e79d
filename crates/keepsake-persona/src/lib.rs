// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personalization engine for the Keepsake memory engine.
//!
//! ## Architecture
//!
//! - **vocabulary**: fixed, versioned trait and style lexicons
//! - **Analyzer**: bounded lexical scoring of memory content
//! - **ProfileEngine**: Empty -> Seeded -> Enhanced state machine with
//!   exponential-decay incremental updates
//! - **prompt**: deterministic persona directive generation

pub mod analyzer;
pub mod profile;
pub mod prompt;
pub mod vocabulary;

pub use analyzer::{Analyzer, TraitAnalysis};
pub use profile::ProfileEngine;
pub use prompt::{build_persona_prompt, default_persona_prompt};
pub use vocabulary::VOCABULARY_VERSION;
