// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload session types for ingestion batch tracking.
//!
//! A session is append-only until it reaches a terminal state; partial
//! failures are recorded per file, never session-wide.

use serde::{Deserialize, Serialize};

/// Processing status of an ingestion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "processing" => SessionStatus::Processing,
            "completed" => SessionStatus::Completed,
            "failed" => SessionStatus::Failed,
            "cancelled" => SessionStatus::Cancelled,
            _ => SessionStatus::Pending,
        }
    }

    /// Terminal sessions reject further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }
}

/// Per-file processing status within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Completed,
    Failed,
    Skipped,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Completed => "completed",
            FileStatus::Failed => "failed",
            FileStatus::Skipped => "skipped",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "completed" => FileStatus::Completed,
            "failed" => FileStatus::Failed,
            "skipped" => FileStatus::Skipped,
            _ => FileStatus::Pending,
        }
    }
}

/// Record of one file within an upload session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileRecord {
    pub file_ref: String,
    pub status: FileStatus,
    /// Error message when `status == Failed`.
    pub error: Option<String>,
    pub chunks_created: u64,
}

/// Tracks one ingestion batch for audit and debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub session_id: String,
    pub owner_id: String,
    pub companion_id: String,
    pub status: SessionStatus,
    pub files: Vec<UploadFileRecord>,
    pub total_chunks_created: u64,
    /// ISO 8601 timestamps.
    pub started_at: String,
    pub completed_at: Option<String>,
}
