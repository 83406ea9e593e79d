// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload session CRUD operations.
//!
//! Sessions are append-only until terminal: status transitions and file
//! record updates are guarded so a completed, failed, or cancelled session
//! can never be mutated again.

use keepsake_core::{FileStatus, KeepsakeError, SessionStatus, UploadFileRecord, UploadSession};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Create a new session together with its pending file records.
pub async fn create_session(db: &Database, session: &UploadSession) -> Result<(), KeepsakeError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO upload_sessions (id, owner_id, companion_id, status, total_chunks_created, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.session_id,
                    session.owner_id,
                    session.companion_id,
                    session.status.as_str(),
                    session.total_chunks_created as i64,
                    session.started_at,
                    session.completed_at,
                ],
            )?;
            for file in &session.files {
                tx.execute(
                    "INSERT INTO upload_session_files (session_id, file_ref, status, error, chunks_created)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        session.session_id,
                        file.file_ref,
                        file.status.as_str(),
                        file.error,
                        file.chunks_created as i64,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session with its file records.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<UploadSession>, KeepsakeError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, companion_id, status, total_chunks_created, started_at, completed_at
                 FROM upload_sessions WHERE id = ?1",
            )?;
            let session = stmt.query_row(params![id], |row| {
                Ok(UploadSession {
                    session_id: row.get(0)?,
                    owner_id: row.get(1)?,
                    companion_id: row.get(2)?,
                    status: SessionStatus::from_str_value(&row.get::<_, String>(3)?),
                    files: Vec::new(),
                    total_chunks_created: row.get::<_, i64>(4)? as u64,
                    started_at: row.get(5)?,
                    completed_at: row.get(6)?,
                })
            });
            let mut session = match session {
                Ok(s) => s,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            let mut stmt = conn.prepare(
                "SELECT file_ref, status, error, chunks_created
                 FROM upload_session_files WHERE session_id = ?1 ORDER BY file_ref",
            )?;
            let files = stmt
                .query_map(params![session.session_id], |row| {
                    Ok(UploadFileRecord {
                        file_ref: row.get(0)?,
                        status: FileStatus::from_str_value(&row.get::<_, String>(1)?),
                        error: row.get(2)?,
                        chunks_created: row.get::<_, i64>(3)? as u64,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            session.files = files;
            Ok(Some(session))
        })
        .await
        .map_err(map_tr_err)
}

/// Transition a session's status.
///
/// Rejects the transition when the session is already terminal,
/// preserving the append-only invariant.
pub async fn set_session_status(
    db: &Database,
    id: &str,
    status: SessionStatus,
) -> Result<(), KeepsakeError> {
    let id = id.to_string();
    let id_for_err = id.clone();
    let completed_at = status.is_terminal();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE upload_sessions
                 SET status = ?1,
                     completed_at = CASE WHEN ?2 THEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now') ELSE completed_at END
                 WHERE id = ?3 AND status NOT IN ('completed', 'failed', 'cancelled')",
                params![status.as_str(), completed_at, id],
            )?;
            Ok(updated)
        })
        .await
        .map_err(map_tr_err)
        .and_then(|updated| {
            if updated == 0 {
                Err(KeepsakeError::Validation(format!(
                    "session {id_for_err} is terminal or unknown, status is append-only"
                )))
            } else {
                Ok(())
            }
        })
}

/// Update one file record within a non-terminal session and fold its
/// chunk count into the session total.
pub async fn record_file_result(
    db: &Database,
    session_id: &str,
    file_ref: &str,
    status: FileStatus,
    error: Option<String>,
    chunks_created: u64,
) -> Result<(), KeepsakeError> {
    let session_id = session_id.to_string();
    let file_ref = file_ref.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let terminal: bool = tx.query_row(
                "SELECT status IN ('completed', 'failed', 'cancelled')
                 FROM upload_sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            if terminal {
                tx.commit()?;
                return Ok(false);
            }
            tx.execute(
                "UPDATE upload_session_files
                 SET status = ?1, error = ?2, chunks_created = ?3
                 WHERE session_id = ?4 AND file_ref = ?5",
                params![
                    status.as_str(),
                    error,
                    chunks_created as i64,
                    session_id,
                    file_ref
                ],
            )?;
            tx.execute(
                "UPDATE upload_sessions
                 SET total_chunks_created = total_chunks_created + ?1
                 WHERE id = ?2",
                params![chunks_created as i64, session_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
        .and_then(|updated| {
            if updated {
                Ok(())
            } else {
                Err(KeepsakeError::Validation(
                    "cannot record file result on a terminal session".into(),
                ))
            }
        })
}

/// List all sessions in a namespace, newest first. Used by export.
pub async fn list_sessions_for_namespace(
    db: &Database,
    owner_id: &str,
    companion_id: &str,
) -> Result<Vec<UploadSession>, KeepsakeError> {
    let owner_id = owner_id.to_string();
    let companion_id = companion_id.to_string();
    let ids: Vec<String> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM upload_sessions
                 WHERE owner_id = ?1 AND companion_id = ?2
                 ORDER BY started_at DESC",
            )?;
            let ids = stmt
                .query_map(params![owner_id, companion_id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)?;

    let mut sessions = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(session) = get_session(db, &id).await? {
            sessions.push(session);
        }
    }
    Ok(sessions)
}

/// Hard-delete all sessions in a namespace. Returns the count removed.
pub async fn delete_sessions_for_namespace(
    db: &Database,
    owner_id: &str,
    companion_id: &str,
) -> Result<u64, KeepsakeError> {
    let owner_id = owner_id.to_string();
    let companion_id = companion_id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM upload_sessions WHERE owner_id = ?1 AND companion_id = ?2",
                params![owner_id, companion_id],
            )?;
            Ok(deleted as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Garbage-collect terminal sessions older than the cutoff timestamp.
pub async fn gc_terminal_sessions(db: &Database, cutoff: &str) -> Result<u64, KeepsakeError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM upload_sessions
                 WHERE status IN ('completed', 'failed', 'cancelled') AND started_at < ?1",
                params![cutoff],
            )?;
            Ok(deleted as u64)
        })
        .await
        .map_err(map_tr_err)
}
