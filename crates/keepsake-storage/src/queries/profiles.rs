// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personalization profile persistence.
//!
//! Trait and style maps are stored as JSON text columns. The profile is
//! derived data; these queries exist so generation-time reads are cheap.

use std::collections::BTreeMap;

use keepsake_core::{KeepsakeError, PersonalizationLevel, PersonalizationProfile, ProfileStage};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

fn map_json_err(e: serde_json::Error) -> KeepsakeError {
    KeepsakeError::Storage {
        source: Box::new(e),
    }
}

/// Insert or replace the profile for its namespace.
pub async fn upsert_profile(
    db: &Database,
    profile: &PersonalizationProfile,
) -> Result<(), KeepsakeError> {
    let traits_json = serde_json::to_string(&profile.personality_traits).map_err(map_json_err)?;
    let style_json = serde_json::to_string(&profile.communication_style).map_err(map_json_err)?;
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (owner_id, companion_id, stage, personality_traits,
                    communication_style, persona_prompt, adapter_reference,
                    personalization_level, analyzed_chunks, interaction_count, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                    strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(owner_id, companion_id) DO UPDATE SET
                    stage = excluded.stage,
                    personality_traits = excluded.personality_traits,
                    communication_style = excluded.communication_style,
                    persona_prompt = excluded.persona_prompt,
                    adapter_reference = excluded.adapter_reference,
                    personalization_level = excluded.personalization_level,
                    analyzed_chunks = excluded.analyzed_chunks,
                    interaction_count = excluded.interaction_count,
                    updated_at = excluded.updated_at",
                params![
                    profile.owner_id,
                    profile.companion_id,
                    profile.stage.as_str(),
                    traits_json,
                    style_json,
                    profile.persona_prompt,
                    profile.adapter_reference,
                    profile.personalization_level.as_str(),
                    profile.analyzed_chunks as i64,
                    profile.interaction_count as i64,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get the profile for a namespace.
pub async fn get_profile(
    db: &Database,
    owner_id: &str,
    companion_id: &str,
) -> Result<Option<PersonalizationProfile>, KeepsakeError> {
    let owner_id = owner_id.to_string();
    let companion_id = companion_id.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT owner_id, companion_id, stage, personality_traits, communication_style,
                        persona_prompt, adapter_reference, personalization_level,
                        analyzed_chunks, interaction_count, updated_at
                 FROM profiles WHERE owner_id = ?1 AND companion_id = ?2",
            )?;
            let result = stmt.query_row(params![owner_id, companion_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, i64>(9)?,
                    row.get::<_, String>(10)?,
                ))
            });
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)?;

    let Some((
        owner_id,
        companion_id,
        stage,
        traits_json,
        style_json,
        persona_prompt,
        adapter_reference,
        level,
        analyzed_chunks,
        interaction_count,
        updated_at,
    )) = row
    else {
        return Ok(None);
    };

    let personality_traits: BTreeMap<String, f64> =
        serde_json::from_str(&traits_json).map_err(map_json_err)?;
    let communication_style: BTreeMap<String, f64> =
        serde_json::from_str(&style_json).map_err(map_json_err)?;

    Ok(Some(PersonalizationProfile {
        owner_id,
        companion_id,
        stage: ProfileStage::from_str_value(&stage),
        personality_traits,
        communication_style,
        persona_prompt,
        adapter_reference,
        personalization_level: PersonalizationLevel::from_str_value(&level),
        analyzed_chunks: analyzed_chunks as u64,
        interaction_count: interaction_count as u64,
        updated_at,
    }))
}

/// Delete the profile for a namespace. Returns true when a row was removed.
pub async fn delete_profile(
    db: &Database,
    owner_id: &str,
    companion_id: &str,
) -> Result<bool, KeepsakeError> {
    let owner_id = owner_id.to_string();
    let companion_id = companion_id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM profiles WHERE owner_id = ?1 AND companion_id = ?2",
                params![owner_id, companion_id],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn make_profile() -> PersonalizationProfile {
        let mut profile = PersonalizationProfile::empty("u1", "c1");
        profile.stage = ProfileStage::Seeded;
        profile.personality_traits.insert("agreeableness".into(), 0.8);
        profile.personality_traits.insert("openness".into(), 0.6);
        profile.communication_style.insert("casual".into(), 0.7);
        profile.persona_prompt = "You are warm and casual.".into();
        profile.analyzed_chunks = 25;
        profile
    }

    #[tokio::test]
    async fn upsert_and_get_roundtrips() {
        let db = setup_db().await;
        upsert_profile(&db, &make_profile()).await.unwrap();

        let profile = get_profile(&db, "u1", "c1").await.unwrap().unwrap();
        assert_eq!(profile.stage, ProfileStage::Seeded);
        assert_eq!(profile.personality_traits["agreeableness"], 0.8);
        assert_eq!(profile.communication_style["casual"], 0.7);
        assert_eq!(profile.analyzed_chunks, 25);
        assert!(!profile.updated_at.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_existing() {
        let db = setup_db().await;
        upsert_profile(&db, &make_profile()).await.unwrap();

        let mut updated = make_profile();
        updated.stage = ProfileStage::Enhanced;
        updated.analyzed_chunks = 120;
        upsert_profile(&db, &updated).await.unwrap();

        let profile = get_profile(&db, "u1", "c1").await.unwrap().unwrap();
        assert_eq!(profile.stage, ProfileStage::Enhanced);
        assert_eq!(profile.analyzed_chunks, 120);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let db = setup_db().await;
        assert!(get_profile(&db, "u1", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profiles_are_namespace_scoped() {
        let db = setup_db().await;
        upsert_profile(&db, &make_profile()).await.unwrap();

        assert!(get_profile(&db, "u2", "c1").await.unwrap().is_none());
        assert!(get_profile(&db, "u1", "c2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_profile_removes_row() {
        let db = setup_db().await;
        upsert_profile(&db, &make_profile()).await.unwrap();

        assert!(delete_profile(&db, "u1", "c1").await.unwrap());
        assert!(!delete_profile(&db, "u1", "c1").await.unwrap());
        assert!(get_profile(&db, "u1", "c1").await.unwrap().is_none());
    }
}
