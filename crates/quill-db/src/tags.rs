//! Tag repository implementation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quill_core::defaults::TAG_NAME_MAX_LENGTH;
use quill_core::{new_v7, Error, Note, Result, Tag, TagRepository, TagWithNotes};

use crate::map_unique_violation;

/// Validate a tag name.
///
/// Rules:
/// - Length between 1-100 characters after trimming
/// - Allowed characters: alphanumeric, spaces, hyphens (-), underscores (_),
///   forward slashes (/)
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if trimmed.chars().count() > TAG_NAME_MAX_LENGTH {
        return Err(format!(
            "Tag name must be {} characters or less",
            TAG_NAME_MAX_LENGTH
        ));
    }

    let invalid_chars: Vec<char> = trimmed
        .chars()
        .filter(|c| !c.is_alphanumeric() && *c != ' ' && *c != '-' && *c != '_' && *c != '/')
        .collect();

    if !invalid_chars.is_empty() {
        let chars_display: String = invalid_chars
            .iter()
            .take(5)
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "Tag contains invalid characters: {}. Only alphanumeric characters, spaces, hyphens, underscores, and forward slashes are allowed",
            chars_display
        ));
    }

    Ok(())
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn insert(&self, owner_id: Uuid, name: &str) -> Result<Tag> {
        validate_tag_name(name).map_err(Error::InvalidInput)?;

        let id = new_v7();
        let now = Utc::now();

        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tag (id, owner_id, name, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, owner_id, name, created_at",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name.trim())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
        .map_err(|e| map_unique_violation(e, "a tag with this name already exists"))?;

        Ok(tag)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            "SELECT id, owner_id, name, created_at FROM tag WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(tag)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<TagWithNotes>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT id, owner_id, name, created_at FROM tag
             WHERE owner_id = $1
             ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
        let mut notes_map: HashMap<Uuid, Vec<Note>> = HashMap::new();

        if !ids.is_empty() {
            let rows = sqlx::query(
                "SELECT nt.tag_id, n.id, n.owner_id, n.folder_id, n.title, n.body,
                        n.created_at, n.updated_at
                 FROM note_tag nt
                 JOIN note n ON n.id = nt.note_id
                 WHERE nt.tag_id = ANY($1)
                 ORDER BY n.updated_at DESC",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

            for row in rows {
                let tag_id: Uuid = row.get("tag_id");
                notes_map.entry(tag_id).or_default().push(Note {
                    id: row.get("id"),
                    owner_id: row.get("owner_id"),
                    folder_id: row.get("folder_id"),
                    title: row.get("title"),
                    body: row.get("body"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                });
            }
        }

        let result = tags
            .into_iter()
            .map(|tag| {
                let notes = notes_map.remove(&tag.id).unwrap_or_default();
                TagWithNotes { tag, notes }
            })
            .collect();

        Ok(result)
    }

    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.owner_id, t.name, t.created_at
             FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = $1
             ORDER BY t.name",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(tags)
    }

    async fn set_for_note(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<Vec<Tag>> {
        // Deduplicate while preserving caller order.
        let mut seen = HashSet::new();
        let unique_ids: Vec<Uuid> = tag_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        // Every supplied tag must exist and belong to the caller. A tag
        // owned by someone else is indistinguishable from a missing one.
        if !unique_ids.is_empty() {
            let rows = sqlx::query("SELECT id FROM tag WHERE id = ANY($1) AND owner_id = $2")
                .bind(&unique_ids)
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

            let owned: HashSet<Uuid> = rows.into_iter().map(|r| r.get("id")).collect();
            if let Some(missing) = unique_ids.iter().find(|id| !owned.contains(id)) {
                return Err(Error::NotFound(format!("tag {} not found", missing)));
            }
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Remove existing links
        sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        // Add new links
        for tag_id in &unique_ids {
            sqlx::query("INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2)")
                .bind(note_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.owner_id, t.name, t.created_at
             FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = $1
             ORDER BY t.name",
        )
        .bind(note_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(tags)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // note_tag links go with the tag via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("tag {} not found", id)));
        }
        Ok(())
    }
}
