//! Folder repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use quill_core::defaults::FOLDER_NAME_MAX_LENGTH;
use quill_core::{
    new_v7, Error, Folder, FolderRepository, FolderWithNotes, Note, Result,
};

/// Validate a folder name.
///
/// Rules:
/// - Non-empty after trimming
/// - At most [`FOLDER_NAME_MAX_LENGTH`] characters
/// - No control characters
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_folder_name(name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err("Folder name cannot be empty".to_string());
    }
    if name.chars().count() > FOLDER_NAME_MAX_LENGTH {
        return Err(format!(
            "Folder name must be {} characters or less",
            FOLDER_NAME_MAX_LENGTH
        ));
    }
    if name.chars().any(char::is_control) {
        return Err("Folder name cannot contain control characters".to_string());
    }
    Ok(())
}

/// PostgreSQL implementation of FolderRepository.
pub struct PgFolderRepository {
    pool: Pool<Postgres>,
}

impl PgFolderRepository {
    /// Create a new PgFolderRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn insert(&self, owner_id: Uuid, name: &str) -> Result<Folder> {
        validate_folder_name(name).map_err(Error::InvalidInput)?;

        let id = new_v7();
        let now = Utc::now();

        let folder = sqlx::query_as::<_, Folder>(
            "INSERT INTO folder (id, owner_id, name, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, owner_id, name, created_at",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name.trim())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(folder)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, owner_id, name, created_at FROM folder WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(folder)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FolderWithNotes>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT id, owner_id, name, created_at FROM folder
             WHERE owner_id = $1
             ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let ids: Vec<Uuid> = folders.iter().map(|f| f.id).collect();
        let mut notes_map: HashMap<Uuid, Vec<Note>> = HashMap::new();

        if !ids.is_empty() {
            let notes = sqlx::query_as::<_, Note>(
                "SELECT id, owner_id, folder_id, title, body, created_at, updated_at
                 FROM note WHERE folder_id = ANY($1)
                 ORDER BY updated_at DESC",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

            for note in notes {
                // folder_id is non-null here by the WHERE clause
                if let Some(folder_id) = note.folder_id {
                    notes_map.entry(folder_id).or_default().push(note);
                }
            }
        }

        let result = folders
            .into_iter()
            .map(|folder| {
                let notes = notes_map.remove(&folder.id).unwrap_or_default();
                FolderWithNotes { folder, notes }
            })
            .collect();

        Ok(result)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // ON DELETE SET NULL on note.folder_id unfiles member notes.
        let result = sqlx::query("DELETE FROM folder WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::FolderNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_folder_name_accepts_normal_names() {
        assert!(validate_folder_name("School").is_ok());
        assert!(validate_folder_name("Fall 2025 / CS 101").is_ok());
    }

    #[test]
    fn test_validate_folder_name_rejects_empty() {
        assert!(validate_folder_name("").is_err());
        assert!(validate_folder_name("   ").is_err());
    }

    #[test]
    fn test_validate_folder_name_rejects_overlong() {
        let name = "x".repeat(FOLDER_NAME_MAX_LENGTH + 1);
        assert!(validate_folder_name(&name).is_err());
    }

    #[test]
    fn test_validate_folder_name_rejects_control_chars() {
        assert!(validate_folder_name("bad\x00name").is_err());
        assert!(validate_folder_name("two\nlines").is_err());
    }
}
