//! Note repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quill_core::{
    new_v7, CreateNoteRequest, Error, Note, NoteDetail, NoteRepository, Result, Tag,
    UpdateNoteRequest,
};

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetch tags for a batch of notes in one query, keyed by note id.
    ///
    /// Avoids an N+1 round-trip when listing notes with their tags.
    async fn tags_by_note(&self, note_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Tag>>> {
        if note_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT nt.note_id, t.id, t.owner_id, t.name, t.created_at
             FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = ANY($1)
             ORDER BY t.name",
        )
        .bind(note_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_note: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            let note_id: Uuid = row.get("note_id");
            by_note.entry(note_id).or_default().push(Tag {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            });
        }
        Ok(by_note)
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let id = new_v7();
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            "INSERT INTO note (id, owner_id, folder_id, title, body, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING id, owner_id, folder_id, title, body, created_at, updated_at",
        )
        .bind(id)
        .bind(req.owner_id)
        .bind(req.folder_id)
        .bind(&req.title)
        .bind(&req.body)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(
            "SELECT id, owner_id, folder_id, title, body, created_at, updated_at
             FROM note WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note)
    }

    async fn get_detail(&self, id: Uuid) -> Result<Option<NoteDetail>> {
        let Some(note) = self.get(id).await? else {
            return Ok(None);
        };

        let mut tags_map = self.tags_by_note(&[id]).await?;
        let tags = tags_map.remove(&id).unwrap_or_default();

        Ok(Some(NoteDetail { note, tags }))
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<NoteDetail>> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT id, owner_id, folder_id, title, body, created_at, updated_at
             FROM note WHERE owner_id = $1
             ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let ids: Vec<Uuid> = notes.iter().map(|n| n.id).collect();
        let mut tags_map = self.tags_by_note(&ids).await?;

        let details = notes
            .into_iter()
            .map(|note| {
                let tags = tags_map.remove(&note.id).unwrap_or_default();
                NoteDetail { note, tags }
            })
            .collect();

        Ok(details)
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            "UPDATE note
             SET title = COALESCE($2, title),
                 body = COALESCE($3, body),
                 updated_at = $4
             WHERE id = $1
             RETURNING id, owner_id, folder_id, title, body, created_at, updated_at",
        )
        .bind(id)
        .bind(req.title.as_deref())
        .bind(req.body.as_deref())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        note.ok_or(Error::NoteNotFound(id))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> Result<Note> {
        let now = Utc::now();

        let note = sqlx::query_as::<_, Note>(
            "UPDATE note SET folder_id = $2, updated_at = $3 WHERE id = $1
             RETURNING id, owner_id, folder_id, title, body, created_at, updated_at",
        )
        .bind(id)
        .bind(folder_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        note.ok_or(Error::NoteNotFound(id))
    }
}
