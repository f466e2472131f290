//! Note share repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quill_core::{
    new_v7, CreateShareRequest, Error, NoteShare, Result, SharePermission, ShareRepository,
};

/// Columns selected for every share query. `permission` is a Postgres enum
/// and must be cast to text before it can be decoded.
const SHARE_COLUMNS: &str = "id, note_id, shared_with, permission::text AS permission, created_at";

fn row_to_share(row: PgRow) -> Result<NoteShare> {
    let permission_str: String = row.get("permission");
    let permission = SharePermission::parse(&permission_str).ok_or_else(|| {
        Error::Internal(format!(
            "unknown share permission '{}' in database",
            permission_str
        ))
    })?;

    Ok(NoteShare {
        id: row.get("id"),
        note_id: row.get("note_id"),
        shared_with: row.get("shared_with"),
        permission,
        created_at: row.get("created_at"),
    })
}

/// PostgreSQL implementation of ShareRepository.
pub struct PgShareRepository {
    pool: Pool<Postgres>,
}

impl PgShareRepository {
    /// Create a new PgShareRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for PgShareRepository {
    async fn upsert(&self, req: CreateShareRequest) -> Result<NoteShare> {
        let id = new_v7();
        let now = Utc::now();
        // Recipient addresses are stored lowercase so re-sharing with a
        // different casing updates the grant instead of duplicating it.
        let shared_with = req.shared_with.trim().to_lowercase();

        let row = sqlx::query(&format!(
            "INSERT INTO note_share (id, note_id, shared_with, permission, created_at)
             VALUES ($1, $2, $3, $4::share_permission, $5)
             ON CONFLICT (note_id, shared_with)
             DO UPDATE SET permission = EXCLUDED.permission
             RETURNING {SHARE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.note_id)
        .bind(&shared_with)
        .bind(req.permission.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        row_to_share(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<NoteShare>> {
        let row = sqlx::query(&format!(
            "SELECT {SHARE_COLUMNS} FROM note_share WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_share).transpose()
    }

    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<NoteShare>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHARE_COLUMNS} FROM note_share WHERE note_id = $1 ORDER BY created_at"
        ))
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(row_to_share).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note_share WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("share {} not found", id)));
        }
        Ok(())
    }
}
