//! User account repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quill_core::{
    new_v7, CreateUserRequest, Error, Result, UpdateProfileRequest, User, UserRepository, UserRole,
};

use crate::map_unique_violation;

/// Columns selected for every user query. `role` is a Postgres enum and
/// must be cast to text before it can be decoded.
const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, role::text AS role, created_at, updated_at";

fn row_to_user(row: PgRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::parse(&role_str)
        .ok_or_else(|| Error::Internal(format!("unknown user role '{}' in database", role_str)))?;

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, req: CreateUserRequest) -> Result<User> {
        let id = new_v7();
        let now = Utc::now();
        // Emails are stored lowercase so the unique index doubles as a
        // case-insensitive duplicate check.
        let email = req.email.trim().to_lowercase();

        let row = sqlx::query(&format!(
            "INSERT INTO app_user (id, email, password_hash, first_name, last_name, role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6::user_role, $7, $7)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&email)
        .bind(&req.password_hash)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(req.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
        .map_err(|e| map_unique_violation(e, "an account with this email already exists"))?;

        row_to_user(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE email = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_user).transpose()
    }

    async fn update_profile(&self, id: Uuid, req: UpdateProfileRequest) -> Result<User> {
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "UPDATE app_user
             SET first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 role = COALESCE($4::user_role, role),
                 updated_at = $5
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(req.first_name.as_deref())
        .bind(req.last_name.as_deref())
        .bind(req.role.map(|r| r.as_str()))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_user)
            .transpose()?
            .ok_or(Error::UserNotFound(id))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE app_user SET password_hash = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(id));
        }
        Ok(())
    }
}
