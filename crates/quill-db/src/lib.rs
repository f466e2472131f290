//! # quill-db
//!
//! PostgreSQL database layer for Quillmark.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for users, notes, folders, tags, and shares
//! - SQL migrations (behind the `migrations` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use quill_db::{Database, NoteRepository, CreateNoteRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/quill").await?;
//!
//!     let note = db.notes.insert(CreateNoteRequest {
//!         owner_id: user_id,
//!         title: "Lecture 3".to_string(),
//!         body: "Dynamic programming".to_string(),
//!         folder_id: None,
//!     }).await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```
pub mod folders;
pub mod notes;
pub mod pool;
pub mod shares;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use quill_core::*;

/// Translate a unique-constraint violation into a domain conflict, leaving
/// every other error untouched.
pub fn map_unique_violation(e: Error, conflict_message: &str) -> Error {
    if e.is_unique_violation() {
        Error::Conflict(conflict_message.to_string())
    } else {
        e
    }
}

// Re-export repository implementations
pub use folders::{validate_folder_name, PgFolderRepository};
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use shares::PgShareRepository;
pub use tags::{validate_tag_name, PgTagRepository};
pub use users::PgUserRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User account repository.
    pub users: PgUserRepository,
    /// Note repository for CRUD operations.
    pub notes: PgNoteRepository,
    /// Folder repository for note grouping.
    pub folders: PgFolderRepository,
    /// Tag repository for note labelling.
    pub tags: PgTagRepository,
    /// Share repository for per-note grants.
    pub shares: PgShareRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            folders: PgFolderRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            shares: PgShareRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
