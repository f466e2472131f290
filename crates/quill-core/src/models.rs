//! Core data models for Quillmark.
//!
//! These types are shared across all Quillmark crates and represent
//! the core domain entities. Wire-facing structs serialize camelCase
//! to match the public API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// USER TYPES
// =============================================================================

/// Role a user self-selects at registration. Display-only; carries no
/// authorization semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Professor,
    Admin,
    Engineer,
    #[default]
    Other,
}

impl UserRole {
    /// Canonical lowercase name, matching the `user_role` Postgres enum.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Professor => "professor",
            UserRole::Admin => "admin",
            UserRole::Engineer => "engineer",
            UserRole::Other => "other",
        }
    }

    /// Parse from string (case-insensitive). Returns `None` for unknown roles.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(UserRole::Student),
            "professor" => Some(UserRole::Professor),
            "admin" => Some(UserRole::Admin),
            "engineer" => Some(UserRole::Engineer),
            "other" => Some(UserRole::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered user. The password hash never leaves the backend:
/// it is skipped on serialization and absent from [`UserProfile`], which is
/// the only user shape API responses carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public view of this user, safe to return from any endpoint.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Public user profile (no credential material).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note row. Ownership is immutable after creation; `updated_at` bumps on
/// every edit while `created_at` never changes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub folder_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note with its tag associations, as returned by list/detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: Note,
    pub tags: Vec<Tag>,
}

// =============================================================================
// ORGANIZATION TYPES
// =============================================================================

/// A folder: single-level grouping container for notes (one folder per note,
/// nullable).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A folder with its member notes, as returned by the folder list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderWithNotes {
    #[serde(flatten)]
    pub folder: Folder,
    pub notes: Vec<Note>,
}

/// A tag: many-to-many label applied to notes. Names are unique per owner.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A tag with the notes it is applied to.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagWithNotes {
    #[serde(flatten)]
    pub tag: Tag,
    pub notes: Vec<Note>,
}

// =============================================================================
// SHARING TYPES
// =============================================================================

/// Permission level on a share grant. Advisory on the public read path:
/// the unauthenticated shared-note fetch does not gate on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    #[default]
    View,
    Edit,
}

impl SharePermission {
    /// Canonical lowercase name, matching the `share_permission` Postgres enum.
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::View => "view",
            SharePermission::Edit => "edit",
        }
    }

    /// Parse from string (case-insensitive). Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "view" => Some(SharePermission::View),
            "edit" => Some(SharePermission::Edit),
            _ => None,
        }
    }
}

impl std::fmt::Display for SharePermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A share grant on a note. The recipient is an email string, not a resolved
/// user: shares remain valid for addresses with no account.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteShare {
    pub id: Uuid,
    pub note_id: Uuid,
    pub shared_with: String,
    pub permission: SharePermission,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// EXPORT TYPES
// =============================================================================

/// Note export format selected via the `format` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Md,
    Txt,
}

impl ExportFormat {
    /// Parse from the query-parameter value. Accepts the short names and
    /// their long aliases; anything else is a validation failure.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Some(ExportFormat::Md),
            "txt" | "text" | "plain" => Some(ExportFormat::Txt),
            _ => None,
        }
    }

    /// File extension for the download filename.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Md => "md",
            ExportFormat::Txt => "txt",
        }
    }

    /// Content-Type for the download response.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Md => "text/markdown; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

/// Minimal email shape check: one `@` with non-empty local part, and a domain
/// containing a dot with non-empty labels. Deliverability is not our problem;
/// this only rejects obvious garbage before it reaches the database.
pub fn is_valid_email(s: &str) -> bool {
    if s.len() > crate::defaults::EMAIL_MAX_LENGTH || s.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}
