//! Core traits for Quillmark abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Request for creating a new user. The password arrives already hashed:
/// repositories never see plaintext credentials.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

/// Request for updating profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
}

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A duplicate email surfaces as [`crate::Error::Conflict`].
    async fn insert(&self, req: CreateUserRequest) -> Result<User>;

    /// Fetch a user by id.
    async fn get(&self, id: Uuid) -> Result<Option<User>>;

    /// Fetch a user by email (lowercased lookup).
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update profile fields, bumping `updated_at`.
    async fn update_profile(&self, id: Uuid, req: UpdateProfileRequest) -> Result<User>;

    /// Replace the stored password hash.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
    pub folder_id: Option<Uuid>,
}

/// Request for updating a note. `None` leaves a field untouched; any update
/// bumps `updated_at` and never touches `created_at`.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Repository for note CRUD operations.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note owned by the caller.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by id (no ownership check; the public shared-note
    /// fetch uses this directly).
    async fn get(&self, id: Uuid) -> Result<Option<Note>>;

    /// Fetch a note with its tags.
    async fn get_detail(&self, id: Uuid) -> Result<Option<NoteDetail>>;

    /// List all notes owned by a user, most recently updated first,
    /// each with its tags. No pagination.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<NoteDetail>>;

    /// Merge supplied fields into the note and bump `updated_at`.
    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Hard-delete a note (cascades to tag links and shares).
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Move a note into a folder, or unfiles it when `folder_id` is `None`.
    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> Result<Note>;
}

// =============================================================================
// FOLDER REPOSITORY
// =============================================================================

/// Repository for folder operations.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Create a folder owned by the caller.
    async fn insert(&self, owner_id: Uuid, name: &str) -> Result<Folder>;

    /// Fetch a folder by id.
    async fn get(&self, id: Uuid) -> Result<Option<Folder>>;

    /// List a user's folders with their member notes.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FolderWithNotes>>;

    /// Delete a folder. Member notes are unfiled, not deleted.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// TAG REPOSITORY
// =============================================================================

/// Repository for tag operations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a tag owned by the caller. Duplicate name for the same owner
    /// surfaces as [`crate::Error::Conflict`].
    async fn insert(&self, owner_id: Uuid, name: &str) -> Result<Tag>;

    /// Fetch a tag by id.
    async fn get(&self, id: Uuid) -> Result<Option<Tag>>;

    /// List a user's tags with the notes each is applied to.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<TagWithNotes>>;

    /// Get the tags applied to a note.
    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<Tag>>;

    /// Replace a note's tag set with exactly `tag_ids`, in one transaction.
    /// Every supplied tag must exist and belong to `owner_id`.
    async fn set_for_note(&self, note_id: Uuid, owner_id: Uuid, tag_ids: &[Uuid]) -> Result<Vec<Tag>>;

    /// Delete a tag (cascades to note associations).
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// SHARE REPOSITORY
// =============================================================================

/// Request for creating a share grant.
#[derive(Debug, Clone)]
pub struct CreateShareRequest {
    pub note_id: Uuid,
    pub shared_with: String,
    pub permission: SharePermission,
}

/// Repository for note share grants.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Create a share, or update the permission if this note is already
    /// shared with the same recipient.
    async fn upsert(&self, req: CreateShareRequest) -> Result<NoteShare>;

    /// Fetch a share by id.
    async fn get(&self, id: Uuid) -> Result<Option<NoteShare>>;

    /// List all shares on a note.
    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<NoteShare>>;

    /// Revoke a share.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// ASSIST BACKEND
// =============================================================================

/// Backend for the external AI text-transform / PDF-question service.
///
/// The contracts are opaque text-in/text-out; implementations forward to the
/// remote service (or fake it in tests).
#[async_trait]
pub trait AssistBackend: Send + Sync {
    /// Summarize a passage of text.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Extract key points from a passage of text.
    async fn keypoints(&self, text: &str) -> Result<String>;

    /// Rewrite text in the requested style.
    async fn stylize(&self, text: &str, style: &str) -> Result<String>;

    /// Upload a PDF for question answering; returns the collection name
    /// subsequent queries reference.
    async fn process_pdf(&self, filename: &str, data: Vec<u8>) -> Result<String>;

    /// Ask a question against a previously processed PDF.
    async fn query_pdf(&self, collection_name: &str, question: &str) -> Result<String>;

    /// Discard a processed PDF's collection.
    async fn delete_pdf(&self, collection_name: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_request_default() {
        let req = UpdateProfileRequest::default();
        assert!(req.first_name.is_none());
        assert!(req.last_name.is_none());
        assert!(req.role.is_none());
    }

    #[test]
    fn test_update_note_request_default() {
        let req = UpdateNoteRequest::default();
        assert!(req.title.is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn test_create_note_request() {
        let owner = Uuid::new_v4();
        let req = CreateNoteRequest {
            owner_id: owner,
            title: "Lecture 3".to_string(),
            body: "Dynamic programming".to_string(),
            folder_id: None,
        };
        assert_eq!(req.owner_id, owner);
        assert_eq!(req.title, "Lecture 3");
        assert!(req.folder_id.is_none());
    }

    #[test]
    fn test_create_share_request_defaults_to_view_when_built_that_way() {
        let req = CreateShareRequest {
            note_id: Uuid::nil(),
            shared_with: "peer@example.com".to_string(),
            permission: SharePermission::default(),
        };
        assert_eq!(req.permission, SharePermission::View);
    }

    #[test]
    fn test_create_user_request_clone() {
        let req1 = CreateUserRequest {
            email: "a@b.com".to_string(),
            password_hash: "phc".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            role: UserRole::Student,
        };
        let req2 = req1.clone();
        assert_eq!(req1.email, req2.email);
        assert_eq!(req1.role, req2.role);
    }
}
