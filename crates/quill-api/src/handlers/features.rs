//! Folder, tag, and sharing handlers.
//!
//! Everything here is owner-scoped: folders and tags belong to the caller,
//! and share grants are managed through ownership of the underlying note.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use quill_core::{
    is_valid_email, CreateShareRequest, Folder, FolderRepository, FolderWithNotes, Note,
    NoteRepository, NoteShare, ServerEvent, SharePermission, ShareRepository, Tag, TagRepository,
    TagWithNotes,
};

use super::notes::owned_note;
use crate::{ApiError, AppState, AuthUser};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request body for creating a folder.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
}

/// Request body for creating a tag.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub name: String,
}

/// Request body for replacing a note's tag set.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetNoteTagsRequest {
    /// The complete new tag set; an empty list clears all tags.
    pub tag_ids: Vec<Uuid>,
}

/// Request body for moving a note between folders.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetNoteFolderRequest {
    /// Target folder, or null to unfile the note.
    pub folder_id: Option<Uuid>,
}

/// Request body for sharing a note.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareNoteRequest {
    /// Recipient email. Not required to have an account.
    pub shared_with: String,
    /// "view" (default) or "edit".
    pub permission: Option<String>,
}

// =============================================================================
// FOLDER HANDLERS
// =============================================================================

/// Create a folder owned by the caller.
#[utoipa::path(
    post,
    path = "/api/features/folders",
    tag = "Features",
    security(("bearer_auth" = [])),
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = Folder),
        (status = 400, description = "Invalid folder name"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn create_folder(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let folder = state.db.folders.insert(user.user_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// List the caller's folders, each with its member notes.
#[utoipa::path(
    get,
    path = "/api/features/folders",
    tag = "Features",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's folders", body = [FolderWithNotes]),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn list_folders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<FolderWithNotes>>, ApiError> {
    let folders = state.db.folders.list_for_owner(user.user_id).await?;
    Ok(Json(folders))
}

/// Delete a folder. Member notes are unfiled, not deleted.
#[utoipa::path(
    delete,
    path = "/api/features/folders/{id}",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Folder id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such folder"),
    )
)]
pub async fn delete_folder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    owned_folder(&state, id, user.user_id).await?;
    state.db.folders.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// TAG HANDLERS
// =============================================================================

/// Create a tag owned by the caller. Tag names are unique per owner.
#[utoipa::path(
    post,
    path = "/api/features/tags",
    tag = "Features",
    security(("bearer_auth" = [])),
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Invalid tag name"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Tag name already in use"),
    )
)]
pub async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.db.tags.insert(user.user_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// List the caller's tags, each with the notes it is applied to.
#[utoipa::path(
    get,
    path = "/api/features/tags",
    tag = "Features",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's tags", body = [TagWithNotes]),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn list_tags(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TagWithNotes>>, ApiError> {
    let tags = state.db.tags.list_for_owner(user.user_id).await?;
    Ok(Json(tags))
}

/// Delete a tag, removing it from every note that carries it.
#[utoipa::path(
    delete,
    path = "/api/features/tags/{id}",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such tag"),
    )
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let tag = state
        .db
        .tags
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tag not found: {}", id)))?;
    if tag.owner_id != user.user_id {
        return Err(ApiError::Forbidden("not the tag owner".to_string()));
    }
    state.db.tags.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a note's tag set.
///
/// Full-replace semantics: tags absent from `tagIds` are removed, new ones
/// are attached, and an empty list clears the note. Every tag must exist and
/// belong to the caller.
#[utoipa::path(
    put,
    path = "/api/features/notes/{id}/tags",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = SetNoteTagsRequest,
    responses(
        (status = 200, description = "The note's new tag set", body = [Tag]),
        (status = 403, description = "Not the note owner"),
        (status = 404, description = "No such note, or a tag is missing or not the caller's"),
    )
)]
pub async fn set_note_tags(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetNoteTagsRequest>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    owned_note(&state, id, user.user_id).await?;
    let tags = state
        .db
        .tags
        .set_for_note(id, user.user_id, &req.tag_ids)
        .await?;
    Ok(Json(tags))
}

/// Move a note into a folder, or unfile it with a null folder id.
#[utoipa::path(
    put,
    path = "/api/features/notes/{id}/folder",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = SetNoteFolderRequest,
    responses(
        (status = 200, description = "The moved note", body = Note),
        (status = 403, description = "Not the note or folder owner"),
        (status = 404, description = "No such note or folder"),
    )
)]
pub async fn set_note_folder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetNoteFolderRequest>,
) -> Result<Json<Note>, ApiError> {
    owned_note(&state, id, user.user_id).await?;
    if let Some(folder_id) = req.folder_id {
        owned_folder(&state, folder_id, user.user_id).await?;
    }
    let note = state.db.notes.set_folder(id, req.folder_id).await?;
    Ok(Json(note))
}

// =============================================================================
// SHARE HANDLERS
// =============================================================================

/// Share a note with a recipient email.
///
/// Re-sharing with the same recipient updates the permission instead of
/// creating a second grant.
#[utoipa::path(
    post,
    path = "/api/features/notes/{id}/share",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = ShareNoteRequest,
    responses(
        (status = 201, description = "Share grant", body = NoteShare),
        (status = 400, description = "Invalid recipient or permission"),
        (status = 403, description = "Not the note owner"),
        (status = 404, description = "No such note"),
    )
)]
pub async fn share_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ShareNoteRequest>,
) -> Result<(StatusCode, Json<NoteShare>), ApiError> {
    let shared_with = req.shared_with.trim();
    if !is_valid_email(shared_with) {
        return Err(ApiError::BadRequest(
            "invalid recipient email".to_string(),
        ));
    }
    let permission = match req.permission.as_deref() {
        None => SharePermission::default(),
        Some(p) => SharePermission::parse(p)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown permission '{}'", p)))?,
    };

    owned_note(&state, id, user.user_id).await?;

    let share = state
        .db
        .shares
        .upsert(CreateShareRequest {
            note_id: id,
            shared_with: shared_with.to_string(),
            permission,
        })
        .await?;

    state.event_bus.emit(ServerEvent::NoteShared {
        note_id: id,
        shared_with: share.shared_with.clone(),
        permission: share.permission.to_string(),
    });

    Ok((StatusCode::CREATED, Json(share)))
}

/// List the share grants on a note. Owner only.
#[utoipa::path(
    get,
    path = "/api/features/notes/{id}/shares",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, description = "Shares on the note", body = [NoteShare]),
        (status = 403, description = "Not the note owner"),
        (status = 404, description = "No such note"),
    )
)]
pub async fn list_shares(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NoteShare>>, ApiError> {
    owned_note(&state, id, user.user_id).await?;
    let shares = state.db.shares.list_for_note(id).await?;
    Ok(Json(shares))
}

/// Revoke a share grant. Authorized through ownership of the shared note.
#[utoipa::path(
    delete,
    path = "/api/features/shares/{id}",
    tag = "Features",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Share id")),
    responses(
        (status = 204, description = "Revoked"),
        (status = 403, description = "Not the note owner"),
        (status = 404, description = "No such share"),
    )
)]
pub async fn revoke_share(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let share = state
        .db
        .shares
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Share not found: {}", id)))?;
    owned_note(&state, share.note_id, user.user_id).await?;
    state.db.shares.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// HELPERS
// =============================================================================

async fn owned_folder(state: &AppState, folder_id: Uuid, user_id: Uuid) -> Result<Folder, ApiError> {
    let folder = state
        .db
        .folders
        .get(folder_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Folder not found: {}", folder_id)))?;
    if folder.owner_id != user_id {
        return Err(ApiError::Forbidden("not the folder owner".to_string()));
    }
    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_share_rejects_invalid_recipient() {
        let state = test_support::lazy_state();
        let err = share_note(
            State(state),
            test_support::caller(),
            Path(Uuid::new_v4()),
            Json(ShareNoteRequest {
                shared_with: "not-an-email".to_string(),
                permission: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("recipient")));
    }

    #[tokio::test]
    async fn test_share_rejects_unknown_permission() {
        let state = test_support::lazy_state();
        let err = share_note(
            State(state),
            test_support::caller(),
            Path(Uuid::new_v4()),
            Json(ShareNoteRequest {
                shared_with: "friend@example.com".to_string(),
                permission: Some("owner".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("owner")));
    }

    #[test]
    fn test_share_request_accepts_camel_case() {
        let req: ShareNoteRequest =
            serde_json::from_str(r#"{"sharedWith":"x@y.co","permission":"edit"}"#).unwrap();
        assert_eq!(req.shared_with, "x@y.co");
        assert_eq!(req.permission.as_deref(), Some("edit"));
    }

    #[test]
    fn test_set_tags_request_accepts_empty_list() {
        let req: SetNoteTagsRequest = serde_json::from_str(r#"{"tagIds":[]}"#).unwrap();
        assert!(req.tag_ids.is_empty());
    }

    #[test]
    fn test_set_folder_request_accepts_null() {
        let req: SetNoteFolderRequest = serde_json::from_str(r#"{"folderId":null}"#).unwrap();
        assert!(req.folder_id.is_none());
    }
}
