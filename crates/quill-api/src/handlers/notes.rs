//! Note CRUD and export handlers.
//!
//! Reads of a single note are public (that is the share link target); every
//! write path checks ownership and answers 403 for someone else's note.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use quill_core::{
    defaults, ExportFormat, FolderRepository, Note, NoteDetail, NoteRepository, ServerEvent,
};

use crate::{ApiError, AppState, AuthUser};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request body for creating a note.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: String,
    /// Note body; empty when omitted.
    pub body: Option<String>,
    /// Folder to file the note into; must be owned by the caller.
    pub folder_id: Option<Uuid>,
}

/// Request body for updating a note. Omitted fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Query parameters for the export endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Export format: "md" (default) or "txt".
    pub format: Option<String>,
}

// =============================================================================
// OWNERSHIP HELPERS
// =============================================================================

/// Fetch a note and require the caller to own it.
pub(crate) async fn owned_note(
    state: &AppState,
    note_id: Uuid,
    user_id: Uuid,
) -> Result<Note, ApiError> {
    let note = state
        .db
        .notes
        .get(note_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Note not found: {}", note_id)))?;
    if note.owner_id != user_id {
        return Err(ApiError::Forbidden("not the note owner".to_string()));
    }
    Ok(note)
}

fn validate_title(title: &str) -> Result<&str, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    if trimmed.chars().count() > defaults::TITLE_MAX_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "title must be {} characters or less",
            defaults::TITLE_MAX_LENGTH
        )));
    }
    Ok(trimmed)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Create a note owned by the caller.
///
/// # Returns
/// - 201 Created with the new note
/// - 400 Bad Request on a blank or overlong title
/// - 403 Forbidden when filing into someone else's folder
/// - 404 Not Found when the target folder does not exist
#[utoipa::path(
    post,
    path = "/api/notes/newnote",
    tag = "Notes",
    security(("bearer_auth" = [])),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let title = validate_title(&req.title)?;

    if let Some(folder_id) = req.folder_id {
        let folder = state
            .db
            .folders
            .get(folder_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Folder not found: {}", folder_id)))?;
        if folder.owner_id != user.user_id {
            return Err(ApiError::Forbidden("not the folder owner".to_string()));
        }
    }

    let note = state
        .db
        .notes
        .insert(quill_core::CreateNoteRequest {
            owner_id: user.user_id,
            title: title.to_string(),
            body: req.body.unwrap_or_default(),
            folder_id: req.folder_id,
        })
        .await?;

    state.event_bus.emit(ServerEvent::NoteCreated {
        note_id: note.id,
        owner_id: note.owner_id,
        owner_email: user.email,
        title: note.title.clone(),
    });

    Ok((StatusCode::CREATED, Json(note)))
}

/// List the caller's notes, most recently updated first, each with its tags.
#[utoipa::path(
    get,
    path = "/api/notes/my-notes",
    tag = "Notes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's notes", body = [NoteDetail]),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn my_notes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<NoteDetail>>, ApiError> {
    let notes = state.db.notes.list_for_owner(user.user_id).await?;
    Ok(Json(notes))
}

/// Fetch a single note with its tags.
///
/// Deliberately unauthenticated: anyone holding a note's id (a share link)
/// can read it.
#[utoipa::path(
    get,
    path = "/api/notes/note/{id}",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, description = "The note", body = NoteDetail),
        (status = 404, description = "No such note"),
    )
)]
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteDetail>, ApiError> {
    let detail = state
        .db
        .notes
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Note not found: {}", id)))?;
    Ok(Json(detail))
}

/// Update a note's title and/or body. Owner only.
#[utoipa::path(
    put,
    path = "/api/notes/note/{id}",
    tag = "Notes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated note", body = Note),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such note"),
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    owned_note(&state, id, user.user_id).await?;

    let title = match req.title.as_deref() {
        Some(t) => Some(validate_title(t)?.to_string()),
        None => None,
    };

    let note = state
        .db
        .notes
        .update(
            id,
            quill_core::UpdateNoteRequest {
                title,
                body: req.body,
            },
        )
        .await?;

    state.event_bus.emit(ServerEvent::NoteUpdated {
        note_id: note.id,
        owner_id: note.owner_id,
    });

    Ok(Json(note))
}

/// Delete a note. Owner only; tag links and shares go with it.
#[utoipa::path(
    delete,
    path = "/api/notes/note/{id}",
    tag = "Notes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such note"),
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    owned_note(&state, id, user.user_id).await?;
    state.db.notes.delete(id).await?;

    state.event_bus.emit(ServerEvent::NoteDeleted {
        note_id: id,
        owner_id: user.user_id,
    });

    Ok(StatusCode::NO_CONTENT)
}

/// Export a note as a downloadable file. Owner only.
///
/// The body is the rendered note; `Content-Disposition` carries a filename
/// derived from the title with filesystem-hostile characters replaced.
#[utoipa::path(
    get,
    path = "/api/notes/note/{id}/export",
    tag = "Notes",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Note id"),
        ExportQuery,
    ),
    responses(
        (status = 200, description = "Rendered note", content_type = "text/markdown"),
        (status = 400, description = "Unknown export format"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such note"),
    )
)]
pub async fn export_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format_str = query.format.as_deref().unwrap_or("md");
    let format = ExportFormat::parse(format_str)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown export format '{}'", format_str)))?;

    owned_note(&state, id, user.user_id).await?;
    let detail = state
        .db
        .notes
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Note not found: {}", id)))?;

    let output = render_export(&detail, format);
    let filename = export_filename(&detail.note, format);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(format.content_type()),
    );
    // The filename is sanitized above, so this always parses.
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", filename)
            .parse()
            .unwrap(),
    );

    Ok((StatusCode::OK, headers, output))
}

// =============================================================================
// EXPORT RENDERING
// =============================================================================

/// Render a note in the requested format: the title as a heading, the body,
/// and a metadata footer with timestamps and tag names.
pub(crate) fn render_export(detail: &NoteDetail, format: ExportFormat) -> String {
    let note = &detail.note;
    let tag_names: Vec<&str> = detail.tags.iter().map(|t| t.name.as_str()).collect();

    let mut output = String::new();
    match format {
        ExportFormat::Md => {
            output.push_str(&format!("# {}\n\n", note.title));
            output.push_str(&note.body);
            output.push_str("\n\n---\n\n");
            output.push_str(&format!("- Created: {}\n", note.created_at.to_rfc3339()));
            output.push_str(&format!("- Updated: {}\n", note.updated_at.to_rfc3339()));
            if !tag_names.is_empty() {
                output.push_str(&format!("- Tags: {}\n", tag_names.join(", ")));
            }
        }
        ExportFormat::Txt => {
            output.push_str(&note.title);
            output.push('\n');
            output.push_str(&"=".repeat(note.title.chars().count().max(1)));
            output.push_str("\n\n");
            output.push_str(&note.body);
            output.push_str("\n\n");
            output.push_str(&format!("Created: {}\n", note.created_at.to_rfc3339()));
            output.push_str(&format!("Updated: {}\n", note.updated_at.to_rfc3339()));
            if !tag_names.is_empty() {
                output.push_str(&format!("Tags: {}\n", tag_names.join(", ")));
            }
        }
    }
    output
}

/// Download filename for an export: the title with path separators, shell
/// metacharacters, and control characters replaced, truncated to fit, plus
/// the format extension. Falls back to the note id for unusable titles.
pub(crate) fn export_filename(note: &Note, format: ExportFormat) -> String {
    let base: String = note
        .title
        .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let base = base.trim();
    let base = if base.is_empty() || base.chars().all(|c| c == '_') {
        note.id.to_string()
    } else {
        let max = defaults::FILENAME_MAX_LENGTH - format.extension().len() - 1;
        base.chars().take(max).collect()
    };
    format!("{}.{}", base, format.extension())
}
