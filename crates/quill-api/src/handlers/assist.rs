//! Assist proxy handlers.
//!
//! Thin authenticated front for the external AI service: validate the input,
//! forward through [`quill_core::AssistBackend`], and wrap the result in the
//! public wire shape. Upstream failures surface as 502.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use quill_core::defaults;

use crate::{ApiError, AppState, AuthUser};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request body carrying a passage of text.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub text: String,
}

/// Summarize response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub summary: String,
}

/// Key points response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeypointsResponse {
    pub keypoints: String,
}

/// Request body for rewriting text in a named style.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StylizeRequest {
    pub text: String,
    pub style: String,
}

/// Stylize response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StylizeResponse {
    pub styled_text: String,
}

/// Process-pdf response carrying the collection name later queries reference.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPdfResponse {
    pub collection_name: String,
}

/// Request body for asking a question against a processed PDF.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryPdfRequest {
    pub collection_name: String,
    pub question: String,
}

/// Query-pdf response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryPdfResponse {
    pub answer: String,
}

/// Request body for discarding a processed PDF.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletePdfRequest {
    pub collection_name: String,
}

/// Delete-pdf acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletePdfResponse {
    pub deleted: bool,
    pub collection_name: String,
}

fn require_text<'a>(value: &'a str, label: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", label)));
    }
    Ok(trimmed)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Summarize a passage of text.
#[utoipa::path(
    post,
    path = "/api/assist/summarize",
    tag = "Assist",
    security(("bearer_auth" = [])),
    request_body = TextRequest,
    responses(
        (status = 200, description = "Summary", body = SummaryResponse),
        (status = 400, description = "Empty text"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Assist service failed"),
    )
)]
pub async fn summarize(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<TextRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let text = require_text(&req.text, "text")?;
    let summary = state.assist.summarize(text).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Extract key points from a passage of text.
#[utoipa::path(
    post,
    path = "/api/assist/keypoints",
    tag = "Assist",
    security(("bearer_auth" = [])),
    request_body = TextRequest,
    responses(
        (status = 200, description = "Key points", body = KeypointsResponse),
        (status = 400, description = "Empty text"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Assist service failed"),
    )
)]
pub async fn keypoints(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<TextRequest>,
) -> Result<Json<KeypointsResponse>, ApiError> {
    let text = require_text(&req.text, "text")?;
    let keypoints = state.assist.keypoints(text).await?;
    Ok(Json(KeypointsResponse { keypoints }))
}

/// Rewrite text in the requested style.
#[utoipa::path(
    post,
    path = "/api/assist/stylize",
    tag = "Assist",
    security(("bearer_auth" = [])),
    request_body = StylizeRequest,
    responses(
        (status = 200, description = "Restyled text", body = StylizeResponse),
        (status = 400, description = "Empty text or style"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Assist service failed"),
    )
)]
pub async fn stylize(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<StylizeRequest>,
) -> Result<Json<StylizeResponse>, ApiError> {
    let text = require_text(&req.text, "text")?;
    let style = require_text(&req.style, "style")?;
    let styled_text = state.assist.stylize(text, style).await?;
    Ok(Json(StylizeResponse { styled_text }))
}

/// Upload a PDF for question answering.
///
/// Multipart upload with the document under the `file` field. Returns the
/// collection name that `query-pdf` and `delete-pdf` reference.
#[utoipa::path(
    post,
    path = "/api/assist/process-pdf",
    tag = "Assist",
    security(("bearer_auth" = [])),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Collection created", body = ProcessPdfResponse),
        (status = 400, description = "Missing, empty, or oversize file"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Assist service failed"),
    )
)]
pub async fn process_pdf(
    State(state): State<AppState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ProcessPdfResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
            file = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
    }
    if data.len() > defaults::MAX_PDF_SIZE_BYTES {
        return Err(ApiError::BadRequest(format!(
            "PDF exceeds the {} byte limit",
            defaults::MAX_PDF_SIZE_BYTES
        )));
    }

    let collection_name = state.assist.process_pdf(&filename, data).await?;
    Ok(Json(ProcessPdfResponse { collection_name }))
}

/// Ask a question against a previously processed PDF.
#[utoipa::path(
    post,
    path = "/api/assist/query-pdf",
    tag = "Assist",
    security(("bearer_auth" = [])),
    request_body = QueryPdfRequest,
    responses(
        (status = 200, description = "Answer", body = QueryPdfResponse),
        (status = 400, description = "Empty collection name or question"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Assist service failed"),
    )
)]
pub async fn query_pdf(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<QueryPdfRequest>,
) -> Result<Json<QueryPdfResponse>, ApiError> {
    let collection = require_text(&req.collection_name, "collection name")?;
    let question = require_text(&req.question, "question")?;
    let answer = state.assist.query_pdf(collection, question).await?;
    Ok(Json(QueryPdfResponse { answer }))
}

/// Discard a processed PDF's collection.
#[utoipa::path(
    post,
    path = "/api/assist/delete-pdf",
    tag = "Assist",
    security(("bearer_auth" = [])),
    request_body = DeletePdfRequest,
    responses(
        (status = 200, description = "Acknowledgement", body = DeletePdfResponse),
        (status = 400, description = "Empty collection name"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Assist service failed"),
    )
)]
pub async fn delete_pdf(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<DeletePdfRequest>,
) -> Result<Json<DeletePdfResponse>, ApiError> {
    let collection = require_text(&req.collection_name, "collection name")?;
    state.assist.delete_pdf(collection).await?;
    Ok(Json(DeletePdfResponse {
        deleted: true,
        collection_name: collection.to_string(),
    }))
}
