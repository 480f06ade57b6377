//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::resumes::analysis::{analyze_resume, refine_position, SuggestedPosition};
use crate::resumes::extract::{
    extract_text, format_file_size, resolve_content_type, validate_file,
};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUploadResponse {
    pub file_name: String,
    pub size: String,
    pub characters: usize,
}

/// POST /api/v1/resumes (multipart, field `file`)
///
/// Extracts the resume text and stores it on the caller's profile.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("resume").to_string();
        let declared = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;

        let content_type = validate_file(
            data.len(),
            resolve_content_type(declared.as_deref(), &file_name),
        )?;
        let size = format_file_size(data.len() as u64);
        let text = extract_text(content_type, data).await?;

        state.jobs.save_resume(&user.id, &file_name, &text).await?;
        info!("Stored resume '{file_name}' ({size}) for user {}", user.id);

        return Ok(Json(ResumeUploadResponse {
            file_name,
            size,
            characters: text.chars().count(),
        }));
    }

    Err(AppError::Validation(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}

async fn stored_resume_text(state: &AppState, user: &CurrentUser) -> Result<String, AppError> {
    state
        .jobs
        .get_profile(&user.id)
        .await?
        .and_then(|p| p.resume_text)
        .ok_or_else(|| AppError::NotFound("No resume uploaded for this user".to_string()))
}

/// POST /api/v1/resumes/analyze
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<SuggestedPosition>>, AppError> {
    let resume_text = stored_resume_text(&state, &user).await?;
    Ok(Json(analyze_resume(&resume_text, &state.llm).await?))
}

/// POST /api/v1/resumes/refine
pub async fn handle_refine_position(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(position): Json<SuggestedPosition>,
) -> Result<Json<SuggestedPosition>, AppError> {
    let resume_text = stored_resume_text(&state, &user).await?;
    Ok(Json(
        refine_position(position, &resume_text, &state.llm).await?,
    ))
}
