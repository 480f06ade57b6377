use axum::{extract::State, Json};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::jobs::models::JobFilter;
use crate::matching::ranking::{rank_matches, MatchedJob};
use crate::state::AppState;

/// GET /api/v1/jobs/matches
///
/// Scores every open job against the caller's profile and returns them best first.
pub async fn handle_job_matches(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<MatchedJob>>, AppError> {
    let profile = state
        .jobs
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let jobs = state.jobs.list_jobs(&JobFilter::default()).await?;
    let profile_json = serde_json::to_value(&profile).map_err(|e| AppError::Internal(e.into()))?;

    let response = state.matcher.match_jobs(&profile_json, &jobs).await?;
    Ok(Json(rank_matches(response.matches, &jobs)))
}
