//! Axum route handlers for jobs, applications and profiles.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::jobs::models::{
    ApplicationRow, ApplicationWithJob, JobFilter, JobRow, JobType, ProfileRow,
};
use crate::jobs::prompts::job_description_prompt;
use crate::llm_client::prompts::PLAIN_TEXT_SYSTEM;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub location: String,
    pub salary: Option<String>,
    #[serde(rename = "type")]
    pub job_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub job_id: Uuid,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// GET /api/v1/jobs?q=&location=&type=
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = state.jobs.list_jobs(&filter.normalized()).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    state
        .jobs
        .get_job(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// POST /api/v1/jobs
///
/// Posts a job on behalf of the caller. When enabled, the description is
/// rewritten by the AI service before it is stored.
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    require_non_empty("title", &request.title)?;
    require_non_empty("company", &request.company)?;
    require_non_empty("description", &request.description)?;
    require_non_empty("location", &request.location)?;
    let job_type: JobType = request.job_type.parse()?;

    let description = if state.config.enhance_job_descriptions {
        let prompt =
            job_description_prompt(&request.title, &request.company, &request.description);
        state
            .llm
            .call_text(&prompt, PLAIN_TEXT_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Job description rewrite failed: {e}")))?
    } else {
        request.description
    };

    let job = state
        .jobs
        .create_job(JobRow {
            id: Uuid::new_v4(),
            title: request.title,
            company: request.company,
            description,
            requirements: request.requirements,
            location: request.location,
            salary: request.salary.filter(|s| !s.trim().is_empty()),
            job_type: job_type.as_str().to_string(),
            employer_id: user.id,
            created_at: Utc::now(),
        })
        .await?;

    info!("Job {} posted by {}", job.id, job.employer_id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ApplicationWithJob>>, AppError> {
    Ok(Json(state.jobs.list_applications(&user.id).await?))
}

/// POST /api/v1/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let application = state
        .jobs
        .create_application(ApplicationRow {
            id: Uuid::new_v4(),
            job_id: request.job_id,
            user_id: user.id,
            cover_letter: request.cover_letter,
            status: "PENDING".to_string(),
            created_at: Utc::now(),
        })
        .await?;

    info!(
        "User {} applied to job {}",
        application.user_id, application.job_id
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ProfileRow>, AppError> {
    state
        .jobs
        .get_profile(&user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// PUT /api/v1/profile
///
/// Resume fields are owned by the upload endpoint and left untouched here.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileRow>, AppError> {
    if update.experience_years.is_some_and(|y| y < 0) {
        return Err(AppError::Validation(
            "experienceYears cannot be negative".to_string(),
        ));
    }

    let mut profile = state
        .jobs
        .get_profile(&user.id)
        .await?
        .unwrap_or_else(|| ProfileRow::empty(&user.id));
    profile.full_name = update.full_name;
    profile.headline = update.headline;
    profile.location = update.location;
    profile.skills = update.skills;
    profile.experience_years = update.experience_years;
    profile.updated_at = Utc::now();

    Ok(Json(state.jobs.upsert_profile(profile).await?))
}
