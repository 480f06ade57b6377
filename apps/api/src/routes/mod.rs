pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::contracts::handlers as contracts;
use crate::jobs::handlers as jobs;
use crate::matching::handlers as matching;
use crate::resumes::extract::MAX_RESUME_BYTES;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::storage::handlers as snapshots;

/// Multipart framing on top of the largest accepted resume.
const UPLOAD_BODY_LIMIT: usize = MAX_RESUME_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Contracts
        .route(
            "/api/v1/contracts",
            get(contracts::handle_list_contracts).post(contracts::handle_create_contract),
        )
        .route("/api/v1/contracts/:id", get(contracts::handle_get_contract))
        .route(
            "/api/v1/contracts/:id/milestones/:index",
            patch(contracts::handle_update_milestone),
        )
        .route(
            "/api/v1/contracts/:id/status",
            patch(contracts::handle_update_status),
        )
        // Snapshots
        .route(
            "/api/v1/snapshots/:identifier",
            get(snapshots::handle_get_snapshot),
        )
        .route(
            "/api/v1/snapshots/:identifier/verify",
            post(snapshots::handle_verify_snapshot),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/v1/jobs/matches", get(matching::handle_job_matches))
        .route("/api/v1/jobs/:id", get(jobs::handle_get_job))
        .route(
            "/api/v1/applications",
            get(jobs::handle_list_applications).post(jobs::handle_create_application),
        )
        .route(
            "/api/v1/profile",
            get(jobs::handle_get_profile).put(jobs::handle_update_profile),
        )
        // Resumes
        .route(
            "/api/v1/resumes",
            post(resumes::handle_upload_resume).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/resumes/analyze",
            post(resumes::handle_analyze_resume),
        )
        .route(
            "/api/v1/resumes/refine",
            post(resumes::handle_refine_position),
        )
        .with_state(state)
}
