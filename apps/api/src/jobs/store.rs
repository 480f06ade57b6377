//! Job board persistence: postings, applications and candidate profiles.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::models::{ApplicationRow, ApplicationWithJob, JobFilter, JobRow, ProfileRow};

pub const DUPLICATE_APPLICATION: &str = "You have already applied for this job";

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs matching `filter`, newest first.
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobRow>, AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError>;

    async fn create_job(&self, job: JobRow) -> Result<JobRow, AppError>;

    /// The user's applications, newest first, each with its job.
    async fn list_applications(&self, user_id: &str) -> Result<Vec<ApplicationWithJob>, AppError>;

    /// Fails with NotFound for an unknown job and Validation for a repeat application.
    async fn create_application(&self, application: ApplicationRow)
        -> Result<ApplicationRow, AppError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, AppError>;

    async fn upsert_profile(&self, profile: ProfileRow) -> Result<ProfileRow, AppError>;

    /// Attaches extracted resume text to the user's profile, creating it if needed.
    async fn save_resume(
        &self,
        user_id: &str,
        file_name: &str,
        text: &str,
    ) -> Result<ProfileRow, AppError> {
        let mut profile = self
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| ProfileRow::empty(user_id));
        profile.resume_file_name = Some(file_name.to_string());
        profile.resume_text = Some(text.to_string());
        profile.updated_at = Utc::now();
        self.upsert_profile(profile).await
    }
}

#[derive(Default)]
struct Board {
    jobs: Vec<JobRow>,
    applications: Vec<ApplicationRow>,
    profiles: HashMap<String, ProfileRow>,
}

#[derive(Default)]
pub struct InMemoryJobStore {
    board: RwLock<Board>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobRow>, AppError> {
        let mut jobs: Vec<JobRow> = self
            .board
            .read()
            .await
            .jobs
            .iter()
            .filter(|j| filter.matches(j))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(self.board.read().await.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn create_job(&self, job: JobRow) -> Result<JobRow, AppError> {
        self.board.write().await.jobs.push(job.clone());
        Ok(job)
    }

    async fn list_applications(&self, user_id: &str) -> Result<Vec<ApplicationWithJob>, AppError> {
        let board = self.board.read().await;
        let mut applications: Vec<ApplicationWithJob> = board
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| {
                board
                    .jobs
                    .iter()
                    .find(|j| j.id == a.job_id)
                    .map(|job| ApplicationWithJob {
                        application: a.clone(),
                        job: job.clone(),
                    })
            })
            .collect();
        applications.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(applications)
    }

    async fn create_application(
        &self,
        application: ApplicationRow,
    ) -> Result<ApplicationRow, AppError> {
        let mut board = self.board.write().await;
        if !board.jobs.iter().any(|j| j.id == application.job_id) {
            return Err(AppError::NotFound(format!(
                "Job {} not found",
                application.job_id
            )));
        }
        if board
            .applications
            .iter()
            .any(|a| a.job_id == application.job_id && a.user_id == application.user_id)
        {
            return Err(AppError::Validation(DUPLICATE_APPLICATION.to_string()));
        }
        board.applications.push(application.clone());
        Ok(application)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, AppError> {
        Ok(self.board.read().await.profiles.get(user_id).cloned())
    }

    async fn upsert_profile(&self, profile: ProfileRow) -> Result<ProfileRow, AppError> {
        self.board
            .write()
            .await
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE ($1::TEXT IS NULL
                   OR title ILIKE '%' || $1 || '%'
                   OR description ILIKE '%' || $1 || '%'
                   OR company ILIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR location ILIKE '%' || $2 || '%')
              AND ($3::TEXT IS NULL OR job_type = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.q.as_deref())
        .bind(filter.location.as_deref())
        .bind(filter.job_type.as_deref())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_job(&self, job: JobRow) -> Result<JobRow, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (id, title, company, description, requirements, location,
                 salary, job_type, employer_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.location)
        .bind(&job.salary)
        .bind(&job.job_type)
        .bind(&job.employer_id)
        .bind(job.created_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_applications(&self, user_id: &str) -> Result<Vec<ApplicationWithJob>, AppError> {
        let applications = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM job_applications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let job_ids: Vec<Uuid> = applications.iter().map(|a| a.job_id).collect();
        let jobs: HashMap<Uuid, JobRow> =
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ANY($1)")
                .bind(&job_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|j| (j.id, j))
                .collect();

        Ok(applications
            .into_iter()
            .filter_map(|application| {
                jobs.get(&application.job_id).cloned().map(|job| ApplicationWithJob {
                    application,
                    job,
                })
            })
            .collect())
    }

    async fn create_application(
        &self,
        application: ApplicationRow,
    ) -> Result<ApplicationRow, AppError> {
        if self.get_job(application.job_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Job {} not found",
                application.job_id
            )));
        }

        // UNIQUE (job_id, user_id) makes the duplicate check atomic.
        let inserted = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO job_applications (id, job_id, user_id, cover_letter, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (job_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.job_id)
        .bind(&application.user_id)
        .bind(&application.cover_letter)
        .bind(&application.status)
        .bind(application.created_at)
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or_else(|| AppError::Validation(DUPLICATE_APPLICATION.to_string()))
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn upsert_profile(&self, profile: ProfileRow) -> Result<ProfileRow, AppError> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles
                (user_id, full_name, headline, location, skills, experience_years,
                 resume_text, resume_file_name, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE
                SET full_name = EXCLUDED.full_name,
                    headline = EXCLUDED.headline,
                    location = EXCLUDED.location,
                    skills = EXCLUDED.skills,
                    experience_years = EXCLUDED.experience_years,
                    resume_text = EXCLUDED.resume_text,
                    resume_file_name = EXCLUDED.resume_file_name,
                    updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.full_name)
        .bind(&profile.headline)
        .bind(&profile.location)
        .bind(&profile.skills)
        .bind(profile.experience_years)
        .bind(&profile.resume_text)
        .bind(&profile.resume_file_name)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job(title: &str, minutes_ago: i64) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: "Acme".to_string(),
            description: "Ship features".to_string(),
            requirements: vec!["Rust".to_string()],
            location: "Remote".to_string(),
            salary: Some("$120,000".to_string()),
            job_type: "FULL_TIME".to_string(),
            employer_id: "employer-1".to_string(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn application(job_id: Uuid, user_id: &str) -> ApplicationRow {
        ApplicationRow {
            id: Uuid::new_v4(),
            job_id,
            user_id: user_id.to_string(),
            cover_letter: None,
            status: "PENDING".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_jobs_newest_first() {
        let store = InMemoryJobStore::new();
        store.create_job(job("Old", 60)).await.unwrap();
        store.create_job(job("New", 1)).await.unwrap();

        let titles: Vec<_> = store
            .list_jobs(&JobFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.title)
            .collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_duplicate_application_rejected() {
        let store = InMemoryJobStore::new();
        let posted = store.create_job(job("Backend", 5)).await.unwrap();

        store
            .create_application(application(posted.id, "user-1"))
            .await
            .unwrap();
        let err = store
            .create_application(application(posted.id, "user-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == DUPLICATE_APPLICATION));

        store
            .create_application(application(posted.id, "user-2"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_application_for_unknown_job_is_not_found() {
        let store = InMemoryJobStore::new();
        let err = store
            .create_application(application(Uuid::new_v4(), "user-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_applications_are_scoped_to_user_and_carry_job() {
        let store = InMemoryJobStore::new();
        let posted = store.create_job(job("Frontend", 5)).await.unwrap();
        store
            .create_application(application(posted.id, "user-1"))
            .await
            .unwrap();
        store
            .create_application(application(posted.id, "user-2"))
            .await
            .unwrap();

        let mine = store.list_applications("user-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].job.title, "Frontend");
    }

    #[tokio::test]
    async fn test_save_resume_creates_profile() {
        let store = InMemoryJobStore::new();
        let profile = store
            .save_resume("user-1", "cv.pdf", "Rust engineer, 6 years")
            .await
            .unwrap();
        assert_eq!(profile.resume_file_name.as_deref(), Some("cv.pdf"));

        let stored = store.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(stored.resume_text.as_deref(), Some("Rust engineer, 6 years"));
    }
}
