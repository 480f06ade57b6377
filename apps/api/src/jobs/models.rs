use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "FULL_TIME",
            JobType::PartTime => "PART_TIME",
            JobType::Contract => "CONTRACT",
            JobType::Freelance => "FREELANCE",
            JobType::Internship => "INTERNSHIP",
        }
    }
}

impl FromStr for JobType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "FULL_TIME" => Ok(JobType::FullTime),
            "PART_TIME" => Ok(JobType::PartTime),
            "CONTRACT" => Ok(JobType::Contract),
            "FREELANCE" => Ok(JobType::Freelance),
            "INTERNSHIP" => Ok(JobType::Internship),
            other => Err(AppError::Validation(format!("Unknown job type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub salary: Option<String>,
    /// One of the `JobType` wire names.
    #[serde(rename = "type")]
    pub job_type: String,
    pub employer_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: String,
    pub cover_letter: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub job: JobRow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRow {
    pub user_id: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub resume_text: Option<String>,
    pub resume_file_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            full_name: None,
            headline: None,
            location: None,
            skills: vec![],
            experience_years: None,
            resume_text: None,
            resume_file_name: None,
            updated_at: Utc::now(),
        }
    }
}

/// Search filters for the public job board.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    pub q: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
}

impl JobFilter {
    /// Blank parameters are treated as absent.
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            q: clean(self.q),
            location: clean(self.location),
            job_type: clean(self.job_type),
        }
    }

    pub fn matches(&self, job: &JobRow) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        let q_ok = self.q.as_deref().map_or(true, |q| {
            contains(&job.title, q) || contains(&job.description, q) || contains(&job.company, q)
        });
        let location_ok = self
            .location
            .as_deref()
            .map_or(true, |l| contains(&job.location, l));
        let type_ok = self.job_type.as_deref().map_or(true, |t| job.job_type == t);
        q_ok && location_ok && type_ok
    }
}
