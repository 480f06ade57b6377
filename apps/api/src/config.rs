use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL persistence. When unset, contracts, jobs and profiles live in memory.
    pub database_url: Option<String>,
    pub s3: Option<S3Config>,
    pub storage_timeout_secs: u64,
    pub google_ai_api_key: String,
    pub llm_model: String,
    pub enhance_job_descriptions: bool,
    pub port: u16,
    pub rust_log: String,
}

/// Object storage used for contract snapshots (MinIO locally, S3 in production).
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3 = match (optional_env("S3_BUCKET"), optional_env("S3_ENDPOINT")) {
            (Some(bucket), Some(endpoint)) => Some(S3Config {
                bucket,
                endpoint,
                region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            _ => None,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            s3,
            storage_timeout_secs: optional_env("STORAGE_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("STORAGE_TIMEOUT_SECS must be a whole number of seconds")?
                .unwrap_or(10),
            google_ai_api_key: require_env("GOOGLE_AI_API_KEY")?,
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            enhance_job_descriptions: optional_env("ENHANCE_JOB_DESCRIPTIONS")
                .map(|v| v.parse::<bool>())
                .transpose()
                .context("ENHANCE_JOB_DESCRIPTIONS must be true or false")?
                .unwrap_or(true),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
impl Config {
    /// In-memory everything, no AI rewrites.
    pub fn for_tests() -> Self {
        Config {
            database_url: None,
            s3: None,
            storage_timeout_secs: 1,
            google_ai_api_key: "test-key".to_string(),
            llm_model: "gemini-2.0-flash".to_string(),
            enhance_job_descriptions: false,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
