use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::models::JobRow;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::matching::prompts::MATCH_JOBS_PROMPT_TEMPLATE;

/// One scored job as returned by the delegate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub job_id: String,
    /// Nominally 0 – 100; clamped by the ranking step.
    #[serde(deserialize_with = "whole_score")]
    pub score: i64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub key_matches: Vec<String>,
    #[serde(default)]
    pub gap_areas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    #[serde(default)]
    pub matches: Vec<JobMatch>,
}

/// Models occasionally emit `87.5`; round instead of failing the whole answer.
pub(crate) fn whole_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round() as i64)
}

/// Scores jobs against a candidate profile. Implement this to swap backends
/// without touching the handler.
///
/// Carried in `AppState` as `Arc<dyn MatchingDelegate>`.
#[async_trait]
pub trait MatchingDelegate: Send + Sync {
    async fn match_jobs(&self, profile: &Value, jobs: &[JobRow]) -> Result<MatchResponse, AppError>;
}

/// Generative-AI matcher. Treated as a black box: the prompt asks for
/// pre-scored JSON and nothing is recomputed locally.
pub struct LlmMatchingDelegate(pub LlmClient);

#[async_trait]
impl MatchingDelegate for LlmMatchingDelegate {
    async fn match_jobs(&self, profile: &Value, jobs: &[JobRow]) -> Result<MatchResponse, AppError> {
        if jobs.is_empty() {
            return Ok(MatchResponse::default());
        }

        let prompt = build_match_prompt(profile, jobs)?;
        let response: MatchResponse = self
            .0
            .call_json(&prompt, JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Job matching failed: {e}")))?;

        info!(
            "Matching delegate scored {} of {} jobs",
            response.matches.len(),
            jobs.len()
        );
        Ok(response)
    }
}

fn build_match_prompt(profile: &Value, jobs: &[JobRow]) -> Result<String, AppError> {
    // Only the fields relevant to fit; ids as strings so they round-trip verbatim.
    let compact_jobs: Vec<Value> = jobs
        .iter()
        .map(|j| {
            json!({
                "id": j.id.to_string(),
                "title": j.title,
                "company": j.company,
                "description": j.description,
                "requirements": j.requirements,
                "location": j.location,
                "type": j.job_type,
            })
        })
        .collect();

    let profile_json =
        serde_json::to_string_pretty(profile).map_err(|e| AppError::Internal(e.into()))?;
    let jobs_json =
        serde_json::to_string_pretty(&compact_jobs).map_err(|e| AppError::Internal(e.into()))?;

    Ok(MATCH_JOBS_PROMPT_TEMPLATE
        .replace("{profile}", &profile_json)
        .replace("{jobs}", &jobs_json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_json_payload;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_parses_delegate_output_with_fractional_score() {
        let text = r#"```json
        {"matches": [{"jobId": "j1", "score": 87.6, "explanation": "Strong Rust",
                      "keyMatches": ["Rust"], "gapAreas": []},
                     {"jobId": "j2", "score": 40}]}
        ```"#;
        let response: MatchResponse = parse_json_payload(text).unwrap();
        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].score, 88);
        assert_eq!(response.matches[0].key_matches, vec!["Rust"]);
        assert!(response.matches[1].explanation.is_empty());
    }

    #[test]
    fn test_prompt_embeds_job_ids_and_profile() {
        let id = Uuid::new_v4();
        let job = JobRow {
            id,
            title: "Rust Engineer".to_string(),
            company: "Ferrous".to_string(),
            description: "Build services".to_string(),
            requirements: vec!["tokio".to_string()],
            location: "Remote".to_string(),
            salary: None,
            job_type: "FULL_TIME".to_string(),
            employer_id: "e1".to_string(),
            created_at: Utc::now(),
        };
        let prompt = build_match_prompt(&json!({ "skills": ["axum"] }), &[job]).unwrap();
        assert!(prompt.contains(&id.to_string()));
        assert!(prompt.contains("axum"));
        assert!(!prompt.contains("{jobs}"));
    }
}
