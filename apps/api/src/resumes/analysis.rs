//! AI resume analysis: suggested open positions and per-position explanations.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, PLAIN_TEXT_SYSTEM};
use crate::llm_client::LlmClient;
use crate::matching::delegate::whole_score;
use crate::resumes::prompts::{ANALYZE_RESUME_PROMPT_TEMPLATE, REFINE_MATCH_PROMPT_TEMPLATE};

/// A position suggested by the model for a resume. Everything except the
/// title and score is best effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedPosition {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(deserialize_with = "whole_score")]
    pub match_score: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub application_url: String,
    #[serde(default)]
    pub company_description: String,
    #[serde(default)]
    pub culture: String,
    #[serde(default)]
    pub growth: String,
}

pub async fn analyze_resume(
    resume_text: &str,
    llm: &LlmClient,
) -> Result<Vec<SuggestedPosition>, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("Resume text is empty".to_string()));
    }

    let prompt = ANALYZE_RESUME_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
    let positions: Vec<SuggestedPosition> = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to analyze resume: {e}")))?;

    info!("Resume analysis suggested {} positions", positions.len());
    Ok(order_by_score(positions))
}

pub async fn refine_position(
    position: SuggestedPosition,
    resume_text: &str,
    llm: &LlmClient,
) -> Result<SuggestedPosition, AppError> {
    let position_json =
        serde_json::to_string_pretty(&position).map_err(|e| AppError::Internal(e.into()))?;
    let prompt = REFINE_MATCH_PROMPT_TEMPLATE
        .replace("{position}", &position_json)
        .replace("{resume_text}", resume_text);

    let explanation = llm
        .call_text(&prompt, PLAIN_TEXT_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to refine job match: {e}")))?;

    Ok(SuggestedPosition {
        description: explanation,
        ..position
    })
}

/// Best match first; stable for equal scores. Scores are clamped to 0 – 100.
fn order_by_score(mut positions: Vec<SuggestedPosition>) -> Vec<SuggestedPosition> {
    for p in positions.iter_mut() {
        p.match_score = p.match_score.clamp(0, 100);
    }
    positions.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_json_payload;

    #[test]
    fn test_sparse_model_output_parses_and_orders() {
        let text = r#"[
            {"title": "Data Engineer", "matchScore": 72},
            {"title": "Rust Engineer", "company": "Ferrous", "matchScore": 91.2,
             "skills": ["tokio"]},
            {"title": "Analyst", "matchScore": 120}
        ]"#;
        let positions: Vec<SuggestedPosition> = parse_json_payload(text).unwrap();
        let ordered = order_by_score(positions);

        let titles: Vec<_> = ordered.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Analyst", "Rust Engineer", "Data Engineer"]);
        assert_eq!(ordered[0].match_score, 100);
        assert_eq!(ordered[1].match_score, 91);
        assert_eq!(ordered[1].skills, vec!["tokio"]);
    }
}
