use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::jobs::models::JobRow;
use crate::matching::delegate::JobMatch;

/// A job enriched with its match verdict, ready for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedJob {
    #[serde(flatten)]
    pub job: JobRow,
    pub match_score: u8,
    pub match_explanation: String,
    pub key_matches: Vec<String>,
    pub gap_areas: Vec<String>,
}

/// Best score first. Equal scores keep the delegate's order. Matches that
/// reference a job we do not know are dropped, and a job scored more than
/// once keeps only its highest-ranked match.
pub fn rank_matches(matches: Vec<JobMatch>, jobs: &[JobRow]) -> Vec<MatchedJob> {
    let mut matches = matches;
    for m in matches.iter_mut() {
        m.score = m.score.clamp(0, 100);
    }
    matches.sort_by(|a, b| b.score.cmp(&a.score));

    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter_map(|m| {
            if seen.contains(&m.job_id) {
                warn!("Dropping repeated match for job id '{}'", m.job_id);
                return None;
            }
            let Some(job) = jobs.iter().find(|j| j.id.to_string() == m.job_id) else {
                warn!("Dropping match for unknown job id '{}'", m.job_id);
                return None;
            };
            seen.insert(m.job_id.clone());
            Some(MatchedJob {
                job: job.clone(),
                match_score: m.score as u8,
                match_explanation: m.explanation,
                key_matches: m.key_matches,
                gap_areas: m.gap_areas,
            })
        })
        .collect()
}
