pub const MATCH_JOBS_PROMPT_TEMPLATE: &str = r#"Score how well each job below fits the candidate profile.

Return a JSON object with exactly this shape:
{
  "matches": [
    {
      "jobId": "<id of the job, copied verbatim>",
      "score": <integer 0-100>,
      "explanation": "<two or three sentences>",
      "keyMatches": ["<skill or experience that fits>"],
      "gapAreas": ["<requirement the candidate does not yet cover>"]
    }
  ]
}

Rules:
1. Include every job exactly once, using the job's id.
2. Base scores only on the profile and job data given; do not assume skills that are not listed.
3. 90-100 means an excellent fit, 50 an even fit, below 30 a poor fit.

Candidate profile:
{profile}

Jobs:
{jobs}"#;
