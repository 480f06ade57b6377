pub const JOB_DESCRIPTION_PROMPT_TEMPLATE: &str = r#"Rewrite the following job description so it is clear, well structured and attractive to qualified candidates.

Rules:
1. Keep every concrete fact (responsibilities, requirements, location, compensation) exactly as given.
2. Do not invent benefits, technologies or company details.
3. Use short paragraphs followed by a bullet list of responsibilities.
4. Return only the rewritten description.

Job title: {title}
Company: {company}

Original description:
{description}"#;

pub fn job_description_prompt(title: &str, company: &str, description: &str) -> String {
    JOB_DESCRIPTION_PROMPT_TEMPLATE
        .replace("{title}", title)
        .replace("{company}", company)
        .replace("{description}", description)
}
