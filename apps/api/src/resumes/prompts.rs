pub const ANALYZE_RESUME_PROMPT_TEMPLATE: &str = r#"You are a professional resume analyst. Analyze this resume and suggest job positions that match it and are currently open for applications.
Start with positions near the candidate's location, then widen the search area.

Respond with a JSON array with exactly this structure:
[
  {
    "id": "1",
    "title": "Software Engineer",
    "company": "Tech Company",
    "description": "Detailed job description",
    "requirements": ["requirement1", "requirement2"],
    "matchScore": 85,
    "location": "San Francisco, CA",
    "salary": "$120,000 - $150,000",
    "jobType": "Full-time",
    "experience": "3-5 years",
    "skills": ["skill1", "skill2"],
    "benefits": ["benefit1", "benefit2"],
    "applicationUrl": "https://company.com/careers/position",
    "companyDescription": "Brief company description",
    "culture": "Company culture description",
    "growth": "Growth opportunities description"
  }
]

Rules:
1. Provide realistic and detailed information.
2. Match requirements and skills against the resume content.
3. Use real company names and locations.
4. applicationUrl must link directly to the application page.
5. Salary ranges must be realistic for the role and location.

Resume text:
{resume_text}"#;

pub const REFINE_MATCH_PROMPT_TEMPLATE: &str = r#"Explain why this job position is a good match for the resume. Cover:
1. How the candidate's skills align with the role
2. How their experience matches the requirements
3. Growth potential in this position
4. Cultural fit with the company

Job position:
{position}

Resume:
{resume_text}"#;
