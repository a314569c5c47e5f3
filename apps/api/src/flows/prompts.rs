// Prompt templates for the job-search flows.
// Marker syntax is documented in flow::template. Output shape is not described
// here: the backend appends the output schema to the system prompt.

/// System prompt for job description extraction.
pub const EXTRACTION_SYSTEM: &str = "You are an expert technical recruiter. \
    You read job descriptions carefully and report only what they actually ask for.";

pub const EXTRACTION_PROMPT: &str = r#"Extract the key points from the following job description.

JOB DESCRIPTION:
{{jobDescription}}

Rules:
- keyRequirements: explicit must-haves — minimum years, degrees, certifications, clearances, work authorisation.
- keySkills: concrete skills, languages, frameworks, and tools the role uses.
- Keep each item short (a few words). Do NOT invent items that are not in the text."#;

/// System prompt for match explanation.
pub const MATCH_SYSTEM: &str = "You are a candid career advisor. \
    You compare a candidate to a job and explain the fit honestly, including gaps.";

pub const MATCH_PROMPT: &str = r#"Assess how well this candidate matches the job.

JOB TITLE: {{jobTitle}}

JOB DESCRIPTION:
{{jobDescription}}

CANDIDATE PROFILE:
{{userProfile}}

CANDIDATE EXPERIENCE: {{experienceSummary}}

Return matchScore as a number from 0 (no fit) to 100 (ideal fit) and a matchExplanation of
3-5 sentences naming the strongest overlaps and the most important gaps."#;

/// System prompt for resume generation.
pub const RESUME_SYSTEM: &str = "You are an expert resume writer. \
    You write factual, tailored resumes using only information the candidate has provided.";

pub const RESUME_PROMPT: &str = r#"Write a resume tailored to the job description below.

JOB DESCRIPTION:
{{jobDescription}}

CANDIDATE PROFILE (source of truth — ONLY use facts from here):
{{userProfile}}

RECENT ACTIVITY ON THE PLATFORM:
{{@tool getUserHistory userId=userId}}

POINTS TO MENTION:
{{#each pointsToMention}}- {{this}}
{{/each}}
HARD RULES:
1. Use Markdown with sections: Summary, Skills, Experience, Education.
2. Do NOT invent employers, dates, titles, or metrics.
3. Work every point to mention into the most relevant section.
Return the complete resume text in the resume field."#;

/// System prompt for cover letter generation.
pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach who writes concise, \
    specific cover letters in a professional but warm voice.";

pub const COVER_LETTER_PROMPT: &str = r#"Write a cover letter for the candidate below.

COMPANY: {{companyName}}

JOB DESCRIPTION:
{{jobDescription}}

CANDIDATE PROFILE:
{{userProfile}}

POINTS TO MENTION:
{{#each pointsToMention}}- {{this}}
{{/each}}
Keep it under 400 words, address it to the hiring team, and close with a call to action.
Return the complete letter in the coverLetter field."#;
