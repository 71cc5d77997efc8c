/// Shared constants so the CLI, use cases and pipeline stages agree on names and defaults

// Default file names (used in CLI)
pub const DEFAULT_CONFIG_FILE: &str = "refinery.toml";
pub const DEFAULT_CORPUS_FILE: &str = "resume_bullets.json";
pub const DEFAULT_CLEANED_FILE: &str = "cleaned_resumes.json";
pub const DEFAULT_DATASET_FILE: &str = "augmented_resumes.json";

/// Current dataset document version
pub const DATASET_FORMAT_VERSION: u32 = 1;

/// Minimum length, in characters, of a usable bullet
pub const MIN_BULLET_LENGTH: usize = 60;

/// Rupees per US dollar before jitter
pub const BASE_INR_PER_USD: i64 = 85;

/// 1 crore and 1 lakh in rupees
pub const INR_PER_CRORE: f64 = 10_000_000.0;
pub const INR_PER_LAKH: f64 = 100_000.0;

/// Connectives that introduce a financial outcome
pub const FINANCIAL_CONNECTIVES: &[&str] = &[
    "totaling",
    "yielding",
    "resulting in",
    "generating",
    "saving the company",
    "contributing to",
];

/// Synonyms swapped in for the first "resulting in"
pub const VARIETY_CONNECTORS: &[&str] = &[
    "yielding",
    "driving",
    "leading to",
    "facilitating",
    "contributing to",
];

// Generation defaults
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const GENERATION_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that writes perfect resume bullet points.";
/// How many real bullets are quoted in the generation prompt
pub const PROMPT_SEED_COUNT: usize = 5;

// Resume parsing
pub const RESUME_PARSER_TEMPERATURE: f64 = 0.0;
pub const RESUME_PARSER_SYSTEM_PROMPT: &str = r#"You are an expert Resume Parser.
Extract the resume data from the text provided below into the following strict JSON format:
{
    "profile": { "name": "", "email": "", "phone": "", "linkedin": "", "github": "", "website": "", "summary": "" },
    "experience": [ { "id": "uuid", "company": "", "role": "", "startDate": "", "endDate": "", "location": "", "bullets": [] } ],
    "projects": [ { "id": "uuid", "name": "", "description": "", "technologies": [], "link": "", "bullets": [] } ],
    "education": [ { "id": "uuid", "school": "", "degree": "", "field": "", "startDate": "", "endDate": "", "grade": "" } ],
    "responsibilities": [ { "id": "uuid", "title": "", "organization": "", "location": "", "startDate": "", "endDate": "", "description": "" } ],
    "achievements": [ "Achievement 1 with details", "Achievement 2 with details" ],
    "skills": []
}

SECTION HEADER MAPPINGS:
- EXPERIENCE: "Work Experience", "Professional Experience", "Employment History", "Career History", "Work History", "Internships", "Relevant Experience"
- EDUCATION: "Education", "Academic Background", "Educational Qualifications", "Degrees", "Academic Credentials"
- PROJECTS: "Projects", "Personal Projects", "Academic Projects", "Key Projects", "Technical Projects", "Portfolio", "Side Projects"
- SKILLS: "Skills", "Technical Skills", "Core Competencies", "Key Skills", "Expertise", "Proficiencies", "Tools & Technologies"
- ACHIEVEMENTS: "Achievements", "Certifications", "Awards", "Honors", "Accomplishments", "Courses", "Licenses", "Publications"
- RESPONSIBILITIES: "Positions of Responsibility", "Leadership", "Extracurriculars", "Volunteer Work", "Activities", "Organizational Roles"

Rules:
- If a field is missing, use empty string or empty list.
- Do not invent data.
- "role" is the job title and "company" is the employer. Do not swap them.
- Return ONLY the raw JSON string. No markdown formatting."#;
