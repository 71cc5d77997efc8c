use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::ports::ResumeExtractorPort;
use crate::error::{RefineryError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub id: String,
    pub company: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub link: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: String,
    pub school: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
    pub grade: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponsibilityEntry {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

/// Structured resume as returned by the extraction model.
///
/// Every field defaults to empty so partial replies still decode; a reply
/// whose fields have the wrong shape is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResume {
    pub profile: Profile,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
    pub education: Vec<EducationEntry>,
    pub responsibilities: Vec<ResponsibilityEntry>,
    pub achievements: Vec<String>,
    pub skills: Vec<String>,
}

impl ParsedResume {
    /// Experience and project bullets, in resume order
    pub fn bullets(&self) -> impl Iterator<Item = &str> {
        self.experience
            .iter()
            .flat_map(|e| e.bullets.iter())
            .chain(self.projects.iter().flat_map(|p| p.bullets.iter()))
            .map(String::as_str)
    }
}

/// Removes markdown code fences the model wraps around JSON despite being told not to
pub fn strip_json_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Decodes a model reply into a [`ParsedResume`]
pub fn decode_resume_reply(reply: &str) -> Result<ParsedResume> {
    let body = strip_json_fences(reply);
    serde_json::from_str(body).map_err(|e| {
        debug!(reply = %body, "undecodable resume reply");
        RefineryError::MalformedReply(e.to_string())
    })
}

pub struct ParseResumeUseCase {
    extractor: Box<dyn ResumeExtractorPort>,
}

impl ParseResumeUseCase {
    pub fn new(extractor: Box<dyn ResumeExtractorPort>) -> Self {
        Self { extractor }
    }

    pub async fn parse_text(&self, text: &str) -> Result<ParsedResume> {
        let reply = self.extractor.extract(text).await?;
        let resume = decode_resume_reply(&reply)?;
        info!(
            experience = resume.experience.len(),
            projects = resume.projects.len(),
            bullets = resume.bullets().count(),
            "parsed resume"
        );
        Ok(resume)
    }

    /// Reads a plain-text resume and parses it. Blank files never reach the model.
    pub async fn parse_file(&self, path: &Path) -> Result<ParsedResume> {
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Err(RefineryError::EmptyResume(path.to_path_buf()));
        }
        self.parse_text(&text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_json_fence() {
        assert_eq!(strip_json_fences("```json\n{\"skills\": []}\n```\n"), "{\"skills\": []}");
        assert_eq!(strip_json_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_json_fences("  {}  "), "{}");
    }

    #[test]
    fn test_decodes_camel_case_dates_and_defaults() {
        let reply = r#"```json
{"profile": {"name": "Asha Rao"},
 "experience": [{"company": "Pinch", "role": "Founders Office Intern", "startDate": "Jan 2023", "bullets": ["Ran 4 pricing tests"]}],
 "skills": ["SQL"]}
```"#;
        let resume = decode_resume_reply(reply).unwrap();
        assert_eq!(resume.profile.name, "Asha Rao");
        assert_eq!(resume.experience[0].start_date, "Jan 2023");
        assert_eq!(resume.experience[0].end_date, "");
        assert!(resume.education.is_empty());
        assert_eq!(resume.bullets().collect::<Vec<_>>(), vec!["Ran 4 pricing tests"]);
    }

    #[test]
    fn test_invalid_json_is_malformed_reply() {
        let err = decode_resume_reply("Here is the resume: {\"profile\": ").unwrap_err();
        assert!(matches!(err, RefineryError::MalformedReply(_)));
    }

    #[test]
    fn test_wrong_shape_is_malformed_reply() {
        let err = decode_resume_reply(r#"{"skills": "SQL, Python"}"#).unwrap_err();
        assert!(matches!(err, RefineryError::MalformedReply(_)));
    }
}
