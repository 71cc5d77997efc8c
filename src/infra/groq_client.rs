use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::app::augment_use_case::{build_generation_prompt, parse_generated_bullets};
use crate::app::ports::{BulletGeneratorPort, ResumeExtractorPort};
use crate::config::Credentials;
use crate::constants::{
    GENERATION_SYSTEM_PROMPT, GROQ_API_URL, GROQ_MODEL, RESUME_PARSER_SYSTEM_PROMPT,
    RESUME_PARSER_TEMPERATURE,
};
use crate::domain::Domain;
use crate::error::{RefineryError, Result};

const GENERATION_TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 2048;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Groq's OpenAI-compatible chat completions API, used for bullet generation
/// and resume extraction
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GroqClient {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key: credentials.groq_api_key.clone(),
            model: GROQ_MODEL.to_string(),
            endpoint: GROQ_API_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request<'a>(&'a self, system: &'a str, prompt: &'a str, temperature: f64) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            max_tokens: MAX_TOKENS,
            top_p: 1.0,
            stream: false,
        }
    }

    /// Sends one chat completion and returns the first choice's content
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RefineryError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RefineryError::Api {
                status: status.as_u16(),
                message: "response contained no choices".to_string(),
            })
    }
}

/// Best-effort message from an error body (`{"error": {"message": ..}}` or raw text)
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl BulletGeneratorPort for GroqClient {
    #[instrument(skip(self, seeds), fields(model = %self.model))]
    async fn generate(&self, domain: Domain, seeds: &[String], count: usize) -> Result<Vec<String>> {
        let prompt = build_generation_prompt(domain, seeds, count);
        let content = self
            .complete(&self.request(GENERATION_SYSTEM_PROMPT, &prompt, GENERATION_TEMPERATURE))
            .await?;

        let bullets = parse_generated_bullets(&content);
        debug!(%domain, requested = count, received = bullets.len(), "parsed generated bullets");
        Ok(bullets)
    }
}

#[async_trait]
impl ResumeExtractorPort for GroqClient {
    #[instrument(skip(self, resume_text), fields(model = %self.model, chars = resume_text.len()))]
    async fn extract(&self, resume_text: &str) -> Result<String> {
        let prompt = format!("Resume Text:\n{}", resume_text);
        self.complete(&self.request(RESUME_PARSER_SYSTEM_PROMPT, &prompt, RESUME_PARSER_TEMPERATURE))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GroqClient {
        GroqClient::new(&Credentials {
            groq_api_key: "test-key".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let client = client().with_model("llama-test");
        let body = serde_json::to_value(client.request(GENERATION_SYSTEM_PROMPT, "write bullets", 0.7)).unwrap();
        assert_eq!(body["model"], "llama-test");
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], GENERATION_SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["content"], "write bullets");
    }

    #[test]
    fn test_resume_request_is_deterministic() {
        let client = client();
        let body = serde_json::to_value(client.request(RESUME_PARSER_SYSTEM_PROMPT, "Resume Text:\nAsha", 0.0)).unwrap();
        assert_eq!(body["temperature"], 0.0);
        assert!(body["messages"][0]["content"].as_str().unwrap().contains("strict JSON"));
    }

    #[test]
    fn test_api_error_message_prefers_json_message() {
        assert_eq!(
            api_error_message(r#"{"error": {"message": "rate limited", "type": "tokens"}}"#),
            "rate limited"
        );
        assert_eq!(api_error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_response_without_choices_decodes() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
