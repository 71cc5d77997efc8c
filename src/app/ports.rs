use async_trait::async_trait;

use crate::domain::Domain;
use crate::error::Result;

/// Source of freshly generated resume bullets
#[async_trait]
pub trait BulletGeneratorPort: Send + Sync {
    /// Ask for `count` new bullets for `domain`, styled after `seeds`.
    ///
    /// Implementations return whatever usable bullets they got back, which
    /// may be fewer than `count`.
    async fn generate(&self, domain: Domain, seeds: &[String], count: usize) -> Result<Vec<String>>;
}

/// Turns plain resume text into the model's JSON reply
#[async_trait]
pub trait ResumeExtractorPort: Send + Sync {
    /// Returns the raw reply text; fences and validation are handled by the caller
    async fn extract(&self, resume_text: &str) -> Result<String>;
}
