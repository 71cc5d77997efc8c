use anyhow::{Context, Result};
use rand::RngCore;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::ports::BulletGeneratorPort;
use crate::config::AugmentSettings;
use crate::constants::PROMPT_SEED_COUNT;
use crate::domain::Domain;
use crate::pipeline::processing::normalize::{BulletNormalizationPipeline, Pass};
use crate::storage::DatasetStore;

/// User prompt asking for `count` new bullets in the style of `seeds`
pub fn build_generation_prompt(domain: Domain, seeds: &[String], count: usize) -> String {
    let examples = seeds
        .iter()
        .take(PROMPT_SEED_COUNT)
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an expert Resume Writer for Top Tech Companies.\n\
         JOB: Generate {count} HIGH-QUALITY resume bullet points for domain: \"{domain}\".\n\
         STYLE: Use Action Verbs + Context + Metrics (Numbers, %, $).\n\
         EXAMPLES:\n\
         {examples}\n\
         \n\
         INSTRUCTIONS:\n\
         1. Generate {count} NEW, UNIQUE bullets.\n\
         2. STAR method.\n\
         3. MUST have metrics.\n\
         4. Output format: Just the bullet text, starting with \"- \".\n"
    )
}

/// Pulls bullet lines out of a model response.
///
/// `- ` and `* ` markers are stripped; numbered lines (`1. ...`) longer
/// than 10 characters lose their first token. Anything else is chatter.
pub fn parse_generated_bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
                return Some(rest.trim().to_string());
            }
            if line.chars().count() > 10 && line.starts_with(|c: char| c.is_ascii_digit()) {
                return line
                    .split_once(' ')
                    .map(|(_, rest)| rest.trim().to_string());
            }
            None
        })
        .filter(|bullet| !bullet.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DomainAugmentOutcome {
    Augmented { added: usize, failed_batches: usize },
    /// Already holds more synthetic bullets than the threshold
    Skipped { synthetic: usize },
    NotInDataset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainAugmentStats {
    pub domain: Domain,
    #[serde(flatten)]
    pub outcome: DomainAugmentOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AugmentReport {
    pub domains: Vec<DomainAugmentStats>,
    pub total_real: usize,
    pub total_synthetic: usize,
}

/// Grows the synthetic side of a dataset with generated, humanized bullets
pub struct AugmentUseCase {
    generator: Box<dyn BulletGeneratorPort>,
    humanizer: BulletNormalizationPipeline,
    settings: AugmentSettings,
}

impl AugmentUseCase {
    pub fn new(
        generator: Box<dyn BulletGeneratorPort>,
        humanizer: BulletNormalizationPipeline,
        settings: AugmentSettings,
    ) -> Self {
        Self {
            generator,
            humanizer,
            settings,
        }
    }

    /// Use case humanizing with the built-in `humanize` pass
    pub fn with_default_humanizer(generator: Box<dyn BulletGeneratorPort>, settings: AugmentSettings) -> Self {
        Self::new(generator, BulletNormalizationPipeline::for_pass(Pass::Humanize), settings)
    }

    /// Augment every target domain, saving after each one that was processed
    pub async fn run(&self, store: &dyn DatasetStore, rng: &mut dyn RngCore) -> Result<AugmentReport> {
        let mut dataset = store.load().context("Failed to load dataset")?;
        let mut report = AugmentReport::default();

        for &domain in &self.settings.target_domains {
            let Some(record) = dataset.record(domain) else {
                warn!(%domain, "domain not in dataset, skipping");
                report.domains.push(DomainAugmentStats {
                    domain,
                    outcome: DomainAugmentOutcome::NotInDataset,
                });
                continue;
            };

            let existing = record.synthetic.len();
            if existing > self.settings.skip_threshold {
                info!(%domain, synthetic = existing, "enough synthetic data, skipping");
                report.domains.push(DomainAugmentStats {
                    domain,
                    outcome: DomainAugmentOutcome::Skipped { synthetic: existing },
                });
                continue;
            }

            info!(%domain, "🔄 processing domain");
            let seeds: Vec<String> = record.real.iter().take(PROMPT_SEED_COUNT).cloned().collect();
            let mut generated = Vec::new();
            let mut failed_batches = 0;

            for batch in 1..=self.settings.batches {
                info!(%domain, batch, batches = self.settings.batches, "requesting batch");
                match self
                    .generator
                    .generate(domain, &seeds, self.settings.batch_size)
                    .await
                {
                    Ok(bullets) => {
                        generated.extend(
                            bullets
                                .iter()
                                .map(|b| self.humanizer.normalize(b, domain, rng)),
                        );
                    }
                    Err(e) => {
                        error!(%domain, batch, error = %e, "batch generation failed, skipping");
                        failed_batches += 1;
                    }
                }
                tokio::time::sleep(self.settings.pause()).await;
            }

            let added = generated.len();
            info!(%domain, added, "generated new bullets");
            if let Some(record) = dataset.record_mut(domain) {
                record.synthetic.extend(generated);
            }
            store
                .save(&mut dataset)
                .with_context(|| format!("Failed to save progress for {}", domain))?;

            report.domains.push(DomainAugmentStats {
                domain,
                outcome: DomainAugmentOutcome::Augmented {
                    added,
                    failed_batches,
                },
            });
        }

        let (total_real, total_synthetic) = dataset.totals();
        report.total_real = total_real;
        report.total_synthetic = total_synthetic;
        info!(total_real, total_synthetic, "✅ augmentation finished");
        Ok(report)
    }
}
