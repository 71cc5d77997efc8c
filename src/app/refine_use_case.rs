use anyhow::{Context, Result};
use rand::RngCore;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::Domain;
use crate::pipeline::processing::normalize::registry::TerminologyRegistry;
use crate::pipeline::processing::normalize::{BulletNormalizationPipeline, Pass, PipelineConfig};
use crate::storage::{Dataset, DatasetStore};

/// Per-domain outcome of a refinement pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainRefineStats {
    pub domain: Domain,
    pub processed: usize,
    pub changed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefineReport {
    pub pass: Pass,
    pub domains: Vec<DomainRefineStats>,
    /// Target domains absent from the dataset
    pub missing: Vec<Domain>,
}

impl RefineReport {
    pub fn total_processed(&self) -> usize {
        self.domains.iter().map(|d| d.processed).sum()
    }
}

/// Rewrites the synthetic bullets of a dataset with one normalization pass
pub struct RefineUseCase {
    pass: Pass,
    pipeline: BulletNormalizationPipeline,
}

impl RefineUseCase {
    pub fn new(pass: Pass, config: &PipelineConfig) -> Self {
        Self {
            pass,
            pipeline: BulletNormalizationPipeline::new(config, TerminologyRegistry::for_pass(pass)),
        }
    }

    /// Use case with the built-in settings of `pass`
    pub fn for_pass(pass: Pass) -> Self {
        Self::new(pass, &pass.config())
    }

    /// Refine `dataset` in memory. Real bullets are never touched.
    pub fn refine(&self, dataset: &mut Dataset, rng: &mut dyn RngCore) -> RefineReport {
        let mut report = RefineReport {
            pass: self.pass,
            domains: Vec::new(),
            missing: Vec::new(),
        };

        for &domain in self.pass.target_domains() {
            let Some(record) = dataset.record_mut(domain) else {
                report.missing.push(domain);
                continue;
            };

            let mut changed = 0;
            for bullet in record.synthetic.iter_mut() {
                let refined = self.pipeline.normalize(bullet, domain, rng);
                if refined != *bullet {
                    changed += 1;
                    *bullet = refined;
                }
            }

            info!(pass = %self.pass, %domain, processed = record.synthetic.len(), changed, "refined synthetic bullets");
            report.domains.push(DomainRefineStats {
                domain,
                processed: record.synthetic.len(),
                changed,
            });
        }

        if !report.missing.is_empty() {
            warn!(pass = %self.pass, missing = ?report.missing, "target domains not in dataset");
        }
        report
    }

    /// Load, refine and save the dataset held by `store`
    pub fn run(&self, store: &dyn DatasetStore, rng: &mut dyn RngCore) -> Result<RefineReport> {
        let mut dataset = store.load().context("Failed to load dataset")?;
        let report = self.refine(&mut dataset, rng);
        store
            .save(&mut dataset)
            .context("Failed to save refined dataset")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DomainRecord, InMemoryStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.domains.insert(
            Domain::Product,
            DomainRecord {
                real: vec!["Grew activation by 40% through onboarding changes".into()],
                synthetic: vec![
                    "Mapped market trends to lift retention by 22%".into(),
                    "Wrote the launch memo".into(),
                ],
            },
        );
        dataset.domains.insert(
            Domain::Mechanical,
            DomainRecord {
                real: vec![],
                synthetic: vec!["Cut scrap by 18%".into()],
            },
        );
        dataset
    }

    #[test]
    fn test_localize_only_touches_product_synthetic() {
        let mut data = dataset();
        let before = data.clone();
        let report = RefineUseCase::for_pass(Pass::Localize).refine(&mut data, &mut StdRng::seed_from_u64(3));

        let product = data.record(Domain::Product).unwrap();
        assert_eq!(product.real, before.record(Domain::Product).unwrap().real);
        assert!(product.synthetic[0].contains("Tier-1 & Tier-2 city adoption patterns"));
        assert!(product.synthetic[0].contains(r"\%"));
        assert_eq!(product.synthetic[1], "Wrote the launch memo");
        assert_eq!(data.record(Domain::Mechanical), before.record(Domain::Mechanical));

        assert_eq!(
            report.domains,
            vec![DomainRefineStats {
                domain: Domain::Product,
                processed: 2,
                changed: 1
            }]
        );
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_balance_reports_missing_it_domain() {
        let mut data = dataset();
        let report = RefineUseCase::for_pass(Pass::Balance).refine(&mut data, &mut StdRng::seed_from_u64(1));
        assert_eq!(report.missing, vec![Domain::It]);
        assert_eq!(report.total_processed(), 2);
    }

    #[test]
    fn test_run_saves_once() {
        let store = InMemoryStore::new(dataset());
        let report = RefineUseCase::for_pass(Pass::Humanize)
            .run(&store, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(report.domains.len(), 2);
        assert!(store.snapshot().updated_at.is_some());
    }
}
