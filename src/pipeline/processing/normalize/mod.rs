use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::trace;

pub mod registry;
pub mod stages;

use crate::constants::BASE_INR_PER_USD;
use crate::domain::Domain;
use crate::error::RefineryError;
use registry::TerminologyRegistry;
use stages::{
    BulletStage, ConnectiveVariety, CountJitter, ExchangeRate, FinancialBalancer, FinancialPolicy,
    JitterRange, LatexEscape, PercentJitter, TerminologyInjection,
};

/// The normalization passes that can be run over a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Jitter metrics and inject tech-ops tooling names
    Humanize,
    /// Localize product bullets for the Indian market and make them LaTeX-safe
    Localize,
    /// Tone down revenue claims and vary repetitive connectives
    Balance,
}

impl Pass {
    pub const ALL: [Pass; 3] = [Pass::Humanize, Pass::Localize, Pass::Balance];

    pub fn name(&self) -> &'static str {
        match self {
            Pass::Humanize => "humanize",
            Pass::Localize => "localize",
            Pass::Balance => "balance",
        }
    }

    /// Default stage settings for this pass
    pub fn config(&self) -> PipelineConfig {
        match self {
            Pass::Humanize => PipelineConfig {
                percent_jitter: JitterRange::new(-4, 3),
                count_jitter: Some(JitterRange::new(3, 17)),
                financial: FinancialPolicy::Off,
                vary_connectives: false,
                latex_escape: false,
            },
            Pass::Localize => PipelineConfig {
                percent_jitter: JitterRange::new(-3, 3),
                count_jitter: None,
                financial: FinancialPolicy::Localize {
                    rate: ExchangeRate::jittered(BASE_INR_PER_USD, 2),
                },
                vary_connectives: false,
                latex_escape: true,
            },
            Pass::Balance => PipelineConfig {
                percent_jitter: JitterRange::new(-1, 1),
                count_jitter: None,
                financial: FinancialPolicy::Balance {
                    strip_probability: 0.6,
                    rate: ExchangeRate::fixed(BASE_INR_PER_USD),
                },
                vary_connectives: true,
                latex_escape: false,
            },
        }
    }

    /// Domains whose synthetic bullets this pass rewrites
    pub fn target_domains(&self) -> &'static [Domain] {
        match self {
            Pass::Humanize => &Domain::ALL,
            Pass::Localize => &[Domain::Product],
            Pass::Balance => &[Domain::Product, Domain::It],
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pass {
    type Err = RefineryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pass::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                RefineryError::Config(format!(
                    "unknown pass '{}' (expected humanize, localize or balance)",
                    s
                ))
            })
    }
}

/// Stage settings for one pipeline instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Offset range for `N%` literals
    pub percent_jitter: JitterRange,
    /// Offset range for `N+` counts; `None` leaves counts alone
    pub count_jitter: Option<JitterRange>,
    pub financial: FinancialPolicy,
    /// Replace the first "resulting in" with a synonym
    pub vary_connectives: bool,
    /// Escape `%` and `$` for LaTeX
    pub latex_escape: bool,
}

/// Ordered chain of text transforms turning a raw bullet into a publishable one
pub struct BulletNormalizationPipeline {
    stages: Vec<Box<dyn BulletStage>>,
}

impl BulletNormalizationPipeline {
    pub fn new(config: &PipelineConfig, terminology: TerminologyRegistry) -> Self {
        let mut stages: Vec<Box<dyn BulletStage>> = Vec::new();

        stages.push(Box::new(PercentJitter::new(config.percent_jitter)));
        if let Some(range) = config.count_jitter {
            stages.push(Box::new(CountJitter::new(range)));
        }
        if config.financial != FinancialPolicy::Off {
            stages.push(Box::new(FinancialBalancer::new(config.financial)));
        }
        if config.vary_connectives {
            stages.push(Box::new(ConnectiveVariety));
        }
        stages.push(Box::new(TerminologyInjection::new(terminology)));
        if config.latex_escape {
            stages.push(Box::new(LatexEscape));
        }

        Self { stages }
    }

    /// Pipeline with the built-in settings and tables of `pass`
    pub fn for_pass(pass: Pass) -> Self {
        Self::new(&pass.config(), TerminologyRegistry::for_pass(pass))
    }

    /// Run `bullet` through every stage in order
    pub fn normalize(&self, bullet: &str, domain: Domain, rng: &mut dyn RngCore) -> String {
        let mut text = bullet.to_string();
        for stage in &self.stages {
            let next = stage.apply(&text, domain, rng);
            if next != text {
                trace!(stage = stage.name(), %domain, "stage rewrote bullet");
            }
            text = next;
        }
        text
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    static ACROSS_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"across (\d+) RHEL").unwrap());
    static EFFORT_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"by (\d+)%").unwrap());

    const PATCHING: &str = "Implemented an automated patching solution across 150+ Linux servers, reducing manual effort by 70%.";

    #[test]
    fn test_humanize_patching_bullet() {
        let pipeline = BulletNormalizationPipeline::for_pass(Pass::Humanize);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = pipeline.normalize(PATCHING, Domain::It, &mut rng);

            assert!(out.contains("Ansible-driven automated patching workflow"), "{out}");
            assert!(out.contains("RHEL and Ubuntu instances"), "{out}");
            assert!(!out.contains('+'));

            let count: i64 = ACROSS_COUNT.captures(&out).unwrap()[1].parse().unwrap();
            assert!((153..=167).contains(&count), "count {count}");
            let percent: i64 = EFFORT_PERCENT.captures(&out).unwrap()[1].parse().unwrap();
            assert!((66..=73).contains(&percent), "percent {percent}");
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let pipeline = BulletNormalizationPipeline::for_pass(Pass::Balance);
        let bullet = "Analyzed market trends, resulting in a 19% lift, totaling $800,000.";
        let a = pipeline.normalize(bullet, Domain::Product, &mut StdRng::seed_from_u64(42));
        let b = pipeline.normalize(bullet, Domain::Product, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_localize_product_bullet() {
        let pipeline = BulletNormalizationPipeline::for_pass(Pass::Localize);
        let bullet = "Collaborated with stakeholders to launch a product, saving the company $500,000 and lifting NPS 20%.";
        for seed in 0..30 {
            let out = pipeline.normalize(bullet, Domain::Product, &mut StdRng::seed_from_u64(seed));
            assert!(out.contains("cross-functional stakeholders"));
            assert!(out.contains(" Cr"), "{out}");
            assert!(!out.contains("$500,000"));
            assert!(out.contains(r"\%"), "{out}");
        }
    }

    #[test]
    fn test_localize_ignores_terminology_outside_product() {
        let pipeline = BulletNormalizationPipeline::for_pass(Pass::Localize);
        let out = pipeline.normalize(
            "Briefed stakeholders weekly on 4 launches",
            Domain::It,
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(out, "Briefed stakeholders weekly on 4 launches");
    }

    #[test]
    fn test_stage_order_follows_config() {
        assert_eq!(
            BulletNormalizationPipeline::for_pass(Pass::Humanize).stage_names(),
            vec!["percent_jitter", "count_jitter", "terminology_injection"]
        );
        assert_eq!(
            BulletNormalizationPipeline::for_pass(Pass::Balance).stage_names(),
            vec![
                "percent_jitter",
                "financial_balancer",
                "connective_variety",
                "terminology_injection"
            ]
        );
        assert_eq!(
            BulletNormalizationPipeline::for_pass(Pass::Localize).stage_names(),
            vec![
                "percent_jitter",
                "financial_balancer",
                "terminology_injection",
                "latex_escape"
            ]
        );
    }

    #[test]
    fn test_pass_parses_from_cli_name() {
        assert_eq!("Balance".parse::<Pass>().unwrap(), Pass::Balance);
        assert!("shout".parse::<Pass>().is_err());
    }
}
