use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::constants::{GROQ_API_KEY_VAR, GROQ_MODEL};
use crate::domain::Domain;
use crate::error::{RefineryError, Result};
use crate::pipeline::processing::normalize::stages::{FinancialPolicy, JitterRange};
use crate::pipeline::processing::normalize::{Pass, PipelineConfig};

/// Settings read from `refinery.toml`; every section is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pipeline: PipelineOverrides,
    pub augment: AugmentSettings,
}

/// Per-pass tweaks layered over the built-in presets
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOverrides {
    pub humanize: PassOverrides,
    pub localize: PassOverrides,
    pub balance: PassOverrides,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PassOverrides {
    pub percent_jitter: Option<JitterRange>,
    pub count_jitter: Option<JitterRange>,
    /// Only meaningful for `balance`
    pub strip_probability: Option<f64>,
    /// +/- rupees around the base rate
    pub rate_noise: Option<i64>,
}

impl PassOverrides {
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(range) = self.percent_jitter {
            config.percent_jitter = range;
        }
        if let Some(range) = self.count_jitter {
            config.count_jitter = Some(range);
        }

        config.financial = match config.financial {
            FinancialPolicy::Off => FinancialPolicy::Off,
            FinancialPolicy::Localize { mut rate } => {
                if let Some(noise) = self.rate_noise {
                    rate.noise = noise;
                }
                FinancialPolicy::Localize { rate }
            }
            FinancialPolicy::Balance {
                strip_probability,
                mut rate,
            } => {
                if let Some(noise) = self.rate_noise {
                    rate.noise = noise;
                }
                FinancialPolicy::Balance {
                    strip_probability: self.strip_probability.unwrap_or(strip_probability),
                    rate,
                }
            }
        };
        config
    }

    fn validate(&self, pass: Pass) -> Result<()> {
        if let Some(p) = self.strip_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(RefineryError::Config(format!(
                    "pipeline.{}.strip_probability must be between 0 and 1, got {}",
                    pass, p
                )));
            }
        }
        if let Some(range) = self.count_jitter {
            if range.low.min(range.high) < 1 {
                return Err(RefineryError::Config(format!(
                    "pipeline.{}.count_jitter must only add to counts, got {}..={}",
                    pass, range.low, range.high
                )));
            }
        }
        if let Some(noise) = self.rate_noise {
            if noise < 0 {
                return Err(RefineryError::Config(format!(
                    "pipeline.{}.rate_noise must not be negative, got {}",
                    pass, noise
                )));
            }
        }
        Ok(())
    }
}

/// Settings for synthetic bullet generation
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentSettings {
    pub target_domains: Vec<Domain>,
    pub batches: usize,
    pub batch_size: usize,
    /// Domains already holding more synthetic bullets than this are skipped
    pub skip_threshold: usize,
    pub pause_secs: u64,
    pub model: String,
}

impl Default for AugmentSettings {
    fn default() -> Self {
        Self {
            target_domains: vec![Domain::It, Domain::Product],
            batches: 2,
            batch_size: 25,
            skip_threshold: 50,
            pause_secs: 2,
            model: GROQ_MODEL.to_string(),
        }
    }
}

impl AugmentSettings {
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path).map_err(|e| {
            RefineryError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for pass in Pass::ALL {
            self.pipeline.overrides_for(pass).validate(pass)?;
        }
        if self.augment.batch_size == 0 {
            return Err(RefineryError::Config(
                "augment.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Preset for `pass` with this file's overrides applied
    pub fn pipeline_config(&self, pass: Pass) -> PipelineConfig {
        self.pipeline.overrides_for(pass).apply(pass.config())
    }
}

impl PipelineOverrides {
    pub fn overrides_for(&self, pass: Pass) -> &PassOverrides {
        match pass {
            Pass::Humanize => &self.humanize,
            Pass::Localize => &self.localize,
            Pass::Balance => &self.balance,
        }
    }
}

/// Secrets taken from the environment (and `.env`)
#[derive(Clone)]
pub struct Credentials {
    pub groq_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("groq_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn groq_from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        match env::var(GROQ_API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self { groq_api_key: key }),
            _ => Err(RefineryError::MissingCredential(GROQ_API_KEY_VAR)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_presets() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.pipeline_config(Pass::Balance), Pass::Balance.config());
        assert_eq!(config.augment.target_domains, vec![Domain::It, Domain::Product]);
        assert_eq!(config.augment.batches, 2);
        assert_eq!(config.augment.batch_size, 25);
        assert_eq!(config.augment.skip_threshold, 50);
        assert_eq!(config.augment.pause(), Duration::from_secs(2));
    }

    #[test]
    fn test_overrides_apply_to_matching_pass_only() {
        let config = Config::from_toml(
            r#"
            [pipeline.balance]
            percent_jitter = { low = 0, high = 0 }
            strip_probability = 1.0

            [pipeline.localize]
            rate_noise = 0
            "#,
        )
        .unwrap();

        let balance = config.pipeline_config(Pass::Balance);
        assert_eq!(balance.percent_jitter, JitterRange::new(0, 0));
        match balance.financial {
            FinancialPolicy::Balance {
                strip_probability, ..
            } => assert_eq!(strip_probability, 1.0),
            other => panic!("unexpected policy {other:?}"),
        }

        match config.pipeline_config(Pass::Localize).financial {
            FinancialPolicy::Localize { rate } => assert_eq!(rate.noise, 0),
            other => panic!("unexpected policy {other:?}"),
        }
        assert_eq!(config.pipeline_config(Pass::Humanize), Pass::Humanize.config());
    }

    #[test]
    fn test_augment_domains_use_dataset_labels() {
        let config = Config::from_toml(
            r#"
            [augment]
            target_domains = ["Core Electronics", "Mechanical"]
            batches = 1
            "#,
        )
        .unwrap();
        assert_eq!(
            config.augment.target_domains,
            vec![Domain::CoreElectronics, Domain::Mechanical]
        );
        assert_eq!(config.augment.batches, 1);
        assert_eq!(config.augment.batch_size, 25);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Config::from_toml("[pipeline.balance]\nstrip_probability = 1.5").is_err());
        assert!(Config::from_toml("[pipeline.localize]\nrate_noise = -1").is_err());
        assert!(Config::from_toml("[pipeline.humanize]\ncount_jitter = { low = -5, high = 2 }").is_err());
        assert!(Config::from_toml("[pipeline.humanize]\ncount_jitter = { low = 0, high = 4 }").is_err());
        assert!(Config::from_toml("[augment]\nbatch_size = 0").is_err());
        assert!(Config::from_toml("[augment]\ntarget_domains = [\"Finance\"]").is_err());
        assert!(Config::from_toml("[unknown]\nkey = 1").is_err());
    }

    #[test]
    fn test_accepts_positive_count_jitter() {
        let config = Config::from_toml("[pipeline.humanize]\ncount_jitter = { low = 1, high = 5 }").unwrap();
        assert_eq!(
            config.pipeline_config(Pass::Humanize).count_jitter,
            Some(JitterRange::new(1, 5))
        );
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/refinery.toml")).unwrap();
        assert_eq!(config.augment.model, GROQ_MODEL);
    }
}
