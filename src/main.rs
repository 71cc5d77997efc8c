use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{thread_rng, RngCore, SeedableRng};
use serde_json::{json, Value};
use tracing::{error, info};

use bullet_refinery::app::curate_use_case;
use bullet_refinery::app::{AugmentUseCase, ParseResumeUseCase, RefineUseCase};
use bullet_refinery::config::{Config, Credentials};
use bullet_refinery::constants::{
    DEFAULT_CLEANED_FILE, DEFAULT_CONFIG_FILE, DEFAULT_CORPUS_FILE, DEFAULT_DATASET_FILE,
};
use bullet_refinery::domain::Domain;
use bullet_refinery::infra::GroqClient;
use bullet_refinery::logging;
use bullet_refinery::pipeline::processing::normalize::registry::TerminologyRegistry;
use bullet_refinery::pipeline::processing::normalize::{BulletNormalizationPipeline, Pass};
use bullet_refinery::pipeline::processing::quality_gate::{
    clean_bullet, DefaultQualityGate, QualityDecision, QualityGate,
};
use bullet_refinery::storage::JsonFileStore;

#[derive(Parser)]
#[command(name = "bullet_refinery")]
#[command(about = "Resume bullet harvesting, quality gating and normalization")]
#[command(version)]
struct Cli {
    /// Optional TOML file with pipeline overrides and augment settings
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Directory for the JSON log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one bullet through a normalization pass
    Normalize {
        text: String,
        #[arg(long, default_value = "IT")]
        domain: Domain,
        #[arg(long, default_value = "humanize")]
        pass: Pass,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Report whether a bullet passes the quality gate
    Check { text: String },
    /// Strip LaTeX markup and collapse whitespace
    Clean { text: String },
    /// Extract bullets from LaTeX resumes into the raw corpus
    Harvest {
        #[arg(long)]
        domain: Domain,
        /// .tex files or directories holding them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_CORPUS_FILE)]
        output: PathBuf,
    },
    /// Drop truncated lines and LaTeX-escape a raw corpus
    Audit {
        #[arg(long, default_value = DEFAULT_CORPUS_FILE)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_CLEANED_FILE)]
        output: PathBuf,
    },
    /// Build a dataset from a real corpus and a real+synthetic corpus
    Split {
        #[arg(long, default_value = DEFAULT_CLEANED_FILE)]
        real: PathBuf,
        #[arg(long)]
        combined: PathBuf,
        #[arg(long, default_value = DEFAULT_DATASET_FILE)]
        output: PathBuf,
    },
    /// Convert a legacy unversioned dataset to the current format
    Migrate {
        #[arg(long, default_value = DEFAULT_DATASET_FILE)]
        input: PathBuf,
        /// Defaults to rewriting the input in place
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Apply a normalization pass to the synthetic bullets of a dataset
    Refine {
        #[arg(long)]
        pass: Pass,
        #[arg(long, default_value = DEFAULT_DATASET_FILE)]
        dataset: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate synthetic bullets for under-filled domains
    Augment {
        #[arg(long, default_value = DEFAULT_DATASET_FILE)]
        dataset: PathBuf,
        /// Cleaned corpus used to create the dataset when it doesn't exist yet
        #[arg(long, default_value = DEFAULT_CLEANED_FILE)]
        corpus: PathBuf,
        /// Comma-separated domains; defaults to the configured targets
        #[arg(long, value_delimiter = ',')]
        domains: Vec<Domain>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Extract structured resume data from a plain-text resume
    Parse {
        /// Plain-text resume file
        path: PathBuf,
    },
}

fn make_rng(seed: Option<u64>) -> Box<dyn RngCore> {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(thread_rng()),
    }
}

async fn execute(command: Commands, config: &Config) -> Result<Value> {
    match command {
        Commands::Normalize {
            text,
            domain,
            pass,
            seed,
        } => {
            let pipeline = BulletNormalizationPipeline::new(
                &config.pipeline_config(pass),
                TerminologyRegistry::for_pass(pass),
            );
            let mut rng = make_rng(seed);
            let output = pipeline.normalize(&text, domain, &mut *rng);
            Ok(json!({
                "input": text,
                "output": output,
                "domain": domain,
                "pass": pass,
            }))
        }
        Commands::Check { text } => {
            let assessment = DefaultQualityGate::new().assess(&text);
            Ok(json!({
                "text": text,
                "high_quality": assessment.decision == QualityDecision::Accept,
                "issues": assessment.issues,
            }))
        }
        Commands::Clean { text } => Ok(json!({ "input": text, "cleaned": clean_bullet(&text) })),
        Commands::Harvest {
            domain,
            inputs,
            output,
        } => {
            let report = curate_use_case::harvest_into_corpus(domain, &inputs, &output)?;
            Ok(serde_json::to_value(report)?)
        }
        Commands::Audit { input, output } => {
            let report = curate_use_case::audit_corpus_file(&input, &output)?;
            Ok(serde_json::to_value(report)?)
        }
        Commands::Split {
            real,
            combined,
            output,
        } => {
            let summary = curate_use_case::split_files(&real, &combined, &output)?;
            Ok(serde_json::to_value(summary)?)
        }
        Commands::Migrate { input, output } => {
            let output = output.unwrap_or_else(|| input.clone());
            let summary = curate_use_case::migrate_file(&input, &output)?;
            Ok(serde_json::to_value(summary)?)
        }
        Commands::Refine {
            pass,
            dataset,
            seed,
        } => {
            info!(%pass, dataset = %dataset.display(), "🔄 refining dataset");
            let use_case = RefineUseCase::new(pass, &config.pipeline_config(pass));
            let store = JsonFileStore::new(dataset);
            let mut rng = make_rng(seed);
            let report = use_case.run(&store, &mut *rng)?;
            Ok(serde_json::to_value(report)?)
        }
        Commands::Augment {
            dataset,
            corpus,
            domains,
            seed,
        } => {
            let credentials = Credentials::groq_from_env()?;
            let generator = GroqClient::new(&credentials)
                .context("Failed to build HTTP client")?
                .with_model(config.augment.model.clone());

            if !dataset.exists() {
                curate_use_case::bootstrap_dataset(&corpus, &dataset)?;
            }

            let mut settings = config.augment.clone();
            if !domains.is_empty() {
                settings.target_domains = domains;
            }
            let humanizer = BulletNormalizationPipeline::new(
                &config.pipeline_config(Pass::Humanize),
                TerminologyRegistry::for_pass(Pass::Humanize),
            );
            let use_case = AugmentUseCase::new(Box::new(generator), humanizer, settings);
            let store = JsonFileStore::new(dataset);
            let mut rng = make_rng(seed);
            let report = use_case.run(&store, &mut *rng).await?;
            Ok(serde_json::to_value(report)?)
        }
        Commands::Parse { path } => {
            let credentials = Credentials::groq_from_env()?;
            let client = GroqClient::new(&credentials)
                .context("Failed to build HTTP client")?
                .with_model(config.augment.model.clone());
            let resume = ParseResumeUseCase::new(Box::new(client))
                .parse_file(&path)
                .await
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(serde_json::to_value(resume)?)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let guard = logging::init_logging(&cli.log_dir);

    let result = match Config::load(&cli.config) {
        Ok(config) => execute(cli.command, &config).await,
        Err(e) => Err(anyhow::Error::new(e).context("Failed to load configuration")),
    };

    let exit_code = match result.and_then(|value| Ok(serde_json::to_string_pretty(&value)?)) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            error!("command failed: {:#}", e);
            println!("{}", json!({ "error": format!("{:#}", e) }));
            1
        }
    };

    // Flush buffered log lines before exiting
    drop(guard);
    std::process::exit(exit_code);
}
