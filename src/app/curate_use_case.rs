use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::Domain;
use crate::pipeline::processing::extract::harvest_files;
use crate::pipeline::processing::quality_gate::{audit_corpus, BrokenLine};
use crate::pipeline::processing::split::split_corpus;
use crate::storage::{self, RawCorpus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    pub domain: Domain,
    pub harvested: usize,
    /// Harvested bullets not already in the corpus
    pub added: usize,
    pub total: usize,
}

/// Harvests LaTeX bullets for `domain` and merges them into the corpus at `corpus_path`
pub fn harvest_into_corpus(domain: Domain, inputs: &[PathBuf], corpus_path: &Path) -> Result<HarvestReport> {
    let mut corpus = if corpus_path.exists() {
        storage::load_corpus(corpus_path)
            .with_context(|| format!("Failed to load corpus {}", corpus_path.display()))?
    } else {
        RawCorpus::new()
    };

    let bullets = harvest_files(domain, inputs).context("Failed to collect LaTeX files")?;
    let harvested = bullets.len();

    let entry = corpus.entry(domain).or_default();
    let mut known: HashSet<String> = entry.iter().cloned().collect();
    let mut added = 0;
    for bullet in bullets {
        if known.insert(bullet.text.clone()) {
            entry.push(bullet.text);
            added += 1;
        }
    }
    let total = entry.len();

    storage::save_corpus(corpus_path, &corpus)
        .with_context(|| format!("Failed to save corpus {}", corpus_path.display()))?;
    info!(%domain, harvested, added, total, "harvested bullets");

    Ok(HarvestReport {
        domain,
        harvested,
        added,
        total,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub kept: BTreeMap<Domain, usize>,
    pub broken: Vec<BrokenLine>,
}

/// Drops truncated lines from a corpus and LaTeX-escapes the rest
pub fn audit_corpus_file(input: &Path, output: &Path) -> Result<AuditReport> {
    let corpus = storage::load_corpus(input)
        .with_context(|| format!("Failed to load corpus {}", input.display()))?;
    let outcome = audit_corpus(&corpus);

    for line in &outcome.broken {
        warn!(domain = %line.domain, reason = ?line.reason, text = %line.text, "dropping broken line");
    }
    storage::save_corpus(output, &outcome.cleaned)
        .with_context(|| format!("Failed to save audited corpus {}", output.display()))?;

    Ok(AuditReport {
        kept: outcome
            .cleaned
            .iter()
            .map(|(domain, lines)| (*domain, lines.len()))
            .collect(),
        broken: outcome.broken,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainCounts {
    pub real: usize,
    pub synthetic: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub output: PathBuf,
    pub domains: BTreeMap<Domain, DomainCounts>,
}

fn summarize(output: &Path, dataset: &storage::Dataset) -> DatasetSummary {
    DatasetSummary {
        output: output.to_path_buf(),
        domains: dataset
            .domains
            .iter()
            .map(|(domain, record)| {
                (
                    *domain,
                    DomainCounts {
                        real: record.real.len(),
                        synthetic: record.synthetic.len(),
                    },
                )
            })
            .collect(),
    }
}

/// Builds a versioned dataset from a real corpus and a real+synthetic corpus
pub fn split_files(real: &Path, combined: &Path, output: &Path) -> Result<DatasetSummary> {
    let real_corpus = storage::load_corpus(real)
        .with_context(|| format!("Failed to load real corpus {}", real.display()))?;
    let combined_corpus = storage::load_corpus(combined)
        .with_context(|| format!("Failed to load combined corpus {}", combined.display()))?;

    let mut dataset = split_corpus(&real_corpus, &combined_corpus);
    storage::save_dataset(output, &mut dataset)
        .with_context(|| format!("Failed to save dataset {}", output.display()))?;
    Ok(summarize(output, &dataset))
}

/// Rewrites a legacy unversioned dataset in the current format
pub fn migrate_file(input: &Path, output: &Path) -> Result<DatasetSummary> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let mut dataset = storage::migrate_legacy(&value, input)?;
    storage::save_dataset(output, &mut dataset)
        .with_context(|| format!("Failed to save dataset {}", output.display()))?;
    info!(input = %input.display(), output = %output.display(), "migrated legacy dataset");
    Ok(summarize(output, &dataset))
}

/// Creates a dataset whose real bullets are the cleaned corpus and whose synthetic lists are empty
pub fn bootstrap_dataset(corpus: &Path, output: &Path) -> Result<DatasetSummary> {
    let real = storage::load_corpus(corpus)
        .with_context(|| format!("Failed to load cleaned corpus {}", corpus.display()))?;
    let mut dataset = split_corpus(&real, &RawCorpus::new());
    storage::save_dataset(output, &mut dataset)
        .with_context(|| format!("Failed to save dataset {}", output.display()))?;
    info!(corpus = %corpus.display(), output = %output.display(), "bootstrapped dataset from cleaned corpus");
    Ok(summarize(output, &dataset))
}
