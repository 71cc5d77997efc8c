use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::constants::DATASET_FORMAT_VERSION;
use crate::domain::{Bullet, Domain};
use crate::error::{RefineryError, Result};

static DATASET_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../schemas/dataset.v1.json"))
        .expect("embedded dataset schema is valid JSON")
});

/// Plain `{domain: [bullet, ...]}` corpus, as produced by harvesting and auditing
pub type RawCorpus = BTreeMap<Domain, Vec<String>>;

/// Real and synthetic bullets of one domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Harvested bullets; never rewritten by normalization passes
    pub real: Vec<String>,
    /// Generated bullets; rewritten in place by each pass
    pub synthetic: Vec<String>,
}

/// Versioned dataset document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub format_version: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub domains: BTreeMap<Domain, DomainRecord>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self {
            format_version: DATASET_FORMAT_VERSION,
            updated_at: None,
            domains: BTreeMap::new(),
        }
    }

    pub fn record(&self, domain: Domain) -> Option<&DomainRecord> {
        self.domains.get(&domain)
    }

    pub fn record_mut(&mut self, domain: Domain) -> Option<&mut DomainRecord> {
        self.domains.get_mut(&domain)
    }

    /// Every bullet tagged with its domain and provenance
    pub fn bullets(&self) -> Vec<Bullet> {
        self.domains
            .iter()
            .flat_map(|(domain, record)| {
                let real = record.real.iter().map(|t| Bullet::real(t.clone(), *domain));
                let synthetic = record
                    .synthetic
                    .iter()
                    .map(|t| Bullet::synthetic(t.clone(), *domain));
                real.chain(synthetic).collect::<Vec<_>>()
            })
            .collect()
    }

    /// (real, synthetic) totals across domains
    pub fn totals(&self) -> (usize, usize) {
        self.domains.values().fold((0, 0), |(r, s), record| {
            (r + record.real.len(), s + record.synthetic.len())
        })
    }
}

/// Names the legacy layout of an unversioned document, if it is one
fn legacy_shape(value: &Value) -> Option<&'static str> {
    let map = value.as_object()?;
    if map.is_empty() || map.contains_key("format_version") {
        return None;
    }
    if map.values().all(Value::is_array) {
        return Some("pre-split list");
    }
    if map.values().all(|v| v.get("real").is_some()) {
        return Some("post-split object");
    }
    None
}

/// Checks a parsed document against the embedded v1 schema
pub fn validate_dataset_value(value: &Value, path: &Path) -> Result<()> {
    if let Some(shape) = legacy_shape(value) {
        return Err(RefineryError::LegacyFormat {
            path: path.to_path_buf(),
            shape,
        });
    }

    let compiled = JSONSchema::compile(&DATASET_SCHEMA)
        .map_err(|e| RefineryError::Config(format!("dataset schema does not compile: {}", e)))?;

    if let Err(errors) = compiled.validate(value) {
        let details: Vec<String> = errors
            .map(|e| {
                let pointer = e.instance_path.to_string();
                if pointer.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", pointer, e)
                }
            })
            .collect();
        return Err(RefineryError::Schema {
            path: path.to_path_buf(),
            version: DATASET_FORMAT_VERSION,
            details,
        });
    }
    Ok(())
}

/// Parses and validates a dataset document; `path` is only used in errors
pub fn decode_dataset(text: &str, path: &Path) -> Result<Dataset> {
    let value: Value = serde_json::from_str(text)?;
    validate_dataset_value(&value, path)?;
    Ok(serde_json::from_value(value)?)
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = fs::read_to_string(path)?;
    let dataset = decode_dataset(&text, path)?;
    let (real, synthetic) = dataset.totals();
    debug!(path = %path.display(), real, synthetic, "loaded dataset");
    Ok(dataset)
}

/// Stamps `updated_at` and overwrites the whole file
pub fn save_dataset(path: &Path, dataset: &mut Dataset) -> Result<()> {
    dataset.updated_at = Some(Utc::now());
    let json = serde_json::to_string_pretty(dataset)?;
    write_replacing(path, json.as_bytes())?;
    let (real, synthetic) = dataset.totals();
    info!(path = %path.display(), real, synthetic, "💾 saved dataset");
    Ok(())
}

/// Converts a legacy unversioned document into a v1 dataset.
///
/// Pre-split lists become `real` bullets with an empty `synthetic` list.
pub fn migrate_legacy(value: &Value, path: &Path) -> Result<Dataset> {
    let shape = legacy_shape(value).ok_or_else(|| {
        RefineryError::Config(format!(
            "{} is not a legacy dataset (expected {{domain: [..]}} or {{domain: {{real, synthetic}}}})",
            path.display()
        ))
    })?;

    let mut dataset = Dataset::new();
    match shape {
        "pre-split list" => {
            let corpus: RawCorpus = serde_json::from_value(value.clone())?;
            for (domain, real) in corpus {
                dataset.domains.insert(
                    domain,
                    DomainRecord {
                        real,
                        synthetic: Vec::new(),
                    },
                );
            }
        }
        _ => {
            let records: BTreeMap<Domain, DomainRecord> = serde_json::from_value(value.clone())?;
            dataset.domains = records;
        }
    }
    Ok(dataset)
}

pub fn load_corpus(path: &Path) -> Result<RawCorpus> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    if value.get("format_version").is_some() {
        return Err(RefineryError::Config(format!(
            "{} is a versioned dataset, not a raw corpus",
            path.display()
        )));
    }
    Ok(serde_json::from_value(value)?)
}

pub fn save_corpus(path: &Path, corpus: &RawCorpus) -> Result<()> {
    let json = serde_json::to_string_pretty(corpus)?;
    write_replacing(path, json.as_bytes())
}

/// Writes to a sibling temp file, then renames it over `path`
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| RefineryError::Config(format!("invalid output path {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Where a use case loads and saves the dataset
pub trait DatasetStore: Send + Sync {
    fn load(&self) -> Result<Dataset>;
    fn save(&self, dataset: &mut Dataset) -> Result<()>;
}

/// Dataset persisted as a JSON file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetStore for JsonFileStore {
    fn load(&self) -> Result<Dataset> {
        load_dataset(&self.path)
    }

    fn save(&self, dataset: &mut Dataset) -> Result<()> {
        save_dataset(&self.path, dataset)
    }
}

/// In-memory store for development/testing
#[derive(Default)]
pub struct InMemoryStore {
    dataset: Mutex<Dataset>,
    saves: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Mutex::new(dataset),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Dataset {
        self.dataset
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DatasetStore for InMemoryStore {
    fn load(&self) -> Result<Dataset> {
        Ok(self.snapshot())
    }

    fn save(&self, dataset: &mut Dataset) -> Result<()> {
        dataset.updated_at = Some(Utc::now());
        let mut guard = self
            .dataset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = dataset.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
