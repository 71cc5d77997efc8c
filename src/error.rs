use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefineryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Dataset {} does not match schema v{version}: {}", path.display(), details.join("; "))]
    Schema {
        path: PathBuf,
        version: u32,
        details: Vec<String>,
    },

    #[error("Dataset {} uses the legacy unversioned {shape} layout; convert it with `bullet_refinery migrate`", path.display())]
    LegacyFormat { path: PathBuf, shape: &'static str },

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model reply is not valid resume JSON: {0}")]
    MalformedReply(String),

    #[error("No text found in {}", .0.display())]
    EmptyResume(PathBuf),
}

pub type Result<T> = std::result::Result<T, RefineryError>;
