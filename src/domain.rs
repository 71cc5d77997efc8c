use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RefineryError;

/// The fixed set of career domains a bullet can belong to.
///
/// Serialized with the human-readable labels used as dataset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "Product")]
    Product,
    #[serde(rename = "Marketing")]
    Marketing,
    #[serde(rename = "Core Electronics")]
    CoreElectronics,
    #[serde(rename = "Mechanical")]
    Mechanical,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::It,
        Domain::Product,
        Domain::Marketing,
        Domain::CoreElectronics,
        Domain::Mechanical,
    ];

    /// Label used as the dataset key and on the command line
    pub fn label(&self) -> &'static str {
        match self {
            Domain::It => "IT",
            Domain::Product => "Product",
            Domain::Marketing => "Marketing",
            Domain::CoreElectronics => "Core Electronics",
            Domain::Mechanical => "Mechanical",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Domain {
    type Err = RefineryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Domain::ALL
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RefineryError::UnknownDomain(wanted.to_string()))
    }
}

/// Where a bullet came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Harvested from a real resume
    Real,
    /// Produced by a language model
    Synthetic,
}

/// A single resume achievement line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    pub text: String,
    pub domain: Domain,
    pub provenance: Provenance,
}

impl Bullet {
    pub fn real(text: impl Into<String>, domain: Domain) -> Self {
        Self {
            text: text.into(),
            domain,
            provenance: Provenance::Real,
        }
    }

    pub fn synthetic(text: impl Into<String>, domain: Domain) -> Self {
        Self {
            text: text.into(),
            domain,
            provenance: Provenance::Synthetic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain_labels() {
        assert_eq!("IT".parse::<Domain>().unwrap(), Domain::It);
        assert_eq!("core electronics".parse::<Domain>().unwrap(), Domain::CoreElectronics);
        assert_eq!(" Product ".parse::<Domain>().unwrap(), Domain::Product);
    }

    #[test]
    fn test_unknown_domain_is_rejected() {
        let err = "Finance".parse::<Domain>().unwrap_err();
        assert!(matches!(err, RefineryError::UnknownDomain(ref d) if d == "Finance"));
    }

    #[test]
    fn test_domain_serializes_as_label() {
        let json = serde_json::to_string(&Domain::CoreElectronics).unwrap();
        assert_eq!(json, "\"Core Electronics\"");
    }
}
