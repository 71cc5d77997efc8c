use std::collections::HashSet;

use crate::storage::{Dataset, DomainRecord, RawCorpus};

/// Separates one domain's combined list into real and synthetic bullets.
///
/// A combined entry is synthetic when it does not appear verbatim in `real`.
/// Membership is set-based: every copy of a real bullet is excluded, even
/// when the combined list holds more copies than `real` does.
pub fn split_domain(real: &[String], combined: &[String]) -> DomainRecord {
    let real_set: HashSet<&str> = real.iter().map(String::as_str).collect();
    let synthetic = combined
        .iter()
        .filter(|bullet| !real_set.contains(bullet.as_str()))
        .cloned()
        .collect();

    DomainRecord {
        real: real.to_vec(),
        synthetic,
    }
}

/// Builds a dataset from the real corpus and the real+synthetic corpus.
///
/// Domains come from `real`; a domain absent from `combined` gets no synthetic bullets.
pub fn split_corpus(real: &RawCorpus, combined: &RawCorpus) -> Dataset {
    let mut dataset = Dataset::new();
    for (domain, real_points) in real {
        let combined_points = combined.get(domain).map(Vec::as_slice).unwrap_or(&[]);
        dataset
            .domains
            .insert(*domain, split_domain(real_points, combined_points));
    }
    dataset
}
