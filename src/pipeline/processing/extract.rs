use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{Bullet, Domain};
use crate::error::Result;
use crate::pipeline::processing::quality_gate::{clean_bullet, DefaultQualityGate, QualityGate};

/// `\item{...}` or `\resumeItem{...}` with at least 60 characters inside the braces
static ITEM_MACRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\(?:resumeItem|item)\s*\{([^}]{60,})\}").expect("item macro regex compiles")
});

/// Pulls cleaned, quality-gated, de-duplicated bullets out of LaTeX source
pub fn extract_bullets(tex: &str) -> Vec<String> {
    let gate = DefaultQualityGate::new();
    let mut seen = HashSet::new();
    let mut bullets = Vec::new();

    for caps in ITEM_MACRO.captures_iter(tex) {
        let cleaned = clean_bullet(&caps[1]);
        if gate.accepts(&cleaned) && seen.insert(cleaned.clone()) {
            bullets.push(cleaned);
        }
    }

    bullets
}

/// `.tex` files named directly, plus the `.tex` files directly inside named directories
pub fn collect_tex_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_tex(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn is_tex(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tex"))
        .unwrap_or(false)
}

/// Harvests real bullets for `domain` from LaTeX resumes on disk.
///
/// Unreadable files are logged and skipped; duplicates across files are dropped.
pub fn harvest_files(domain: Domain, paths: &[PathBuf]) -> Result<Vec<Bullet>> {
    let mut seen = HashSet::new();
    let mut bullets = Vec::new();

    for file in collect_tex_files(paths)? {
        let bytes = match fs::read(&file) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to read LaTeX file");
                continue;
            }
        };
        let tex = String::from_utf8_lossy(&bytes);
        let found = extract_bullets(&tex);
        debug!(file = %file.display(), count = found.len(), "extracted bullets");

        for text in found {
            if seen.insert(text.clone()) {
                bullets.push(Bullet::real(text, domain));
            }
        }
    }

    Ok(bullets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Provenance;

    const RESUME: &str = r"
\begin{itemize}
  \item{Reduced deployment time by 45\% by rebuilding the CI pipeline on GitHub Actions runners}
  \resumeItem {Scaled the ingestion service to 2M events/day across 3 regions with zero downtime migrations}
  \item{Too short: 3 wins}
  \item{Mentored junior engineers on code review etiquette and sustainable on-call practices}
  \item{Reduced deployment time by 45\% by rebuilding the CI pipeline on GitHub Actions runners}
\end{itemize}
";

    #[test]
    fn test_extracts_quality_items_once() {
        let bullets = extract_bullets(RESUME);
        assert_eq!(
            bullets,
            vec![
                "Reduced deployment time by 45\\% by rebuilding the CI pipeline on GitHub Actions runners".to_string(),
                "Scaled the ingestion service to 2M events/day across 3 regions with zero downtime migrations".to_string(),
            ]
        );
    }

    #[test]
    fn test_item_spanning_lines_is_joined() {
        let tex = "\\item{Cut cloud spend by 28% through rightsizing\n   and reserved instances across 40 accounts}";
        assert_eq!(
            extract_bullets(tex),
            vec!["Cut cloud spend by 28% through rightsizing and reserved instances across 40 accounts".to_string()]
        );
    }

    #[test]
    fn test_harvest_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.tex"), RESUME).unwrap();
        fs::write(dir.path().join("notes.txt"), RESUME).unwrap();

        let bullets = harvest_files(Domain::It, &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(bullets.len(), 2);
        assert!(bullets
            .iter()
            .all(|b| b.domain == Domain::It && b.provenance == Provenance::Real));
    }
}
