use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::MIN_BULLET_LENGTH;
use crate::domain::Domain;
use crate::pipeline::processing::normalize::stages::escape_latex;
use crate::storage::RawCorpus;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex compiles"));

static FORMATTING_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\text(?:bf|it)\{([^}]+)\}").expect("formatting wrapper regex compiles")
});

static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("digit regex compiles"));

/// Quality assessment result from the Quality Gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub decision: QualityDecision,
    /// Specific quality issues found
    pub issues: Vec<QualityIssue>,
}

/// Quality Gate decision for a bullet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityDecision {
    Accept,
    Reject,
}

/// Individual quality issue found during assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum QualityIssue {
    /// Fewer characters than the configured minimum
    TooShort { length: usize, minimum: usize },
    /// No number, percentage or amount to back the claim
    MissingMetric,
}

/// Trait for implementing Quality Gate assessment logic
pub trait QualityGate {
    fn assess(&self, text: &str) -> QualityAssessment;

    fn accepts(&self, text: &str) -> bool {
        self.assess(text).decision == QualityDecision::Accept
    }
}

/// Configuration for Quality Gate assessment rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGateConfig {
    /// Minimum length in characters
    pub min_length: usize,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            min_length: MIN_BULLET_LENGTH,
        }
    }
}

/// Length plus metric-presence gate used for harvested bullets
#[derive(Debug, Clone, Default)]
pub struct DefaultQualityGate {
    pub config: QualityGateConfig,
}

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityGateConfig) -> Self {
        Self { config }
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, text: &str) -> QualityAssessment {
        let mut issues = Vec::new();

        let length = text.chars().count();
        if length < self.config.min_length {
            issues.push(QualityIssue::TooShort {
                length,
                minimum: self.config.min_length,
            });
        }

        // Any digit covers percentages and dollar amounts too
        if !DIGIT.is_match(text) {
            issues.push(QualityIssue::MissingMetric);
        }

        let decision = if issues.is_empty() {
            QualityDecision::Accept
        } else {
            QualityDecision::Reject
        };
        QualityAssessment { decision, issues }
    }
}

/// At least 60 characters and at least one digit
pub fn is_high_quality(text: &str) -> bool {
    DefaultQualityGate::new().accepts(text)
}

/// Strips LaTeX line breaks and bold/italic wrappers, then collapses whitespace.
///
/// Wrappers are peeled until none remain so that the result is stable
/// under repeated cleaning.
pub fn clean_bullet(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let without_breaks = current.replace("\\\\", "");
        let unwrapped = FORMATTING_WRAPPER
            .replace_all(&without_breaks, "$1")
            .into_owned();
        if unwrapped == current {
            break;
        }
        current = unwrapped;
    }
    WHITESPACE_RUN.replace_all(&current, " ").trim().to_string()
}

/// Outcome of auditing a single corpus line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAudit {
    /// LaTeX-escaped, whitespace-normalized text
    Clean(String),
    Broken(BrokenReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokenReason {
    /// Ends mid-sentence with a trailing space
    TrailingSpace,
    /// More opening than closing braces
    UnbalancedBraces,
}

/// Flags truncated lines; escapes `&`, `%` and `$` in the rest
pub fn audit_line(text: &str) -> LineAudit {
    if text.ends_with(' ') {
        return LineAudit::Broken(BrokenReason::TrailingSpace);
    }
    if text.matches('{').count() > text.matches('}').count() {
        return LineAudit::Broken(BrokenReason::UnbalancedBraces);
    }

    let escaped = escape_latex(text, &['&', '%', '$']);
    LineAudit::Clean(WHITESPACE_RUN.replace_all(&escaped, " ").trim().to_string())
}

/// A line dropped by the audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLine {
    pub domain: Domain,
    pub text: String,
    pub reason: BrokenReason,
}

#[derive(Debug, Clone, Default)]
pub struct AuditOutcome {
    pub cleaned: RawCorpus,
    pub broken: Vec<BrokenLine>,
}

/// Audits every line of every domain, keeping order
pub fn audit_corpus(corpus: &RawCorpus) -> AuditOutcome {
    let mut cleaned = BTreeMap::new();
    let mut broken = Vec::new();

    for (domain, lines) in corpus {
        let kept: &mut Vec<String> = cleaned.entry(*domain).or_default();
        for line in lines {
            match audit_line(line) {
                LineAudit::Clean(text) => kept.push(text),
                LineAudit::Broken(reason) => broken.push(BrokenLine {
                    domain: *domain,
                    text: line.clone(),
                    reason,
                }),
            }
        }
    }

    AuditOutcome { cleaned, broken }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_WITH_DIGIT: &str =
        "Migrated 12 services to Kubernetes while keeping the on-call load flat for the team";
    const LONG_WITHOUT_DIGIT: &str =
        "Migrated several services to Kubernetes while keeping the on-call load flat for the team";

    #[test]
    fn test_rejects_short_text_even_with_metrics() {
        let short = "Cut p99 latency by 45% and saved $10,000";
        assert!(short.chars().count() < 60);
        assert!(!is_high_quality(short));
    }

    #[test]
    fn test_accepts_long_text_with_digit() {
        assert!(LONG_WITH_DIGIT.chars().count() >= 60);
        assert!(is_high_quality(LONG_WITH_DIGIT));
    }

    #[test]
    fn test_rejects_long_text_without_metric() {
        let assessment = DefaultQualityGate::new().assess(LONG_WITHOUT_DIGIT);
        assert_eq!(assessment.decision, QualityDecision::Reject);
        assert_eq!(assessment.issues, vec![QualityIssue::MissingMetric]);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let gate = DefaultQualityGate::with_config(QualityGateConfig { min_length: 10 });
        // 9 characters, 18 bytes
        assert!(!gate.accepts("ééééé1234"));
    }

    #[test]
    fn test_exactly_minimum_length_passes() {
        let text = format!("{}1", "a".repeat(59));
        assert_eq!(text.chars().count(), 60);
        assert!(is_high_quality(&text));
    }

    #[test]
    fn test_clean_bullet_strips_latex_markup() {
        let raw = "Led \\textbf{3 teams}   across\n\\textit{two} regions \\\\ ";
        assert_eq!(clean_bullet(raw), "Led 3 teams across two regions");
    }

    #[test]
    fn test_clean_bullet_is_idempotent() {
        let samples = [
            "Led \\textbf{3 teams}   across\n regions \\\\ with 40% uptime",
            "\\textbf{\\textit{Nested}} wrappers \\\\ \\\\ here",
            "Stray \\textbf{\\}\\\\x edge",
            "  plain   text  ",
            "",
        ];
        for raw in samples {
            let once = clean_bullet(raw);
            assert_eq!(clean_bullet(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_audit_flags_truncated_lines() {
        assert_eq!(
            audit_line("Drove 30% growth by "),
            LineAudit::Broken(BrokenReason::TrailingSpace)
        );
        assert_eq!(
            audit_line("Drove \\textbf{30% growth"),
            LineAudit::Broken(BrokenReason::UnbalancedBraces)
        );
    }

    #[test]
    fn test_audit_escapes_specials_once() {
        assert_eq!(
            audit_line("R&D cut  costs 30% and $5k, already 10\\% off"),
            LineAudit::Clean("R\\&D cut costs 30\\% and \\$5k, already 10\\% off".to_string())
        );
    }

    #[test]
    fn test_audit_corpus_keeps_domains_and_order() {
        let mut corpus = RawCorpus::new();
        corpus.insert(
            Domain::It,
            vec!["first 10%".to_string(), "broken ".to_string(), "second & third".to_string()],
        );
        corpus.insert(Domain::Mechanical, vec![]);

        let outcome = audit_corpus(&corpus);
        assert_eq!(
            outcome.cleaned[&Domain::It],
            vec!["first 10\\%".to_string(), "second \\& third".to_string()]
        );
        assert!(outcome.cleaned[&Domain::Mechanical].is_empty());
        assert_eq!(outcome.broken.len(), 1);
        assert_eq!(outcome.broken[0].reason, BrokenReason::TrailingSpace);
    }
}
