use std::ops::Range;

use once_cell::sync::Lazy;
use rand::{Rng, RngCore};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::BulletStage;
use crate::constants::{BASE_INR_PER_USD, FINANCIAL_CONNECTIVES, INR_PER_CRORE, INR_PER_LAKH};
use crate::domain::Domain;

/// `, <connective> [an additional] <amount> [in revenue [growth]]`, where a
/// USD amount may carry a LaTeX-escaped `\$`
static FINANCIAL_PHRASE: Lazy<Regex> = Lazy::new(|| {
    let connectives = FINANCIAL_CONNECTIVES
        .iter()
        .map(|c| regex::escape(c))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r"(?i), (?P<connective>{connectives}) (?:an additional )?(?P<amount>Rs\. [\d.]+ (?:Cr|Lakhs)|\\?\$\d+(?:,\d{{3}})*(?:\.\d+)?(?: ?million)?)(?: in revenue(?: growth)?)?"
    );
    Regex::new(&pattern).expect("financial phrase regex compiles")
});

static USD_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\?\$\d+(?:,\d{3})*(?:\.\d+)?(?:\s?(?i:million))?").expect("usd amount regex compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Inr,
}

/// A connective phrase followed by a monetary amount, found in a single bullet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialMention {
    pub connective: String,
    pub amount: String,
    pub currency: Currency,
    /// Byte range of the whole phrase, leading comma included
    pub span: Range<usize>,
}

/// Finds the first financial phrase in `text`
pub fn find_financial_mention(text: &str) -> Option<FinancialMention> {
    let caps = FINANCIAL_PHRASE.captures(text)?;
    let whole = caps.get(0)?;
    let amount = caps.name("amount")?.as_str();
    let currency = if amount.trim_start_matches('\\').starts_with('$') {
        Currency::Usd
    } else {
        Currency::Inr
    };

    Some(FinancialMention {
        connective: caps.name("connective")?.as_str().to_string(),
        amount: amount.to_string(),
        currency,
        span: whole.range(),
    })
}

/// Rupees-per-dollar rate with symmetric integer noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base: i64,
    pub noise: i64,
}

impl ExchangeRate {
    pub const fn fixed(base: i64) -> Self {
        Self { base, noise: 0 }
    }

    pub const fn jittered(base: i64, noise: i64) -> Self {
        Self { base, noise }
    }

    pub fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        let noise = self.noise.abs();
        let offset = if noise == 0 {
            0
        } else {
            rng.gen_range(-noise..=noise)
        };
        (self.base + offset) as f64
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self::fixed(BASE_INR_PER_USD)
    }
}

/// Parses `$1,250,000`, `$2.5 million` or `$3million` into dollars
pub fn parse_usd(amount: &str) -> Option<f64> {
    let is_million = amount.to_ascii_lowercase().contains("million");
    let digits: String = amount
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = digits.parse().ok()?;
    Some(if is_million { value * 1_000_000.0 } else { value })
}

pub fn usd_to_inr(usd: f64, rate: f64) -> f64 {
    usd * rate
}

/// Renders rupees as crores (2 decimals) from 1 crore upward, else as whole lakhs
pub fn format_inr(inr: f64) -> String {
    if inr >= INR_PER_CRORE {
        format!("Rs. {:.2} Cr", inr / INR_PER_CRORE)
    } else {
        format!("Rs. {} Lakhs", (inr / INR_PER_LAKH).trunc() as i64)
    }
}

/// Converts every USD amount in `text` to INR, drawing a fresh rate per amount.
/// An escaped `\$` is consumed along with the amount.
pub fn convert_usd_amounts(text: &str, rate: ExchangeRate, rng: &mut dyn RngCore) -> String {
    USD_AMOUNT
        .replace_all(text, |caps: &Captures| match parse_usd(&caps[0]) {
            Some(usd) => format_inr(usd_to_inr(usd, rate.draw(rng))),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Removes every financial phrase and keeps the sentence terminated
pub fn strip_financial_phrases(text: &str) -> String {
    let stripped = FINANCIAL_PHRASE.replace_all(text, "");
    let mut out = stripped
        .trim()
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | ':'))
        .trim_end()
        .to_string();
    if !out.ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
        out.push('.');
    }
    out
}

/// How the financial stage treats money in a bullet
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FinancialPolicy {
    Off,
    /// Drop the phrase with `strip_probability`, otherwise localize USD amounts
    Balance {
        strip_probability: f64,
        rate: ExchangeRate,
    },
    /// Localize every USD amount
    Localize { rate: ExchangeRate },
}

pub struct FinancialBalancer {
    policy: FinancialPolicy,
}

impl FinancialBalancer {
    pub fn new(policy: FinancialPolicy) -> Self {
        Self { policy }
    }
}

impl BulletStage for FinancialBalancer {
    fn name(&self) -> &'static str {
        "financial_balancer"
    }

    fn apply(&self, text: &str, _domain: Domain, rng: &mut dyn RngCore) -> String {
        match self.policy {
            FinancialPolicy::Off => text.to_string(),
            FinancialPolicy::Localize { rate } => convert_usd_amounts(text, rate, rng),
            FinancialPolicy::Balance {
                strip_probability,
                rate,
            } => {
                let Some(mention) = find_financial_mention(text) else {
                    return text.to_string();
                };
                if rng.gen_bool(strip_probability.clamp(0.0, 1.0)) {
                    strip_financial_phrases(text)
                } else if mention.currency == Currency::Usd {
                    convert_usd_amounts(text, rate, rng)
                } else {
                    text.to_string()
                }
            }
        }
    }
}
