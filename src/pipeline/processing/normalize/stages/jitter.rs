use once_cell::sync::Lazy;
use rand::{Rng, RngCore};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::BulletStage;
use crate::domain::Domain;

static PERCENT_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(\\?%)").expect("percent literal regex compiles"));

static PLUS_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\+").expect("plus count regex compiles"));

/// Signed offset range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterRange {
    pub low: i64,
    pub high: i64,
}

impl JitterRange {
    pub const fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }

    fn draw(&self, rng: &mut dyn RngCore) -> i64 {
        let (low, high) = if self.low <= self.high {
            (self.low, self.high)
        } else {
            (self.high, self.low)
        };
        rng.gen_range(low..=high)
    }
}

/// Replaces every `N%` with `max(0, N + r)%`, keeping a `\%` escape as is
pub fn jitter_percentages(text: &str, range: JitterRange, rng: &mut dyn RngCore) -> String {
    PERCENT_LITERAL
        .replace_all(text, |caps: &Captures| match caps[1].parse::<i64>() {
            Ok(value) => format!("{}{}", value.saturating_add(range.draw(rng)).max(0), &caps[2]),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

/// Replaces every `N+` with a plain, larger integer
pub fn jitter_counts(text: &str, range: JitterRange, rng: &mut dyn RngCore) -> String {
    PLUS_COUNT
        .replace_all(text, |caps: &Captures| match caps[1].parse::<i64>() {
            Ok(value) => value.saturating_add(range.draw(rng)).max(0).to_string(),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

pub struct PercentJitter {
    range: JitterRange,
}

impl PercentJitter {
    pub fn new(range: JitterRange) -> Self {
        Self { range }
    }
}

impl BulletStage for PercentJitter {
    fn name(&self) -> &'static str {
        "percent_jitter"
    }

    fn apply(&self, text: &str, _domain: Domain, rng: &mut dyn RngCore) -> String {
        jitter_percentages(text, self.range, rng)
    }
}

pub struct CountJitter {
    range: JitterRange,
}

impl CountJitter {
    pub fn new(range: JitterRange) -> Self {
        Self { range }
    }
}

impl BulletStage for CountJitter {
    fn name(&self) -> &'static str {
        "count_jitter"
    }

    fn apply(&self, text: &str, _domain: Domain, rng: &mut dyn RngCore) -> String {
        jitter_counts(text, self.range, rng)
    }
}
