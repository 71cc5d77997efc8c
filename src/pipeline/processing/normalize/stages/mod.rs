// Individual pipeline stages, in the order the pipeline applies them
pub mod jitter;
pub mod financial;
pub mod variety;
pub mod terminology;
pub mod latex;

use rand::RngCore;

use crate::domain::Domain;

/// One text transform in the bullet normalization chain
pub trait BulletStage: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Transform `text`; randomized stages draw from `rng`
    fn apply(&self, text: &str, domain: Domain, rng: &mut dyn RngCore) -> String;
}

// Re-export the main components
pub use financial::{
    find_financial_mention, ExchangeRate, FinancialBalancer, FinancialMention, FinancialPolicy,
};
pub use jitter::{CountJitter, JitterRange, PercentJitter};
pub use latex::{escape_latex, LatexEscape};
pub use terminology::TerminologyInjection;
pub use variety::ConnectiveVariety;
