use rand::RngCore;

use super::BulletStage;
use crate::domain::Domain;
use crate::pipeline::processing::normalize::registry::TerminologyRegistry;

/// Swaps generic phrasing for the domain's tool-specific wording
pub struct TerminologyInjection {
    registry: TerminologyRegistry,
}

impl TerminologyInjection {
    pub fn new(registry: TerminologyRegistry) -> Self {
        Self { registry }
    }
}

impl BulletStage for TerminologyInjection {
    fn name(&self) -> &'static str {
        "terminology_injection"
    }

    fn apply(&self, text: &str, domain: Domain, _rng: &mut dyn RngCore) -> String {
        match self.registry.table_for(domain) {
            Some(table) => table.apply(text),
            None => text.to_string(),
        }
    }
}
