use rand::seq::SliceRandom;
use rand::RngCore;

use super::BulletStage;
use crate::constants::VARIETY_CONNECTORS;
use crate::domain::Domain;

const REPETITIVE_CONNECTIVE: &str = "resulting in";

/// Swaps the first "resulting in" for a randomly chosen synonym
pub fn vary_connective(text: &str, rng: &mut dyn RngCore) -> String {
    if !text.contains(REPETITIVE_CONNECTIVE) {
        return text.to_string();
    }
    match VARIETY_CONNECTORS.choose(rng) {
        Some(connector) => text.replacen(REPETITIVE_CONNECTIVE, connector, 1),
        None => text.to_string(),
    }
}

pub struct ConnectiveVariety;

impl BulletStage for ConnectiveVariety {
    fn name(&self) -> &'static str {
        "connective_variety"
    }

    fn apply(&self, text: &str, _domain: Domain, rng: &mut dyn RngCore) -> String {
        vary_connective(text, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_only_first_occurrence_is_replaced() {
        let text = "Automated billing, resulting in 30% fewer tickets and resulting in faster closes";
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = vary_connective(text, &mut rng);
            assert_eq!(out.matches(REPETITIVE_CONNECTIVE).count(), 1);
            assert!(VARIETY_CONNECTORS.iter().any(|c| out.contains(&format!("billing, {c} 30%"))));
        }
    }

    #[test]
    fn test_capitalized_phrase_is_untouched() {
        let mut rng = StdRng::seed_from_u64(0);
        let text = "Resulting in a 25% reduction in costs.";
        assert_eq!(vary_connective(text, &mut rng), text);
    }
}
