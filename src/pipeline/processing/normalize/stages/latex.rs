use rand::RngCore;

use super::BulletStage;
use crate::domain::Domain;

/// Prefixes each of `specials` with a backslash unless one is already there
pub fn escape_latex(text: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut previous = None;
    for c in text.chars() {
        if specials.contains(&c) && previous != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

/// Keeps a bullet safe inside `\item{...}`
pub struct LatexEscape;

impl LatexEscape {
    pub const SPECIALS: [char; 2] = ['%', '$'];
}

impl BulletStage for LatexEscape {
    fn name(&self) -> &'static str {
        "latex_escape"
    }

    fn apply(&self, text: &str, _domain: Domain, _rng: &mut dyn RngCore) -> String {
        escape_latex(text, &Self::SPECIALS)
    }
}
