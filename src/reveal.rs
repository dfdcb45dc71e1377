use std::collections::HashSet;

use crate::observer::VisibilityChange;

pub const HIDDEN_STYLE: &str =
    "opacity: 0; transform: translateY(30px); transition: opacity 0.6s ease, transform 0.6s ease;";
pub const REVEALED_STYLE: &str =
    "opacity: 1; transform: translateY(0); transition: opacity 0.6s ease, transform 0.6s ease;";

pub const CARD_RESTING_TRANSFORM: &str = "transform: translateY(0);";
pub const CARD_HOVER_TRANSFORM: &str = "transform: translateY(-8px);";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealTracker {
    revealed: HashSet<String>,
}

impl RevealTracker {
    pub fn observe(&mut self, batch: &[VisibilityChange]) -> Vec<String> {
        batch
            .iter()
            .filter(|change| change.intersecting)
            .filter(|change| self.revealed.insert(change.id.clone()))
            .map(|change| change.id.clone())
            .collect()
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.revealed.contains(id)
    }

    pub fn style_for(&self, id: &str) -> &'static str {
        if self.is_revealed(id) {
            REVEALED_STYLE
        } else {
            HIDDEN_STYLE
        }
    }
}

pub fn card_style(hovered: bool) -> &'static str {
    if hovered {
        CARD_HOVER_TRANSFORM
    } else {
        CARD_RESTING_TRANSFORM
    }
}
