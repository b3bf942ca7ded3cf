/// Deterministic domain → group color assignment
use std::collections::HashMap;

use crate::tab_data::TabGroupColor;

/// Colors handed out to new domains, cycled in this order
pub const PALETTE: [TabGroupColor; 8] = [
    TabGroupColor::Grey,
    TabGroupColor::Blue,
    TabGroupColor::Red,
    TabGroupColor::Yellow,
    TabGroupColor::Green,
    TabGroupColor::Pink,
    TabGroupColor::Purple,
    TabGroupColor::Cyan,
];

/// Round-robin color assignment, remembered for the life of the engine.
///
/// Entries are never removed or reassigned, so a domain grouped twice always
/// asks for the same color. Nothing is persisted: a restarted engine may hand
/// out different colors.
#[derive(Debug, Default)]
pub struct ColorAssigner {
    colors: HashMap<String, TabGroupColor>,
    next: usize,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&mut self, domain: &str) -> TabGroupColor {
        if let Some(color) = self.colors.get(domain) {
            return *color;
        }

        let color = PALETTE[self.next % PALETTE.len()];
        self.next += 1;
        self.colors.insert(domain.to_string(), color);
        color
    }

    /// Color already recorded for a domain, without assigning one
    pub fn assigned(&self, domain: &str) -> Option<TabGroupColor> {
        self.colors.get(domain).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn reset(&mut self) {
        self.colors.clear();
        self.next = 0;
    }
}
