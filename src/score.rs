//! Line-clear scoring and session counters

use serde::{Deserialize, Serialize};

/// Lines needed per level
pub const LINES_PER_LEVEL: u32 = 10;

/// Base points for clearing `lines` rows in one lock, before the level
/// multiplier. Five or more rows in one lock has no entry and scores nothing.
pub fn base_points(lines: u32) -> u32 {
    match lines {
        1 => 100,
        2 => 300,
        3 => 500,
        4 => 800,
        _ => 0,
    }
}

/// Level reached after `lines` total cleared rows
pub fn level_for(lines: u32) -> u32 {
    1 + lines / LINES_PER_LEVEL
}

/// Score, level and line counters for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            lines_cleared: 0,
        }
    }

    /// Record a lock that cleared `lines` rows. The level is recomputed from
    /// the new line total before the multiplier is applied.
    /// Returns the points awarded.
    pub fn add_clear(&mut self, lines: u32) -> u32 {
        if lines == 0 {
            return 0;
        }

        self.lines_cleared += lines;
        self.level = level_for(self.lines_cleared);

        let points = base_points(lines) * self.level;
        self.score += points;
        points
    }
}
