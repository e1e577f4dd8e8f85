use std::fs;
use std::path::Path;

use crate::error::{LevelError, ShapeError};
use crate::grid::GridMap;

// ============================================================================
// Built-in level
// ============================================================================

pub const DEFAULT_START: [&str; 10] = [
    "########",
    "###  ###",
    "###  ###",
    "#444566#",
    "## 556##",
    "#      #",
    "#222333#",
    "#2 11 3#",
    "#  11  #",
    "########",
];

pub const DEFAULT_GOAL: [&str; 10] = [
    "########",
    "###11###",
    "###11###",
    "#      #",
    "##    ##",
    "#      #",
    "#      #",
    "#      #",
    "#      #",
    "########",
];

// ============================================================================
// Level
// ============================================================================

/// A start layout together with the goal it has to reach.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Level {
    pub start: GridMap,
    pub goal: GridMap,
}

impl Level {
    pub fn new<S: AsRef<str>, G: AsRef<str>>(start: &[S], goal: &[G]) -> Result<Self, ShapeError> {
        Self::from_maps(GridMap::parse(start)?, GridMap::parse(goal)?)
    }

    pub fn from_maps(start: GridMap, goal: GridMap) -> Result<Self, ShapeError> {
        if start.rows() != goal.rows() || start.cols() != goal.cols() {
            return Err(ShapeError::DimensionMismatch {
                rows: start.rows(),
                cols: start.cols(),
                goal_rows: goal.rows(),
                goal_cols: goal.cols(),
            });
        }
        Ok(Self { start, goal })
    }

    /// Parses level text: the start rows, one empty line, then the goal rows.
    pub fn parse(text: &str) -> Result<Self, ShapeError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        let split = lines
            .iter()
            .position(|line| line.is_empty())
            .ok_or(ShapeError::MissingGoal)?;
        let (start, rest) = lines.split_at(split);
        let goal_len = rest[1..].iter().take_while(|line| !line.is_empty()).count();
        if goal_len == 0 {
            return Err(ShapeError::MissingGoal);
        }
        let (goal, tail) = rest[1..].split_at(goal_len);
        // Only blank lines may follow the goal map.
        if let Some(extra) = tail.iter().position(|line| !line.is_empty()) {
            return Err(ShapeError::TrailingContent {
                line: split + goal_len + extra + 2,
            });
        }
        Self::new(start, goal)
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text)?)
    }

    pub fn builtin() -> Self {
        Self {
            start: GridMap::parse(&DEFAULT_START).unwrap_or_else(|err| unreachable!("{err}")),
            goal: GridMap::parse(&DEFAULT_GOAL).unwrap_or_else(|err| unreachable!("{err}")),
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::builtin()
    }
}
