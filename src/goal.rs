use crate::grid::{Cell, GridMap};

/// True when every non-empty goal cell holds the same token on the live map.
/// Empty goal cells are wildcards.
pub fn matches(live: &GridMap, goal: &GridMap) -> bool {
    goal.iter()
        .filter(|(_, cell)| *cell != Cell::Empty)
        .all(|(pos, cell)| live.cell(pos) == Some(cell))
}
