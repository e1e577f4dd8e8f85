use std::path::PathBuf;

use thiserror::Error;

/// Malformed layout or sizing input. Fatal at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("map has no rows")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("goal map is {goal_rows}x{goal_cols} but start map is {rows}x{cols}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        goal_rows: usize,
        goal_cols: usize,
    },

    #[error("block size {block_size} is not a multiple of move unit {move_unit}")]
    UnitMismatch { block_size: i32, move_unit: i32 },

    #[error("max speed {max_speed} is below move unit {move_unit}, nothing could ever move")]
    SpeedBelowUnit { max_speed: i32, move_unit: i32 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: i32 },

    #[error("level text has no goal section (expected an empty line after the start map)")]
    MissingGoal,

    #[error("unexpected content on line {line} after the goal map")]
    TrailingContent { line: usize },
}

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("failed to read level file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Shape(#[from] ShapeError),
}
