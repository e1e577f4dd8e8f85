//! Sliding-block (Klotski) puzzle engine.
//!
//! The library holds the drag/collision core: [`grid::GridMap`] occupancy,
//! the [`motion`] resolver, the [`drag::DragController`] lifecycle and the
//! [`goal`] check. Rendering, input and frame scheduling are injected through
//! the traits in [`drag`].

pub mod config;
pub mod drag;
pub mod error;
pub mod goal;
pub mod grid;
pub mod level;
pub mod motion;
pub mod piece;

pub use config::Config;
pub use drag::{
    BoardView, DragController, DragEvent, DragListener, DragState, EventLog, FrameScheduler,
    RenderSink, TickScheduler,
};
pub use error::{LevelError, ShapeError};
pub use grid::{Cell, GridMap, GridPos};
pub use level::Level;
pub use piece::{Piece, Pixel};
