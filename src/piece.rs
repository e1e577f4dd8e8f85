use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::grid::{Edges, GridPos};

// ============================================================================
// Pixel coordinates
// ============================================================================

/// A point or a displacement in map pixel space.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    pub const ZERO: Pixel = Pixel { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Top-left corner of a grid cell.
    pub fn of_cell(pos: GridPos, block_size: i32) -> Self {
        Self {
            x: pos.col as i32 * block_size,
            y: pos.row as i32 * block_size,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl Add for Pixel {
    type Output = Pixel;

    fn add(self, rhs: Pixel) -> Pixel {
        Pixel::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pixel {
    type Output = Pixel;

    fn sub(self, rhs: Pixel) -> Pixel {
        Pixel::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Pixel {
    fn add_assign(&mut self, rhs: Pixel) {
        *self = *self + rhs;
    }
}

impl SubAssign for Pixel {
    fn sub_assign(&mut self, rhs: Pixel) {
        *self = *self - rhs;
    }
}

// ============================================================================
// Piece
// ============================================================================

/// A piece lifted off the map for the duration of one drag.
///
/// `position` is the anchor cell's top-left pixel; every other cell sits at a
/// fixed offset from it. `accumulator` is drag distance not yet turned into
/// motion.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    token: char,
    offsets: Vec<(isize, isize)>,
    origin: Pixel,
    position: Pixel,
    accumulator: Pixel,
}

impl Piece {
    /// Lifts the piece whose cells are `cells` (anchor first). Returns `None`
    /// for an empty footprint.
    pub fn new(token: char, cells: &[GridPos], block_size: i32) -> Option<Self> {
        let anchor = *cells.first()?;
        let offsets = cells
            .iter()
            .map(|pos| {
                (
                    pos.row as isize - anchor.row as isize,
                    pos.col as isize - anchor.col as isize,
                )
            })
            .collect();
        let origin = Pixel::of_cell(anchor, block_size);
        Some(Self {
            token,
            offsets,
            origin,
            position: origin,
            accumulator: Pixel::ZERO,
        })
    }

    pub fn token(&self) -> char {
        self.token
    }

    /// Anchor position recorded when the drag started.
    pub fn origin(&self) -> Pixel {
        self.origin
    }

    pub fn position(&self) -> Pixel {
        self.position
    }

    pub fn accumulator(&self) -> Pixel {
        self.accumulator
    }

    pub fn has_moved(&self) -> bool {
        self.position != self.origin
    }

    /// Top-left pixel of every cell, anchor first.
    pub fn cell_pixels(&self, block_size: i32) -> impl Iterator<Item = Pixel> + '_ {
        self.offsets.iter().map(move |&(dr, dc)| {
            self.position + Pixel::new(dc as i32 * block_size, dr as i32 * block_size)
        })
    }

    pub fn accumulate(&mut self, delta: Pixel) {
        self.accumulator += delta;
    }

    pub fn set_accumulator(&mut self, delta: Pixel) {
        self.accumulator = delta;
    }

    /// Moves the piece by `motion` and removes it from the outstanding drag.
    pub fn apply(&mut self, motion: Pixel) {
        self.position += motion;
        self.accumulator -= motion;
    }

    /// Delta that brings the anchor onto the nearest grid line on each axis.
    pub fn snap_delta(&self, block_size: i32) -> Pixel {
        let snap = |coord: i32| {
            let rem = coord.rem_euclid(block_size);
            if rem < block_size / 2 {
                -rem
            } else {
                block_size - rem
            }
        };
        Pixel::new(snap(self.position.x), snap(self.position.y))
    }

    pub fn is_aligned(&self, block_size: i32) -> bool {
        self.position.x.rem_euclid(block_size) == 0 && self.position.y.rem_euclid(block_size) == 0
    }

    /// Grid cells the piece covers at its current, grid-aligned position.
    pub fn grid_cells(&self, block_size: i32) -> Vec<GridPos> {
        debug_assert!(self.is_aligned(block_size), "piece {:?} is off-grid", self.token);
        let anchor_row = self.position.y.div_euclid(block_size) as isize;
        let anchor_col = self.position.x.div_euclid(block_size) as isize;
        self.offsets
            .iter()
            .map(|&(dr, dc)| GridPos::new((anchor_row + dr) as usize, (anchor_col + dc) as usize))
            .collect()
    }

    /// Outline of the cell at `index` within the piece's own footprint.
    pub fn edges(&self, index: usize) -> Edges {
        let Some(&(row, col)) = self.offsets.get(index) else {
            return Edges::default();
        };
        Edges::from_neighbours(|dr, dc| self.offsets.contains(&(row + dr, col + dc)))
    }
}
