use std::collections::BTreeMap;
use std::fmt;

use crate::error::ShapeError;

// ============================================================================
// Cells
// ============================================================================

pub const EMPTY_TOKEN: char = ' ';
pub const WALL_TOKEN: char = '#';

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Cell {
    Empty,
    Wall,
    Block(char),
}

impl Cell {
    pub fn from_token(token: char) -> Self {
        match token {
            EMPTY_TOKEN => Cell::Empty,
            WALL_TOKEN => Cell::Wall,
            other => Cell::Block(other),
        }
    }

    pub fn token(self) -> char {
        match self {
            Cell::Empty => EMPTY_TOKEN,
            Cell::Wall => WALL_TOKEN,
            Cell::Block(token) => token,
        }
    }

    /// Only non-reserved cells can be picked up and dragged.
    pub fn is_draggable(self) -> bool {
        matches!(self, Cell::Block(_))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Sides of a cell that border a different token (or the map edge).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Edges {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Edges {
    /// Builds edges from a predicate answering "is the neighbour at
    /// (row delta, col delta) part of the same piece?".
    pub fn from_neighbours(same: impl Fn(isize, isize) -> bool) -> Self {
        Self {
            top: !same(-1, 0),
            bottom: !same(1, 0),
            left: !same(0, -1),
            right: !same(0, 1),
        }
    }
}

// ============================================================================
// GridMap
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GridMap {
    cells: Vec<Vec<Cell>>,
    // token -> cells in row-major order, first entry is the anchor
    pieces: BTreeMap<char, Vec<GridPos>>,
}

impl GridMap {
    /// Parses a layout where every character of every row is one cell token.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, ShapeError> {
        let cells = rows
            .iter()
            .map(|row| row.as_ref().chars().map(Cell::from_token).collect())
            .collect();
        Self::from_cells(cells)
    }

    pub fn from_cells(cells: Vec<Vec<Cell>>) -> Result<Self, ShapeError> {
        let mut map = Self {
            cells,
            pieces: BTreeMap::new(),
        };
        map.validate_shape()?;
        map.pieces = map.index_pieces();
        Ok(map)
    }

    pub fn validate_shape(&self) -> Result<(), ShapeError> {
        let expected = match self.cells.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err(ShapeError::Empty),
        };
        for (row, cells) in self.cells.iter().enumerate() {
            if cells.len() != expected {
                return Err(ShapeError::RaggedRow {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }
        Ok(())
    }

    fn index_pieces(&self) -> BTreeMap<char, Vec<GridPos>> {
        let mut pieces: BTreeMap<char, Vec<GridPos>> = BTreeMap::new();
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if let Cell::Block(token) = cell {
                    pieces.entry(*token).or_default().push(GridPos::new(row, col));
                }
            }
        }
        pieces
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn pixel_width(&self, block_size: i32) -> i32 {
        self.cols() as i32 * block_size
    }

    pub fn pixel_height(&self, block_size: i32) -> i32 {
        self.rows() as i32 * block_size
    }

    pub fn cell(&self, pos: GridPos) -> Option<Cell> {
        self.cells.get(pos.row).and_then(|row| row.get(pos.col)).copied()
    }

    /// Token to ordered cell positions for every draggable piece on the map.
    pub fn pieces(&self) -> &BTreeMap<char, Vec<GridPos>> {
        &self.pieces
    }

    /// Iterates every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (GridPos::new(row, col), *cell))
        })
    }

    /// Returns a copy of the map with every cell of `token` emptied, plus the
    /// positions those cells occupied (row-major, anchor first).
    pub fn extract_piece(&self, token: char) -> (GridMap, Vec<GridPos>) {
        let mut working = self.clone();
        let positions = working.pieces.remove(&token).unwrap_or_default();
        for pos in &positions {
            working.cells[pos.row][pos.col] = Cell::Empty;
        }
        (working, positions)
    }

    /// Writes `token` back at `positions`. Inverse of [`GridMap::extract_piece`].
    pub fn commit(&mut self, token: char, positions: &[GridPos]) {
        debug_assert!(
            !self.pieces.contains_key(&token),
            "piece {token:?} committed while still on the map"
        );
        for pos in positions {
            debug_assert_eq!(self.cell(*pos), Some(Cell::Empty), "commit onto occupied {pos:?}");
            self.cells[pos.row][pos.col] = Cell::Block(token);
        }
        self.pieces.insert(token, positions.to_vec());
    }

    pub fn is_occupied_excluding(&self, row: usize, col: usize, excluded: char) -> bool {
        match self.cell(GridPos::new(row, col)) {
            None | Some(Cell::Empty) => false,
            Some(cell) => cell.token() != excluded,
        }
    }

    /// Hit-test in pixel space: the first non-empty cell in row-major order
    /// whose box (edges inclusive) contains the point.
    pub fn block_at_pixel(&self, x: i32, y: i32, block_size: i32) -> Option<(GridPos, Cell)> {
        self.iter().filter(|(_, cell)| *cell != Cell::Empty).find(|(pos, _)| {
            let left = pos.col as i32 * block_size;
            let top = pos.row as i32 * block_size;
            left <= x && x <= left + block_size && top <= y && y <= top + block_size
        })
    }

    pub fn edges(&self, pos: GridPos) -> Edges {
        let Some(cell) = self.cell(pos) else {
            return Edges::default();
        };
        Edges::from_neighbours(|dr, dc| {
            let (Some(row), Some(col)) = (
                pos.row.checked_add_signed(dr),
                pos.col.checked_add_signed(dc),
            ) else {
                return false;
            };
            self.cell(GridPos::new(row, col)) == Some(cell)
        })
    }

    pub fn rows_as_strings(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.token()).collect())
            .collect()
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows_as_strings() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
