//! Collision-aware motion resolution.
//!
//! A drag request is turned into the largest per-tick displacement the piece
//! can legally make. Motion is probed in `move_unit` steps: diagonally first,
//! then vertically, then horizontally. The order decides which way a piece
//! slides when the diagonal is blocked but both axes are open, so it has to
//! stay fixed for replays to match.

use crate::config::Config;
use crate::grid::GridMap;
use crate::piece::{Piece, Pixel};

/// Largest achievable displacement towards `requested` for `piece` on the
/// working `map` (the piece's own cells already cleared).
pub fn resolve(piece: &Piece, requested: Pixel, map: &GridMap, config: &Config) -> Pixel {
    let cells: Vec<Pixel> = piece.cell_pixels(config.block_size).collect();
    resolve_cells(&cells, piece.token(), requested, map, config)
}

/// Same as [`resolve`] for an explicit list of cell corners in pixel space.
pub fn resolve_cells(
    cells: &[Pixel],
    token: char,
    requested: Pixel,
    map: &GridMap,
    config: &Config,
) -> Pixel {
    let unit = config.move_unit;
    let cap = config.max_speed.max(0) as u32;
    let sign_x = if requested.x < 0 { -1 } else { 1 };
    let sign_y = if requested.y < 0 { -1 } else { 1 };
    let max_y = requested.y.unsigned_abs().min(cap) as i32;
    let max_x = requested.x.unsigned_abs().min(cap) as i32;
    let less_max = max_x.min(max_y);

    let movable = |x: i32, y: i32| {
        is_movable(
            cells,
            token,
            Pixel::new(x * sign_x, y * sign_y),
            map,
            config.block_size,
        )
    };

    let mut xy = 0;
    while xy + unit <= less_max && movable(xy + unit, xy + unit) {
        xy += unit;
    }

    let (mut x, mut y) = (xy, xy);
    while y + unit <= max_y && movable(x, y + unit) {
        y += unit;
    }
    while x + unit <= max_x && movable(x + unit, y) {
        x += unit;
    }

    Pixel::new(x * sign_x, y * sign_y)
}

/// Whether every cell shifted by `offset` stays on the map and clear of
/// every occupied cell that does not belong to `token`.
pub fn is_movable(
    cells: &[Pixel],
    token: char,
    offset: Pixel,
    map: &GridMap,
    block_size: i32,
) -> bool {
    let width = map.pixel_width(block_size);
    let height = map.pixel_height(block_size);

    cells.iter().all(|&cell| {
        let Pixel { x, y } = cell + offset;
        if x < 0 || y < 0 || x + block_size > width || y + block_size > height {
            return false;
        }
        // Grid cells the shifted box overlaps; the far edge is exclusive.
        let cols = (x / block_size)..=((x + block_size - 1) / block_size);
        let mut rows = (y / block_size)..=((y + block_size - 1) / block_size);
        !rows.any(|row| {
            cols.clone()
                .any(|col| map.is_occupied_excluding(row as usize, col as usize, token))
        })
    })
}
