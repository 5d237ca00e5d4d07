//! Post-rotation placement correction
//!
//! There is no kick table. A rotated piece is translated back inside the
//! board, then lifted off anything it sank into. Alternate rotation offsets
//! are never tried.

use crate::board::Board;
use crate::tetromino::{Coord, Tetromino};

/// Shift `anchor` so every cell of `piece` lies inside the board.
///
/// Cells left of column 0 or below row 0 are pulled in first; overhang past
/// the right or top edge is then pushed back, never past column/row 0.
pub fn clamp_to_bounds(board: &Board, piece: &Tetromino, anchor: Coord) -> Coord {
    let mut pos = anchor;

    let cells = piece.cells_at(pos);
    let min_x = cells.iter().map(|c| c.x).min().unwrap_or(0).min(0);
    let min_y = cells.iter().map(|c| c.y).min().unwrap_or(0).min(0);
    pos.x -= min_x;
    pos.y -= min_y;

    let cells = piece.cells_at(pos);
    let width = board.width() as i32;
    let height = board.height() as i32;
    let low_x = cells.iter().map(|c| c.x).min().unwrap_or(0);
    let low_y = cells.iter().map(|c| c.y).min().unwrap_or(0);
    let over_x = cells.iter().map(|c| c.x - width + 1).max().unwrap_or(0).max(0);
    let over_y = cells.iter().map(|c| c.y - height + 1).max().unwrap_or(0).max(0);
    pos.x -= over_x.min(low_x);
    pos.y -= over_y.min(low_y);

    pos
}

/// Lift a piece that sank into the stack.
///
/// A piece that overlaps nothing is already legal and is returned unchanged,
/// even when it rests on the stack. Otherwise it moves up a row at a time and
/// stops on the first row where it overlaps nothing, which leaves it resting
/// on the surface it was lifted from. Returns None if every such row would
/// push a cell past the top edge.
pub fn settle(board: &Board, piece: &Tetromino, anchor: Coord) -> Option<Coord> {
    let top = board.height() as i32;
    let mut pos = anchor;
    while board.overlaps(piece, pos) {
        pos.y += 1;
        if piece.cells_at(pos).iter().any(|c| c.y >= top) {
            return None;
        }
    }
    Some(pos)
}

/// Full correction applied after every rotation
pub fn normalize(board: &Board, piece: &Tetromino, anchor: Coord) -> Option<Coord> {
    let clamped = clamp_to_bounds(board, piece, anchor);
    settle(board, piece, clamped)
}
