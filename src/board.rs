//! Playing field grid and cell states

use crate::tetromino::{Coord, Direction, Tetromino};
use serde::{Deserialize, Serialize};

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Block {
    #[default]
    Empty,
    /// Reserved but not filled; never counts as occupied
    Reserved,
    /// Landing preview; never written to the board
    Ghost,
    /// Part of a full row waiting for the clear animation to finish
    Cleared,

    Garbage,
    Cyan,
    Yellow,
    Purple,
    Green,
    Red,
    Blue,
    Orange,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        matches!(self, Block::Empty)
    }

    /// Whether this cell blocks movement and counts toward a full row
    pub fn is_occupied(&self) -> bool {
        !matches!(self, Block::Empty | Block::Reserved)
    }
}

/// The game board. Only built through [`Board::new`], so every row holds
/// exactly `width` cells and there are exactly `height` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    width: usize,
    height: usize,
    /// Grid stored as [row][col], row 0 is bottom, row increases upward
    rows: Vec<Vec<Block>>,
}

impl Board {
    /// Create a new empty board
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![Block::Empty; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the cell at (x, y), or None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Block> {
        if !self.in_bounds(Coord::new(x, y)) {
            return None;
        }
        Some(self.rows[y as usize][x as usize])
    }

    pub fn in_bounds(&self, pos: Coord) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Cell at an in-bounds position.
    ///
    /// Panics when `pos` is outside the board: every caller has already
    /// normalized or bounds-checked the position, so reaching here with a bad
    /// coordinate is an engine bug.
    pub fn cell(&self, pos: Coord) -> Block {
        assert!(self.in_bounds(pos), "board read out of bounds at {:?}", pos);
        self.rows[pos.y as usize][pos.x as usize]
    }

    /// Write a cell at an in-bounds position. Panics like [`Board::cell`].
    pub fn set(&mut self, pos: Coord, block: Block) {
        assert!(self.in_bounds(pos), "board write out of bounds at {:?}", pos);
        self.rows[pos.y as usize][pos.x as usize] = block;
    }

    /// True if `pos` is inside the board and holds an occupied cell
    pub fn is_occupied(&self, pos: Coord) -> bool {
        self.in_bounds(pos) && self.cell(pos).is_occupied()
    }

    /// Check if a position is valid for a piece cell (within bounds and free)
    pub fn is_free(&self, pos: Coord) -> bool {
        self.in_bounds(pos) && !self.cell(pos).is_occupied()
    }

    /// True if any cell of `piece` at `anchor` sits on the floor or directly
    /// above an occupied cell
    pub fn collides_lower(&self, piece: &Tetromino, anchor: Coord) -> bool {
        piece
            .cells_at(anchor)
            .iter()
            .any(|&pos| pos.y <= 0 || self.is_occupied(pos.offset(0, -1)))
    }

    /// True if shifting `piece` one column toward `direction` would leave the
    /// board or land on an occupied cell
    pub fn collides_side(&self, piece: &Tetromino, anchor: Coord, direction: Direction) -> bool {
        piece
            .cells_at(anchor)
            .iter()
            .any(|&pos| !self.is_free(pos.offset(direction.dx(), 0)))
    }

    /// True if any cell of `piece` at `anchor` is out of bounds or occupied
    pub fn overlaps(&self, piece: &Tetromino, anchor: Coord) -> bool {
        piece.cells_at(anchor).iter().any(|&pos| !self.is_free(pos))
    }

    /// Where `piece` would come to rest if dropped straight down from
    /// `anchor`
    pub fn lower_collide_coord(&self, piece: &Tetromino, anchor: Coord) -> Coord {
        let mut pos = anchor;
        while !self.collides_lower(piece, pos) {
            pos.y -= 1;
        }
        pos
    }

    /// Write every cell of `piece` at `anchor` into the grid
    pub fn lock_piece(&mut self, piece: &Tetromino, anchor: Coord) {
        for (block, offset) in piece.blocks {
            self.set(anchor + offset, block);
        }
    }

    /// Check if a row has no Empty or Reserved cell
    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows[y].iter().all(Block::is_occupied)
    }

    /// Tag every full row among `candidates` as Cleared and return how many
    /// were tagged. Rows stay in place until [`Board::collapse_cleared`].
    pub fn mark_full_rows(&mut self, candidates: impl IntoIterator<Item = usize>) -> usize {
        let mut rows: Vec<usize> = candidates.into_iter().filter(|&y| y < self.height).collect();
        rows.sort_unstable();
        rows.dedup();

        let mut marked = 0;
        for y in rows {
            if self.is_row_full(y) {
                self.rows[y].fill(Block::Cleared);
                marked += 1;
            }
        }
        marked
    }

    fn is_row_cleared(&self, y: usize) -> bool {
        self.rows[y].iter().all(|b| *b == Block::Cleared)
    }

    /// Remove rows tagged Cleared, shift the rows above them down and refill
    /// the top with empty rows. Returns the number of rows removed.
    pub fn collapse_cleared(&mut self) -> usize {
        let mut removed = 0;
        let mut write_row = 0;

        for read_row in 0..self.height {
            if self.is_row_cleared(read_row) {
                removed += 1;
                continue;
            }
            if write_row != read_row {
                self.rows.swap(write_row, read_row);
            }
            write_row += 1;
        }

        for row in &mut self.rows[write_row..] {
            row.fill(Block::Empty);
        }

        removed
    }

    /// Check if the board holds no occupied cells
    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|cell| !cell.is_occupied()))
    }

    /// Rows bottom to top
    pub fn rows(&self) -> impl Iterator<Item = &[Block]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
