//! Tetromino definitions and shapes
//!
//! All 7 standard tetrominoes with their spawn geometry. Rotation is a plain
//! 90° turn of the relative offsets around the piece's local origin; there is
//! no per-shape rotation state.

use crate::board::Block;
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Integer board position or piece-relative offset. `y` increases upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This coordinate moved by `dx` columns and `dy` rows
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Horizontal direction, used for both shifting and rotating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Column delta for a one-cell shift
    pub fn dx(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// The 7 tetromino shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    I, // Cyan - long bar
    O, // Yellow - square
    T, // Purple
    S, // Green
    Z, // Red
    J, // Blue
    L, // Orange
}

impl Shape {
    /// Get all shapes, in canonical order, for bag randomization
    pub fn all() -> [Shape; 7] {
        [
            Shape::I,
            Shape::O,
            Shape::T,
            Shape::S,
            Shape::Z,
            Shape::J,
            Shape::L,
        ]
    }

    /// Get the block color for this shape
    pub fn block(&self) -> Block {
        match self {
            Shape::I => Block::Cyan,
            Shape::O => Block::Yellow,
            Shape::T => Block::Purple,
            Shape::S => Block::Green,
            Shape::Z => Block::Red,
            Shape::J => Block::Blue,
            Shape::L => Block::Orange,
        }
    }

    /// Spawn offsets (x, y) relative to the pivot
    pub fn offsets(&self) -> [Coord; 4] {
        let c = Coord::new;
        match self {
            // ####
            Shape::I => [c(-1, 0), c(0, 0), c(1, 0), c(2, 0)],
            // ##
            // ##
            Shape::O => [c(0, 0), c(0, 1), c(1, 0), c(1, 1)],
            // .#.
            // ###
            Shape::T => [c(0, 1), c(-1, 0), c(0, 0), c(1, 0)],
            // .##
            // ##.
            Shape::S => [c(-1, 0), c(0, 0), c(0, 1), c(1, 1)],
            // ##.
            // .##
            Shape::Z => [c(0, 0), c(1, 0), c(-1, 1), c(0, 1)],
            // #..
            // ###
            Shape::J => [c(-1, 0), c(0, 0), c(1, 0), c(-1, 1)],
            // ..#
            // ###
            Shape::L => [c(-1, 0), c(0, 0), c(1, 0), c(1, 1)],
        }
    }
}

/// A piece: its shape plus four (block, relative offset) cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tetromino {
    pub shape: Shape,
    pub blocks: [(Block, Coord); 4],
}

impl Default for Tetromino {
    fn default() -> Self {
        Self::new(Shape::default())
    }
}

impl Tetromino {
    pub fn new(shape: Shape) -> Self {
        let mut tetromino = Self {
            shape,
            blocks: [(Block::Empty, Coord::default()); 4],
        };
        tetromino.regen_blocks();
        tetromino
    }

    /// Reset colors and offsets to the canonical spawn geometry of `shape`
    pub fn regen_blocks(&mut self) {
        let block = self.shape.block();
        for (cell, offset) in self.blocks.iter_mut().zip(self.shape.offsets()) {
            *cell = (block, offset);
        }
    }

    /// Rotate 90° around the local origin. The O piece never rotates.
    ///
    /// Left maps (x, y) to (-y, x); right maps (x, y) to (y, -x).
    pub fn rotate(&mut self, direction: Direction) {
        if self.shape == Shape::O {
            return;
        }

        for (_, offset) in self.blocks.iter_mut() {
            let Coord { x, y } = *offset;
            *offset = match direction {
                Direction::Left => Coord::new(-y, x),
                Direction::Right => Coord::new(y, -x),
            };
        }
    }

    /// Absolute positions of all 4 cells when anchored at `anchor`
    pub fn cells_at(&self, anchor: Coord) -> [Coord; 4] {
        self.blocks.map(|(_, offset)| anchor + offset)
    }

    /// Same geometry, every cell recolored as a ghost preview
    pub fn as_ghost(&self) -> Tetromino {
        Tetromino {
            shape: self.shape,
            blocks: self.blocks.map(|(_, offset)| (Block::Ghost, offset)),
        }
    }
}
