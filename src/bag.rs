//! 7-bag randomizer for the upcoming-piece queue
//!
//! All 7 shapes are dealt in a random order before any shape repeats, which
//! keeps droughts short. The random source is injected so a seed fully
//! determines the sequence.

use crate::tetromino::{Shape, Tetromino};
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

/// Refill as soon as fewer than this many pieces are queued, so one piece can
/// be popped while another stays visible as the preview.
const MIN_QUEUED: usize = 2;

/// Upcoming pieces, replenished one full bag at a time
#[derive(Debug, Clone)]
pub struct PieceQueue<R> {
    queue: VecDeque<Tetromino>,
    rng: R,
}

impl<R: Rng> PieceQueue<R> {
    /// Create an empty queue; the first pop triggers the first bag
    pub fn new(rng: R) -> Self {
        Self {
            queue: VecDeque::with_capacity(14),
            rng,
        }
    }

    /// Take the next piece, refilling first if the queue is running low
    pub fn pop_front(&mut self) -> Tetromino {
        if self.queue.len() < MIN_QUEUED {
            self.generate_next_pieces();
        }
        // a fresh bag always holds seven pieces
        self.queue.pop_front().unwrap_or_default()
    }

    /// Put a piece back at the head of the queue (used by hold)
    pub fn push_front(&mut self, piece: Tetromino) {
        self.queue.push_front(piece);
    }

    /// The piece that will be popped next, if any is queued
    pub fn front(&self) -> Option<&Tetromino> {
        self.queue.front()
    }

    /// Preview the next `count` pieces without removing them
    pub fn preview(&self, count: usize) -> impl Iterator<Item = &Tetromino> {
        self.queue.iter().take(count)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Append one shuffled bag: pick a uniformly random remaining shape until
    /// none are left.
    pub fn generate_next_pieces(&mut self) {
        let mut pool: Vec<Shape> = Shape::all().to_vec();
        while !pool.is_empty() {
            let index = self.rng.gen_range(0..pool.len());
            let shape = pool.remove(index);
            self.queue.push_back(Tetromino::new(shape));
        }
        debug!(queued = self.queue.len(), "refilled piece bag");
    }
}
