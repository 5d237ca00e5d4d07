//! Field engine: board, active piece, hold, queue, counters and the
//! tick-driven state machine over them

use crate::bag::PieceQueue;
use crate::board::Board;
use crate::config::{ConfigError, FieldConfig, TimingConfig};
use crate::event::{Changes, Event};
use crate::kick;
use crate::score::Stats;
use crate::tetromino::{Coord, Direction, Shape, Tetromino};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// How many queued pieces a snapshot carries
pub const PREVIEW_LEN: usize = 5;

/// The falling piece and the board position its offsets are relative to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivePiece {
    pub piece: Tetromino,
    pub anchor: Coord,
}

impl ActivePiece {
    /// Absolute board positions of the 4 cells
    pub fn cells(&self) -> [Coord; 4] {
        self.piece.cells_at(self.anchor)
    }
}

/// Owned copy of everything a renderer reads
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub board: Board,
    pub active: ActivePiece,
    pub ghost: Coord,
    pub hold: Option<Tetromino>,
    pub have_held: bool,
    pub next: Vec<Tetromino>,
    pub stats: Stats,
    pub changes: Changes,
    pub clearing: bool,
    pub topped_out: bool,
}

/// The simulation. Feed it one [`Event`] at a time.
#[derive(Debug, Clone)]
pub struct Field<R = ChaCha8Rng> {
    board: Board,
    timing: TimingConfig,
    active: ActivePiece,
    hold: Tetromino,
    have_held: bool,
    already_held: bool,
    queue: PieceQueue<R>,
    stats: Stats,
    /// Ticks since the last forced drop
    movement_ticks: u32,
    /// Ticks the active piece has rested on the stack; 0 while falling
    drop_ticks: u32,
    /// Clear animation countdown; non-zero blocks all other processing
    clear_ticks: u32,
    changes: Changes,
    topped_out: bool,
}

impl Field<ChaCha8Rng> {
    /// Build a field whose piece order is fully determined by `seed`
    pub fn new(config: &FieldConfig, seed: u32) -> Result<Self, ConfigError> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(u64::from(seed)))
    }
}

impl<R: Rng> Field<R> {
    /// Build a field drawing its bags from `rng`
    pub fn with_rng(config: &FieldConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let board = Board::new(config.board_width, config.board_height);
        Ok(Self::assemble(board, config.timing, rng))
    }

    /// Start from a prepared stack, e.g. a practice layout.
    ///
    /// The board's own dimensions are used and validated like a config's.
    pub fn from_board(board: Board, timing: TimingConfig, rng: R) -> Result<Self, ConfigError> {
        let config = FieldConfig {
            board_width: board.width(),
            board_height: board.height(),
            timing,
        };
        config.validate()?;
        Ok(Self::assemble(board, timing, rng))
    }

    fn assemble(board: Board, timing: TimingConfig, rng: R) -> Self {
        let mut field = Self {
            board,
            timing,
            active: ActivePiece {
                piece: Tetromino::default(),
                anchor: Coord::default(),
            },
            hold: Tetromino::default(),
            have_held: false,
            already_held: false,
            queue: PieceQueue::new(rng),
            stats: Stats::new(),
            movement_ticks: 0,
            drop_ticks: 0,
            clear_ticks: 0,
            changes: Changes::empty(),
            topped_out: false,
        };
        field.get_new_active_tetrimino();
        field.check_spawn();
        info!(
            width = field.board.width(),
            height = field.board.height(),
            "field created"
        );
        field
    }

    /// Process one event and return the changes it produced. The same
    /// changes are also accumulated until [`Field::take_changes`].
    pub fn handle_event(&mut self, event: Event) -> Changes {
        let pending = std::mem::take(&mut self.changes);
        self.process(event);
        let produced = self.changes;
        self.changes = pending | produced;
        produced
    }

    fn process(&mut self, event: Event) {
        if self.topped_out {
            return;
        }

        if self.clear_ticks > 0 {
            if event == Event::Tick {
                self.clear_ticks -= 1;
                if self.clear_ticks == 0 {
                    self.resolve_clear();
                }
            }
            return;
        }

        match event {
            Event::Tick => self.tick(),
            Event::MoveDown => self.move_down(),
            Event::Drop => self.hard_drop(),
            Event::Hold => self.hold_active(),
            Event::MoveLeft => self.shift(Direction::Left),
            Event::MoveRight => self.shift(Direction::Right),
            Event::RotateLeft => self.rotate(Direction::Left),
            Event::RotateRight => self.rotate(Direction::Right),
            Event::Pause | Event::Quit | Event::NullEvent => {}
        }
    }

    fn tick(&mut self) {
        if self.movement_ticks >= self.timing.auto_drop_ticks {
            self.movement_ticks = 0;
            self.process(Event::MoveDown);
        }

        if self.drop_ticks > 0 {
            if self.active_collides_lower() {
                self.drop_ticks += 1;
                if self.drop_ticks > self.timing.lock_delay_ticks {
                    self.place_active();
                }
            } else {
                self.drop_ticks = 0;
            }
        }

        self.movement_ticks += 1;
    }

    fn move_down(&mut self) {
        if !self.active_collides_lower() {
            self.active.anchor.y -= 1;
            self.changes |= Changes::UPDATED;
        } else if self.drop_ticks == 0 {
            // start the lock delay
            self.drop_ticks = 1;
            self.changes |= Changes::WALL_HIT;
        }
    }

    fn hard_drop(&mut self) {
        let landing = self.lower_collide_coord(&self.active.piece, self.active.anchor);
        if landing != self.active.anchor {
            self.active.anchor = landing;
            self.changes |= Changes::UPDATED;
        }
        self.place_active();
    }

    fn hold_active(&mut self) {
        if self.already_held {
            return;
        }

        let current = std::mem::take(&mut self.active.piece);
        let previous = std::mem::replace(&mut self.hold, current);
        if self.have_held {
            self.queue.push_front(previous);
        }
        self.hold.regen_blocks();
        debug!(held = ?self.hold.shape, "hold");

        self.get_new_active_tetrimino();
        self.drop_ticks = 0;
        self.have_held = true;
        self.already_held = true;
        self.changes |= Changes::UPDATED;
        self.check_spawn();
    }

    fn shift(&mut self, direction: Direction) {
        if self.active_collides_sides(direction) {
            self.changes |= Changes::WALL_HIT;
            return;
        }
        self.active.anchor.x += direction.dx();
        self.changes |= Changes::UPDATED;
    }

    fn rotate(&mut self, direction: Direction) {
        if self.active.piece.shape == Shape::O {
            return;
        }
        let mut rotated = self.active.piece.clone();
        rotated.rotate(direction);

        match kick::normalize(&self.board, &rotated, self.active.anchor) {
            Some(anchor) => {
                self.active = ActivePiece {
                    piece: rotated,
                    anchor,
                };
                self.changes |= Changes::ROTATED | Changes::UPDATED;
            }
            None => self.changes |= Changes::WALL_HIT,
        }
    }

    /// Lock the active piece into the board, tag full rows and bring in the
    /// next piece
    fn place_active(&mut self) {
        let ActivePiece { piece, anchor } = self.active.clone();
        self.board.lock_piece(&piece, anchor);

        let rows = piece.cells_at(anchor).map(|c| c.y as usize);
        let cleared = self.board.mark_full_rows(rows) as u32;
        debug!(shape = ?piece.shape, x = anchor.x, y = anchor.y, "piece locked");

        if cleared > 0 {
            self.clear_ticks = self.timing.clear_delay_ticks;
            let points = self.stats.add_clear(cleared);
            info!(
                lines = cleared,
                points,
                level = self.stats.level,
                total = self.stats.lines_cleared,
                "lines cleared"
            );
        }

        self.get_new_active_tetrimino();
        self.drop_ticks = 0;
        self.already_held = false;
        self.changes |= Changes::LOCKED | Changes::UPDATED;

        // with rows pending the overlap is settled once they collapse
        if self.clear_ticks == 0 {
            self.check_spawn();
        }
    }

    /// Collapse the rows tagged by the last lock
    fn resolve_clear(&mut self) {
        let removed = self.board.collapse_cleared();
        debug!(removed, "clear animation finished");
        self.changes |= Changes::UPDATED;

        if self.board.overlaps(&self.active.piece, self.active.anchor) {
            match kick::settle(&self.board, &self.active.piece, self.active.anchor) {
                Some(anchor) => self.active.anchor = anchor,
                None => self.top_out(),
            }
        }
    }

    /// Pop the queue into the active slot at the spawn point
    fn get_new_active_tetrimino(&mut self) {
        let piece = self.queue.pop_front();
        let anchor = kick::clamp_to_bounds(&self.board, &piece, self.spawn_point());
        self.active = ActivePiece { piece, anchor };
    }

    fn check_spawn(&mut self) {
        if self.board.overlaps(&self.active.piece, self.active.anchor) {
            self.top_out();
        }
    }

    fn top_out(&mut self) {
        warn!(
            score = self.stats.score,
            lines = self.stats.lines_cleared,
            "new piece overlaps the stack, topped out"
        );
        self.topped_out = true;
        self.changes |= Changes::TOPPED_OUT | Changes::UPDATED;
    }

    fn spawn_point(&self) -> Coord {
        Coord::new(
            self.board.width() as i32 / 2 - 1,
            self.board.height() as i32 / 2 + 1,
        )
    }

    fn active_collides_lower(&self) -> bool {
        self.board
            .collides_lower(&self.active.piece, self.active.anchor)
    }

    fn active_collides_sides(&self, direction: Direction) -> bool {
        self.board
            .collides_side(&self.active.piece, self.active.anchor, direction)
    }

    /// Where `piece` would rest if dropped from `anchor`. Does not touch state.
    pub fn lower_collide_coord(&self, piece: &Tetromino, anchor: Coord) -> Coord {
        self.board.lower_collide_coord(piece, anchor)
    }

    /// Ghost preview of the active piece at its landing position
    pub fn ghost(&self) -> (Tetromino, Coord) {
        let landing = self.lower_collide_coord(&self.active.piece, self.active.anchor);
        (self.active.piece.as_ghost(), landing)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> &ActivePiece {
        &self.active
    }

    /// The held piece, once anything has been held
    pub fn hold(&self) -> Option<&Tetromino> {
        self.have_held.then_some(&self.hold)
    }

    pub fn have_held(&self) -> bool {
        self.have_held
    }

    pub fn already_held(&self) -> bool {
        self.already_held
    }

    /// The piece that becomes active next
    pub fn next_piece(&self) -> Option<&Tetromino> {
        self.queue.front()
    }

    pub fn next_pieces(&self, count: usize) -> impl Iterator<Item = &Tetromino> {
        self.queue.preview(count)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn score(&self) -> u32 {
        self.stats.score
    }

    pub fn level(&self) -> u32 {
        self.stats.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.stats.lines_cleared
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn movement_ticks(&self) -> u32 {
        self.movement_ticks
    }

    pub fn drop_ticks(&self) -> u32 {
        self.drop_ticks
    }

    pub fn clear_ticks(&self) -> u32 {
        self.clear_ticks
    }

    /// True while the clear animation holds the field
    pub fn is_clearing(&self) -> bool {
        self.clear_ticks > 0
    }

    pub fn is_topped_out(&self) -> bool {
        self.topped_out
    }

    /// Changes accumulated since the last [`Field::take_changes`]
    pub fn changes(&self) -> Changes {
        self.changes
    }

    pub fn take_changes(&mut self) -> Changes {
        std::mem::take(&mut self.changes)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.board.width(),
            height: self.board.height(),
            board: self.board.clone(),
            active: self.active.clone(),
            ghost: self.ghost().1,
            hold: self.hold().cloned(),
            have_held: self.have_held,
            next: self.next_pieces(PREVIEW_LEN).cloned().collect(),
            stats: self.stats.clone(),
            changes: self.changes,
            clearing: self.is_clearing(),
            topped_out: self.topped_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Block;
    use rand::rngs::mock::StepRng;

    /// Always picks the first remaining shape, so bags come out I O T S Z J L
    fn ordered(width: usize, height: usize) -> Field<StepRng> {
        Field::with_rng(&FieldConfig::with_size(width, height), StepRng::new(0, 0)).unwrap()
    }

    #[test]
    fn test_spawn_point() {
        let field = ordered(10, 40);
        assert_eq!(field.active().piece.shape, Shape::I);
        assert_eq!(field.active().anchor, Coord::new(4, 21));
        assert_eq!(field.next_piece().map(|p| p.shape), Some(Shape::O));
    }

    #[test]
    fn test_move_down_then_rest() {
        let mut field = ordered(10, 40);
        let start = field.active().anchor;
        assert_eq!(field.handle_event(Event::MoveDown), Changes::UPDATED);
        assert_eq!(field.active().anchor, start.offset(0, -1));

        for _ in 0..20 {
            field.handle_event(Event::MoveDown);
        }
        assert_eq!(field.active().anchor.y, 0);
        assert_eq!(field.drop_ticks(), 0);

        assert_eq!(field.handle_event(Event::MoveDown), Changes::WALL_HIT);
        assert_eq!(field.drop_ticks(), 1);

        // already resting: no repeated wall hit
        assert_eq!(field.handle_event(Event::MoveDown), Changes::empty());
    }

    #[test]
    fn test_shift_into_wall() {
        let mut field = ordered(10, 40);
        for _ in 0..3 {
            assert_eq!(field.handle_event(Event::MoveLeft), Changes::UPDATED);
        }
        // I spans x -1..=2 from the anchor, so x=1 puts it against the wall
        assert_eq!(field.active().anchor.x, 1);
        assert_eq!(field.handle_event(Event::MoveLeft), Changes::WALL_HIT);
        assert_eq!(field.active().anchor.x, 1);
    }

    #[test]
    fn test_auto_drop_after_threshold() {
        let mut field = ordered(10, 40);
        let start = field.active().anchor;
        for _ in 0..15 {
            field.handle_event(Event::Tick);
        }
        assert_eq!(field.active().anchor, start);
        assert_eq!(field.handle_event(Event::Tick), Changes::UPDATED);
        assert_eq!(field.active().anchor, start.offset(0, -1));
        assert_eq!(field.movement_ticks(), 1);
    }

    #[test]
    fn test_lock_delay() {
        let mut field = ordered(10, 40);
        while field.active().anchor.y > 0 {
            field.handle_event(Event::MoveDown);
        }
        field.handle_event(Event::MoveDown);
        assert_eq!(field.drop_ticks(), 1);

        let mut ticks = 0;
        while !field.handle_event(Event::Tick).contains(Changes::LOCKED) {
            ticks += 1;
            assert!(ticks < 100, "piece never locked");
        }
        assert_eq!(ticks, 49);
        assert_eq!(field.drop_ticks(), 0);
        assert_eq!(field.active().piece.shape, Shape::O);
        assert_eq!(field.board().get(3, 0), Some(Block::Cyan));
    }

    #[test]
    fn test_hard_drop_locks() {
        let mut field = ordered(10, 40);
        let changes = field.handle_event(Event::Drop);
        assert!(changes.contains(Changes::LOCKED | Changes::UPDATED));
        for x in 3..=6 {
            assert_eq!(field.board().get(x, 0), Some(Block::Cyan));
        }
        assert_eq!(field.active().piece.shape, Shape::O);
    }

    #[test]
    fn test_hold_swaps_and_returns() {
        let mut field = ordered(10, 40);
        field.handle_event(Event::RotateLeft);
        assert_eq!(field.handle_event(Event::Hold), Changes::UPDATED);
        assert_eq!(field.hold(), Some(&Tetromino::new(Shape::I)));
        assert_eq!(field.active().piece.shape, Shape::O);

        assert_eq!(field.handle_event(Event::Hold), Changes::empty());

        field.handle_event(Event::Drop);
        assert!(!field.already_held());
        assert_eq!(field.active().piece.shape, Shape::T);

        field.handle_event(Event::Hold);
        assert_eq!(field.active().piece.shape, Shape::I);
        assert_eq!(field.hold().map(|p| p.shape), Some(Shape::T));
        assert_eq!(field.next_piece().map(|p| p.shape), Some(Shape::S));
    }

    #[test]
    fn test_rotation_flags() {
        let mut field = ordered(10, 40);
        let changes = field.handle_event(Event::RotateRight);
        assert_eq!(changes, Changes::ROTATED | Changes::UPDATED);
        assert_ne!(field.active().piece, Tetromino::new(Shape::I));
    }

    #[test]
    fn test_o_rotation_is_noop() {
        let mut field = ordered(10, 40);
        field.handle_event(Event::Hold);
        let before = field.active().clone();
        assert_eq!(field.handle_event(Event::RotateLeft), Changes::empty());
        assert_eq!(field.active(), &before);
    }

    #[test]
    fn test_rotation_at_floor_is_kicked_up() {
        let mut field = ordered(10, 40);
        while field.active().anchor.y > 0 {
            field.handle_event(Event::MoveDown);
        }
        // vertical I reaches one row below its anchor
        field.handle_event(Event::RotateLeft);
        assert_eq!(field.active().anchor, Coord::new(4, 1));
        let lowest = field.active().cells().iter().map(|c| c.y).min();
        assert_eq!(lowest, Some(0));
        assert!(!field.board().overlaps(&field.active().piece, field.active().anchor));
    }

    #[test]
    fn test_events_ignored_while_clearing() {
        // a flat I spans the whole 4-wide board
        let mut field = ordered(4, 8);
        field.handle_event(Event::Drop);
        assert!(field.is_clearing());
        assert_eq!(field.lines_cleared(), 1);

        let before = field.active().clone();
        for event in [Event::MoveLeft, Event::Drop, Event::Hold, Event::RotateLeft] {
            assert_eq!(field.handle_event(event), Changes::empty());
        }
        assert_eq!(field.active(), &before);
        assert_eq!(field.clear_ticks(), 30);

        for _ in 0..29 {
            assert_eq!(field.handle_event(Event::Tick), Changes::empty());
        }
        assert_eq!(field.handle_event(Event::Tick), Changes::UPDATED);
        assert!(!field.is_clearing());
        assert!(field.board().is_empty());
    }

    #[test]
    fn test_take_changes_drains() {
        let mut field = ordered(10, 40);
        field.handle_event(Event::MoveLeft);
        field.handle_event(Event::RotateLeft);
        assert_eq!(
            field.take_changes(),
            Changes::UPDATED | Changes::ROTATED
        );
        assert_eq!(field.changes(), Changes::empty());
    }

    #[test]
    fn test_ghost_has_no_side_effects() {
        let field = ordered(10, 40);
        let before = field.snapshot();
        let (ghost, landing) = field.ghost();
        assert_eq!(landing, Coord::new(4, 0));
        assert!(ghost.blocks.iter().all(|(b, _)| *b == Block::Ghost));
        assert_eq!(field.board(), &before.board);
        assert_eq!(field.active(), &before.active);
    }

    #[test]
    fn test_top_out_freezes_field() {
        let mut board = Board::new(4, 6);
        board.set(Coord::new(1, 4), Block::Garbage);
        let field = Field::from_board(board, TimingConfig::default(), StepRng::new(0, 0)).unwrap();
        assert!(field.is_topped_out());
        assert!(field.changes().contains(Changes::TOPPED_OUT));

        let mut field = field;
        assert_eq!(field.handle_event(Event::Drop), Changes::empty());
    }

    #[test]
    fn test_lock_delay_resets_off_ledge() {
        let mut board = Board::new(10, 40);
        board.set(Coord::new(3, 0), Block::Garbage);
        let mut field = Field::from_board(board, TimingConfig::default(), StepRng::new(0, 0)).unwrap();

        while field.handle_event(Event::MoveDown) == Changes::UPDATED {}
        assert_eq!(field.active().anchor, Coord::new(4, 1));
        assert_eq!(field.drop_ticks(), 1);

        // off the ledge, nothing under the piece any more
        assert_eq!(field.handle_event(Event::MoveRight), Changes::UPDATED);
        let changes = field.handle_event(Event::Tick);
        assert!(!changes.contains(Changes::LOCKED));
        assert_eq!(field.drop_ticks(), 0);
        assert_eq!(field.active().anchor, Coord::new(5, 1));
        assert_eq!(field.board().get(4, 1), Some(Block::Empty));
    }

    #[test]
    fn test_rotation_resting_below_top_edge() {
        let mut board = Board::new(4, 8);
        board.set(Coord::new(1, 3), Block::Garbage);
        let mut field = Field::from_board(board, TimingConfig::default(), StepRng::new(0, 0)).unwrap();
        assert_eq!(field.active().anchor, Coord::new(1, 5));

        // vertical I spans rows 4..=7 and rests on the garbage
        let changes = field.handle_event(Event::RotateLeft);
        assert_eq!(changes, Changes::ROTATED | Changes::UPDATED);
        assert_eq!(field.active().anchor, Coord::new(1, 5));
        assert_eq!(field.active().cells().iter().map(|c| c.y).max(), Some(7));
    }

    #[test]
    fn test_overlap_after_collapse_is_settled() {
        let mut board = Board::new(4, 8);
        board.set(Coord::new(1, 6), Block::Garbage);
        let mut field = Field::from_board(board, TimingConfig::default(), StepRng::new(0, 0)).unwrap();

        field.handle_event(Event::Drop);
        assert!(field.is_clearing());
        assert_eq!(field.active().piece.shape, Shape::O);

        for _ in 0..30 {
            field.handle_event(Event::Tick);
        }
        // the garbage fell onto the O's spawn rows
        assert_eq!(field.board().get(1, 5), Some(Block::Garbage));
        assert!(!field.is_topped_out());
        assert_eq!(field.active().anchor, Coord::new(1, 6));
        assert!(!field.board().overlaps(&field.active().piece, field.active().anchor));
    }

    #[test]
    fn test_overlap_after_collapse_tops_out() {
        let mut board = Board::new(4, 8);
        board.set(Coord::new(2, 7), Block::Garbage);
        let mut field = Field::from_board(board, TimingConfig::default(), StepRng::new(0, 0)).unwrap();

        field.handle_event(Event::Drop);
        assert!(field.is_clearing());
        assert!(!field.is_topped_out());

        for _ in 0..29 {
            field.handle_event(Event::Tick);
        }
        let changes = field.handle_event(Event::Tick);
        assert!(changes.contains(Changes::TOPPED_OUT));
        assert!(field.is_topped_out());
        assert_eq!(field.board().get(2, 6), Some(Block::Garbage));
    }

    #[test]
    fn test_degenerate_config_rejected() {
        let result = Field::new(&FieldConfig::with_size(0, 40), 1);
        assert!(matches!(result, Err(ConfigError::DegenerateBoard { .. })));
    }
}
