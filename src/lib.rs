//! TETRODE - a falling-block field simulation
//!
//! The engine is a synchronous reducer: a driver feeds [`Event`]s into a
//! [`Field`] one at a time, then reads the field back (or takes a
//! [`Snapshot`]) and polls the [`Changes`] to decide what to redraw.
//! Rendering, audio, input devices and menus live outside this crate.

pub mod bag;
pub mod board;
pub mod config;
pub mod event;
pub mod field;
pub mod kick;
pub mod score;
pub mod tetromino;

pub use board::{Block, Board};
pub use config::{ConfigError, FieldConfig, TimingConfig};
pub use event::{Changes, Event, EventParseError};
pub use field::{ActivePiece, Field, Snapshot};
pub use score::Stats;
pub use tetromino::{Coord, Direction, Shape, Tetromino};
