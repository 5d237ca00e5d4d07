//! Engine input events and the change flags they produce

use bitflags::bitflags;
use std::str::FromStr;
use thiserror::Error;

/// Discrete events a driver feeds into the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Event {
    #[default]
    NullEvent,
    Tick,
    RotateLeft,
    RotateRight,
    MoveLeft,
    MoveRight,
    MoveDown,
    Drop,
    Hold,
    /// Interpreted by the driver; a no-op for the field
    Pause,
    /// Interpreted by the driver; a no-op for the field
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event `{0}`")]
pub struct EventParseError(pub String);

impl FromStr for Event {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let event = match s.trim().to_ascii_lowercase().as_str() {
            "null" | "nullevent" => Event::NullEvent,
            "tick" => Event::Tick,
            "rotate_left" | "rotateleft" | "ccw" => Event::RotateLeft,
            "rotate_right" | "rotateright" | "cw" => Event::RotateRight,
            "left" | "move_left" | "moveleft" => Event::MoveLeft,
            "right" | "move_right" | "moveright" => Event::MoveRight,
            "down" | "move_down" | "movedown" => Event::MoveDown,
            "drop" => Event::Drop,
            "hold" => Event::Hold,
            "pause" => Event::Pause,
            "quit" => Event::Quit,
            _ => return Err(EventParseError(s.to_string())),
        };
        Ok(event)
    }
}

bitflags! {
    /// Observable effects of processed events, polled by the driver to decide
    /// whether to redraw or play a sound
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
    pub struct Changes: u8 {
        /// Something visible changed
        const UPDATED = 0b0000_0001;
        const LOCKED = 0b0000_0010;
        const ROTATED = 0b0000_0100;
        /// A move was blocked, or the piece just came to rest
        const WALL_HIT = 0b0000_1000;
        /// Reserved; no rule sets it yet
        const TSPIN = 0b0001_0000;
        /// A new piece could not be placed; the field accepts no more events
        const TOPPED_OUT = 0b0010_0000;
    }
}
