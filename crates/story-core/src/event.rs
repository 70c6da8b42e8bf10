#![forbid(unsafe_code)]

//! Raw pointer events as delivered by the platform touch layer.
//!
//! Coordinates are logical pixels relative to the story viewport's top-left
//! corner. Each event carries the instant it was observed so hold time can
//! be measured without reading the clock in the classifier.

use web_time::Instant;

/// Phase of a pointer contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Contact started.
    Down,
    /// Contact moved while held.
    Move,
    /// Contact released.
    Up,
    /// The platform took the pointer away (system gesture, focus loss).
    Cancel,
}

/// A single pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    pub at: Instant,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(kind: PointerKind, x: f32, y: f32, at: Instant) -> Self {
        Self { kind, x, y, at }
    }

    #[must_use]
    pub const fn down(x: f32, y: f32, at: Instant) -> Self {
        Self::new(PointerKind::Down, x, y, at)
    }

    #[must_use]
    pub const fn moved(x: f32, y: f32, at: Instant) -> Self {
        Self::new(PointerKind::Move, x, y, at)
    }

    #[must_use]
    pub const fn up(x: f32, y: f32, at: Instant) -> Self {
        Self::new(PointerKind::Up, x, y, at)
    }

    #[must_use]
    pub const fn cancel(at: Instant) -> Self {
        Self::new(PointerKind::Cancel, 0.0, 0.0, at)
    }
}
