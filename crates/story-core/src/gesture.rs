#![forbid(unsafe_code)]

//! Gesture classification: completed pointer gestures to navigation intents.
//!
//! [`classify`] is a pure function of a finished [`Gesture`]. The
//! [`GestureTracker`] is the thin adapter that turns raw [`PointerEvent`]s
//! into those records and reports contact start separately, because contact
//! start must pause playback before the gesture resolves.
//!
//! # Precedence
//!
//! 1. Downward travel beyond `down_threshold`, dominant over horizontal:
//!    swipe-down (close).
//! 2. Leftward travel beyond `swipe_threshold`, dominant over vertical:
//!    swipe-left (next group).
//! 3. Rightward travel beyond `swipe_threshold`, dominant over vertical:
//!    swipe-right (previous group).
//! 4. Travel under `tap_tolerance` on both axes: tap. Left third of the
//!    viewport goes back, the rest goes forward.
//! 5. Anything else: indeterminate.
//!
//! # Invariants
//!
//! 1. `classify` is total: non-finite input is indeterminate.
//! 2. `classify` ignores hold duration; a long press that stays put is
//!    still a tap.
//! 3. Every `Press` signal from the tracker is followed by exactly one
//!    `Release` for the same contact.

use std::time::Duration;

use web_time::Instant;

use crate::config::GestureConfig;
use crate::event::{PointerEvent, PointerKind};

/// A completed pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    /// Contact start position.
    pub x0: f32,
    pub y0: f32,
    /// Net displacement from start to release.
    pub dx: f32,
    pub dy: f32,
    /// Time between contact start and release.
    pub hold: Duration,
    /// Width of the viewport the gesture happened in.
    pub viewport_width: f32,
    /// Contact was taken away by the platform rather than released.
    pub cancelled: bool,
}

impl Gesture {
    #[must_use]
    pub fn new(x0: f32, y0: f32, dx: f32, dy: f32, hold: Duration, viewport_width: f32) -> Self {
        Self {
            x0,
            y0,
            dx,
            dy,
            hold,
            viewport_width,
            cancelled: false,
        }
    }

    /// A zero-travel tap at `(x, y)`.
    #[must_use]
    pub fn tap(x: f32, y: f32, viewport_width: f32) -> Self {
        Self::new(x, y, 0.0, 0.0, Duration::ZERO, viewport_width)
    }
}

/// Discrete classification of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    SwipeDown,
    SwipeLeft,
    SwipeRight,
    TapLeft,
    TapRight,
    Indeterminate,
}

impl GestureKind {
    /// The navigation this gesture requests, if any.
    #[must_use]
    pub const fn intent(self) -> Option<NavigationIntent> {
        match self {
            Self::SwipeDown => Some(NavigationIntent::Close),
            Self::SwipeLeft => Some(NavigationIntent::SkipGroup(1)),
            Self::SwipeRight => Some(NavigationIntent::SkipGroup(-1)),
            Self::TapLeft => Some(NavigationIntent::Retreat),
            Self::TapRight => Some(NavigationIntent::Advance),
            Self::Indeterminate => None,
        }
    }
}

/// Navigation requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationIntent {
    Open(usize),
    Close,
    Advance,
    Retreat,
    SkipGroup(isize),
}

/// Classify a completed gesture.
#[must_use]
pub fn classify(gesture: &Gesture, config: &GestureConfig) -> GestureKind {
    let Gesture {
        x0,
        y0,
        dx,
        dy,
        viewport_width,
        cancelled,
        ..
    } = *gesture;

    if cancelled || ![x0, y0, dx, dy, viewport_width].iter().all(|v| v.is_finite()) {
        return GestureKind::Indeterminate;
    }

    let (ax, ay) = (dx.abs(), dy.abs());
    let kind = if dy > config.down_threshold && ay > ax {
        GestureKind::SwipeDown
    } else if dx < -config.swipe_threshold && ax > ay {
        GestureKind::SwipeLeft
    } else if dx > config.swipe_threshold && ax > ay {
        GestureKind::SwipeRight
    } else if ax < config.tap_tolerance && ay < config.tap_tolerance {
        if x0 < viewport_width / 3.0 {
            GestureKind::TapLeft
        } else {
            GestureKind::TapRight
        }
    } else {
        GestureKind::Indeterminate
    };

    tracing::trace!(
        target: "story.gesture",
        dx, dy, hold_ms = gesture.hold.as_millis() as u64, ?kind,
        "gesture classified"
    );
    kind
}

/// What the tracker observed for one pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSignal {
    /// Contact started; playback should pause now.
    Press,
    /// Contact ended with this gesture; playback should resume, then
    /// navigate according to the classification.
    Release(Gesture),
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    x: f32,
    y: f32,
    at: Instant,
}

/// Adapter from raw pointer events to gesture records.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    viewport_width: f32,
    contact: Option<Contact>,
}

impl GestureTracker {
    #[must_use]
    pub fn new(viewport_width: f32) -> Self {
        Self {
            viewport_width,
            contact: None,
        }
    }

    /// Process one pointer event.
    ///
    /// A second `Down` while a contact is held restarts the contact without
    /// a second `Press`, so press/release stay balanced.
    pub fn process(&mut self, event: &PointerEvent) -> Option<GestureSignal> {
        match event.kind {
            PointerKind::Down => {
                let fresh = self.contact.is_none();
                self.contact = Some(Contact {
                    x: event.x,
                    y: event.y,
                    at: event.at,
                });
                fresh.then_some(GestureSignal::Press)
            }
            PointerKind::Move => None,
            PointerKind::Up => {
                let start = self.contact.take()?;
                Some(GestureSignal::Release(Gesture::new(
                    start.x,
                    start.y,
                    event.x - start.x,
                    event.y - start.y,
                    event.at.saturating_duration_since(start.at),
                    self.viewport_width,
                )))
            }
            PointerKind::Cancel => {
                let start = self.contact.take()?;
                let mut gesture = Gesture::tap(start.x, start.y, self.viewport_width);
                gesture.hold = event.at.saturating_duration_since(start.at);
                gesture.cancelled = true;
                Some(GestureSignal::Release(gesture))
            }
        }
    }

    /// Whether a contact is currently held.
    #[inline]
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.contact.is_some()
    }

    /// Update the viewport width (rotation, resize).
    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
    }

    /// Drop any held contact without emitting a release.
    pub fn reset(&mut self) {
        self.contact = None;
    }
}
