#![forbid(unsafe_code)]

//! Core: story collection, progress clock, gestures, and playback.
//!
//! # Role in the workspace
//! `story-core` is the playback engine. It groups ephemeral announcements
//! into stories, drives a pausable per-item progress clock, classifies
//! pointer gestures into navigation intents, and owns the single playback
//! session those intents mutate.
//!
//! # Primary responsibilities
//! - **StoryCollection**: canonical grouping (global first, then first-seen
//!   order) plus a render-only display order.
//! - **ProgressClock**: drift-free pause/resume of the active item's timer.
//! - **classify**: pure mapping from a completed gesture to an intent.
//! - **PlaybackController**: the session state machine with identity-checked
//!   timers.
//! - **StoryView**: read-only projection consumed by the presentation layer.
//!
//! # How it fits in the system
//! `story-runtime` owns a [`PlaybackController`] and feeds it frame ticks,
//! pointer events, and timer expiry on a single timeline. Nothing in this
//! crate spawns threads. Playback time is logical: the wall clock is only
//! read by `Timestamp::now` for expiry filtering.

pub mod clock;
pub mod collection;
pub mod config;
pub mod content;
pub mod controller;
pub mod event;
pub mod gesture;
pub mod view;

pub use clock::{ClockState, ClockStep, ProgressClock, remaining_after_capture};
pub use collection::{Group, StoryCollection, ViewHistory};
pub use config::{ConfigError, GestureConfig, PlaybackConfig, RuntimeConfig, StoryConfig};
pub use content::{CommunityId, ContentItem, GroupSource, Timestamp, retain_live};
pub use controller::{ArmedTimer, PlaybackController, PlaybackState, SessionId, TimerToken};
pub use event::{PointerEvent, PointerKind};
pub use gesture::{Gesture, GestureKind, GestureSignal, GestureTracker, NavigationIntent, classify};
pub use view::{GroupChip, PlayerView, StoryView};
