#![forbid(unsafe_code)]

//! Story Runtime
//!
//! Host loop that ties the `story-core` playback engine to wall-clock time
//! and raw input.
//!
//! # Key Components
//!
//! - [`StoryProgram`] - Elm-style owner of the playback controller
//! - [`StoryMsg`] - Every input the player reacts to
//! - [`Subscription`] - Trait for background message sources
//! - [`Every`] - Frame tick subscription
//! - [`Deadline`] - One-shot expiry of the armed item timer
//!
//! # How it fits in the system
//! `story-core` never spawns threads or reads the clock on its own. This
//! crate measures frame time, schedules the item deadline for the armed
//! timer token, and funnels both back onto the single update timeline where
//! the controller's identity check discards anything stale.

pub mod program;
pub mod subscription;

pub use program::{StoryMsg, StoryProgram};
pub use subscription::{Deadline, Every, MockSubscription, StopSignal, SubId, Subscription};

