#![forbid(unsafe_code)]

//! Elm-style host loop for the story player.
//!
//! Every input the player reacts to (pointer contact, frame ticks, timer
//! expiry, content refreshes, explicit navigation) is a [`StoryMsg`] applied
//! through [`StoryProgram::update`] on the owning thread.
//!
//! # Modes
//!
//! - **Headless** ([`StoryProgram::new`]): no threads. The host feeds
//!   `Tick`/`TimerFired` messages itself. Deterministic; used by tests and by
//!   hosts with their own scheduler.
//! - **Live** ([`StoryProgram::live`]): while a story plays, a frame
//!   [`Every`] subscription and a one-shot item [`Deadline`] run on
//!   background threads. Call [`pump`](StoryProgram::pump) or
//!   [`wait_and_pump`](StoryProgram::wait_and_pump) to apply what they sent.
//!
//! # Invariants
//!
//! 1. Subscriptions are reconciled after every update, so at most one
//!    deadline thread exists and it always carries the armed token.
//! 2. The frame baseline is reset whenever the armed token changes: paused
//!    time never leaks into the next item's progress.
//! 3. Dropping the program closes the session and joins every subscription.
//!
//! # Failure Modes
//!
//! - A deadline that fires after its item was left arrives as a
//!   `TimerFired` with a superseded token; the controller discards it.
//! - Frame and deadline may both report the same expiry. Whichever is
//!   applied first advances; the other is stale.

use std::time::Duration;

use story_core::{
    ContentItem, GestureSignal, GestureTracker, PlaybackController, PlaybackState, PointerEvent,
    StoryCollection, StoryConfig, StoryView, Timestamp, TimerToken, retain_live,
};
use web_time::Instant;

use crate::subscription::{Deadline, Every, SubId, Subscription, SubscriptionManager};

/// Messages the story program understands.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryMsg {
    /// Open the group at this canonical index.
    Open(usize),
    Close,
    /// Next item (tap right).
    Next,
    /// Previous item (tap left).
    Previous,
    SkipGroup(isize),
    /// Raw pointer input for the gesture tracker.
    Pointer(PointerEvent),
    /// Viewport width changed.
    Resize { width: f32 },
    /// Advance logical time by an explicit amount.
    Tick(Duration),
    /// Wall-clock frame; elapsed time is measured since the previous frame.
    Frame,
    /// A scheduled item deadline expired.
    TimerFired(TimerToken),
    /// Freshly loaded content. Expired rows are dropped on arrival.
    Refresh(Vec<ContentItem>),
}

/// Owns the controller and feeds it one message at a time.
pub struct StoryProgram {
    controller: PlaybackController,
    tracker: GestureTracker,
    subscriptions: Option<SubscriptionManager<StoryMsg>>,
    last_frame: Instant,
    last_token: Option<TimerToken>,
}

impl StoryProgram {
    /// Headless program: no background threads.
    #[must_use]
    pub fn new(collection: StoryCollection, config: StoryConfig) -> Self {
        let tracker = GestureTracker::new(config.gesture.viewport_width);
        Self {
            controller: PlaybackController::new(collection, config),
            tracker,
            subscriptions: None,
            last_frame: Instant::now(),
            last_token: None,
        }
    }

    /// Live program: frame and deadline subscriptions run while playing.
    #[must_use]
    pub fn live(collection: StoryCollection, config: StoryConfig) -> Self {
        let mut program = Self::new(collection, config);
        program.subscriptions = Some(SubscriptionManager::new());
        program
    }

    /// Apply one message.
    pub fn update(&mut self, msg: StoryMsg) {
        match msg {
            StoryMsg::Open(group) => self.controller.open(group),
            StoryMsg::Close => {
                self.tracker.reset();
                self.controller.close();
            }
            StoryMsg::Next => self.controller.advance_item(),
            StoryMsg::Previous => self.controller.retreat_item(),
            StoryMsg::SkipGroup(delta) => self.controller.skip_to_group(delta),
            StoryMsg::Pointer(event) => match self.tracker.process(&event) {
                Some(GestureSignal::Press) => self.controller.press(),
                Some(GestureSignal::Release(gesture)) => {
                    self.controller.release(&gesture);
                }
                None => {}
            },
            StoryMsg::Resize { width } => self.tracker.set_viewport_width(width),
            StoryMsg::Tick(dt) => {
                self.controller.tick(dt);
            }
            StoryMsg::Frame => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(self.last_frame);
                self.last_frame = now;
                self.controller.tick(dt);
            }
            StoryMsg::TimerFired(token) => {
                self.controller.on_timer_fired(token);
            }
            StoryMsg::Refresh(items) => {
                let collection = StoryCollection::build(retain_live(items, Timestamp::now()));
                tracing::debug!(
                    target: "story.collection",
                    groups = collection.len(),
                    items = collection.item_count(),
                    "content refreshed"
                );
                self.tracker.reset();
                self.controller.replace_collection(collection);
            }
        }
        self.after_update();
    }

    /// Subscriptions the current state wants running.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Box<dyn Subscription<StoryMsg>>> {
        let Some(timer) = self.controller.armed_timer() else {
            return Vec::new();
        };
        let interval = self.controller.config().runtime.frame_interval();
        let subs: Vec<Box<dyn Subscription<StoryMsg>>> = vec![
            Box::new(Every::new(interval, || StoryMsg::Frame)),
            Box::new(Deadline::new(timer, |t| StoryMsg::TimerFired(t.token))),
        ];
        subs
    }

    /// Apply every message the subscriptions have sent so far.
    ///
    /// Returns the number of messages applied. Always `0` when headless.
    pub fn pump(&mut self) -> usize {
        let messages = match &self.subscriptions {
            Some(manager) => manager.drain_messages(),
            None => return 0,
        };
        let count = messages.len();
        for msg in messages {
            self.update(msg);
        }
        count
    }

    /// Block up to `timeout` for the first subscription message, then pump.
    pub fn wait_and_pump(&mut self, timeout: Duration) -> usize {
        let first = match &self.subscriptions {
            Some(manager) => manager.recv_timeout(timeout),
            None => return 0,
        };
        match first {
            Some(msg) => {
                self.update(msg);
                1 + self.pump()
            }
            None => 0,
        }
    }

    /// Render model for the current state.
    #[must_use]
    pub fn view(&self) -> StoryView<'_> {
        StoryView::project(&self.controller)
    }

    #[inline]
    #[must_use]
    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.subscriptions.is_some()
    }

    /// Ids of the running subscriptions (empty when headless).
    #[must_use]
    pub fn active_subscriptions(&self) -> Vec<SubId> {
        self.subscriptions
            .as_ref()
            .map(SubscriptionManager::active_ids)
            .unwrap_or_default()
    }

    fn after_update(&mut self) {
        let token = self.controller.armed_timer().map(|t| t.token);
        if token != self.last_token {
            self.last_token = token;
            self.last_frame = Instant::now();
        }
        if self.subscriptions.is_some() {
            let wanted = self.subscriptions();
            if let Some(manager) = self.subscriptions.as_mut() {
                manager.reconcile(wanted);
            }
        }
    }
}

impl Drop for StoryProgram {
    fn drop(&mut self) {
        self.controller.close();
        if let Some(manager) = self.subscriptions.as_mut() {
            manager.stop_all();
        }
    }
}
