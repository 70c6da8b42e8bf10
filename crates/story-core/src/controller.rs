#![forbid(unsafe_code)]

//! Playback controller: the story session state machine.
//!
//! [`PlaybackController`] owns the collection, the view history, the
//! progress clock, and at most one live playback session. Every mutation
//! goes through `&mut self`, so timer expiry, gesture intents, and explicit
//! open/close are serialized by construction.
//!
//! # State Machine
//!
//! ```text
//!            open(g)                     pause()
//!   Closed ──────────▶ Playing(g,i) ◀──────────▶ Paused(g,i,remaining)
//!     ▲                    │         resume()          │
//!     │   close() / past   │                           │
//!     └────── last item ───┴───────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. While a session is live, `item` is a valid index into the active
//!    group's items.
//! 2. At most one timer is armed at a time. Arming mints a fresh
//!    [`TimerToken`], so every earlier token stops matching.
//! 3. `Paused` has no armed timer; the captured remaining time is in
//!    `[0, item_duration]`.
//! 4. The global group is never written to the view history.
//! 5. Every operation is total. Out-of-range indices, redundant
//!    pause/resume, and operations on `Closed` (other than `open`) are
//!    no-ops.
//!
//! # Failure Modes
//!
//! - A timer callback whose token no longer matches the armed timer (the
//!   session was closed, or a later transition re-armed) is discarded
//!   without effect and logged at debug.

use std::fmt;
use std::time::Duration;

use crate::clock::{ClockStep, ProgressClock, remaining_after_capture};
use crate::collection::{StoryCollection, ViewHistory};
use crate::config::StoryConfig;
use crate::gesture::{Gesture, GestureKind, NavigationIntent, classify};

/// Identity of one playback session, minted by `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identity of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub session: SessionId,
    pub generation: u64,
}

impl TimerToken {
    /// Stable numeric id, for hosts that key scheduled work by integer.
    #[must_use]
    pub const fn id(self) -> u64 {
        // Generations are globally unique, so the session is redundant here.
        self.generation
    }
}

/// The single armed timer of a playing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub token: TimerToken,
    /// Delay from arming until expiry.
    pub duration: Duration,
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Closed,
    Playing {
        group: usize,
        item: usize,
    },
    Paused {
        group: usize,
        item: usize,
        remaining: Duration,
    },
}

impl PlaybackState {
    #[must_use]
    pub const fn position(self) -> Option<(usize, usize)> {
        match self {
            Self::Closed => None,
            Self::Playing { group, item } | Self::Paused { group, item, .. } => {
                Some((group, item))
            }
        }
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused { .. })
    }
}

/// Live playback state between `open` and `close`.
#[derive(Debug, Clone)]
struct PlaybackSession {
    id: SessionId,
    group: usize,
    item: usize,
    paused: bool,
    /// Captured remaining time while paused.
    remaining: Duration,
    timer: Option<ArmedTimer>,
}

/// The story playback state machine.
#[derive(Debug)]
pub struct PlaybackController {
    config: StoryConfig,
    collection: StoryCollection,
    history: ViewHistory,
    clock: ProgressClock,
    session: Option<PlaybackSession>,
    next_session: u64,
    next_generation: u64,
}

// ---------------------------------------------------------------------------
// Construction and accessors
// ---------------------------------------------------------------------------

impl PlaybackController {
    #[must_use]
    pub fn new(collection: StoryCollection, config: StoryConfig) -> Self {
        Self {
            config,
            collection,
            history: ViewHistory::new(),
            clock: ProgressClock::new(),
            session: None,
            next_session: 1,
            next_generation: 1,
        }
    }

    /// Start from an existing view history (e.g. carried over by the host).
    #[must_use]
    pub fn with_history(mut self, history: ViewHistory) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        match &self.session {
            None => PlaybackState::Closed,
            Some(s) if s.paused => PlaybackState::Paused {
                group: s.group,
                item: s.item,
                remaining: s.remaining,
            },
            Some(s) => PlaybackState::Playing {
                group: s.group,
                item: s.item,
            },
        }
    }

    /// Identity of the live session.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// The single armed timer, if playing.
    #[must_use]
    pub fn armed_timer(&self) -> Option<ArmedTimer> {
        self.session.as_ref().and_then(|s| s.timer)
    }

    /// Progress of the active item in `[0, 1]`; `0.0` when closed.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.session.is_some() {
            self.clock.value()
        } else {
            0.0
        }
    }

    /// Time left on the active item; zero when closed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        match &self.session {
            None => Duration::ZERO,
            Some(s) if s.paused => s.remaining,
            Some(_) => self.clock.remaining(),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &StoryCollection {
        &self.collection
    }

    #[must_use]
    pub fn history(&self) -> &ViewHistory {
        &self.history
    }

    #[must_use]
    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    #[must_use]
    pub fn item_duration(&self) -> Duration {
        self.config.playback.item_duration()
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

impl PlaybackController {
    /// Open the group at canonical `group`, starting at its first item.
    ///
    /// No-op if a session is already live or `group` is out of bounds.
    pub fn open(&mut self, group: usize) {
        if self.session.is_some() || group >= self.collection.len() {
            tracing::debug!(
                target: "story.playback",
                group,
                groups = self.collection.len(),
                live = self.session.is_some(),
                "open ignored"
            );
            return;
        }

        let id = SessionId(self.next_session);
        self.next_session += 1;
        self.session = Some(PlaybackSession {
            id,
            group,
            item: 0,
            paused: false,
            remaining: Duration::ZERO,
            timer: None,
        });
        tracing::info!(target: "story.playback", session = %id, group, "session opened");
        self.enter(group, 0, true);
    }

    /// Move to the next item, the next group, or close past the end.
    ///
    /// Timer expiry takes this same path.
    pub fn advance_item(&mut self) {
        let Some((group, item)) = self.position() else {
            return;
        };
        let group_len = self.group_len(group);

        if item + 1 < group_len {
            self.enter(group, item + 1, false);
        } else if group + 1 < self.collection.len() {
            self.enter(group + 1, 0, true);
        } else {
            tracing::debug!(target: "story.playback", "collection exhausted");
            self.close();
        }
    }

    /// Move to the previous item, or the last item of the previous group.
    ///
    /// No-op on the very first item.
    pub fn retreat_item(&mut self) {
        let Some((group, item)) = self.position() else {
            return;
        };

        if item > 0 {
            self.enter(group, item - 1, false);
        } else if group > 0 {
            let previous = group - 1;
            let last = self.collection.group(previous).map_or(0, |g| g.last_index());
            self.enter(previous, last, false);
        }
    }

    /// Jump to the first item of the group `delta` away.
    ///
    /// No-op for `delta == 0` or an out-of-range target.
    pub fn skip_to_group(&mut self, delta: isize) {
        let Some((group, _)) = self.position() else {
            return;
        };
        if delta == 0 {
            return;
        }
        let Some(target) = group
            .checked_add_signed(delta)
            .filter(|&t| t < self.collection.len())
        else {
            return;
        };
        self.enter(target, 0, true);
    }

    /// Freeze the active item, capturing its remaining time. Idempotent.
    pub fn pause(&mut self) {
        let duration = self.item_duration();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.paused {
            return;
        }

        let value = self.clock.stop_and_capture();
        session.remaining = remaining_after_capture(duration, value);
        session.paused = true;
        session.timer = None;
        tracing::debug!(
            target: "story.playback",
            session = %session.id,
            value,
            remaining_ms = session.remaining.as_millis() as u64,
            "paused"
        );
    }

    /// Continue the active item for exactly its captured remaining time.
    ///
    /// No-op unless paused.
    pub fn resume(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.paused {
            return;
        }
        let remaining = session.remaining;

        self.clock.resume(remaining);
        let timer = self.arm(remaining);
        if let Some(session) = self.session.as_mut() {
            session.paused = false;
            session.timer = timer;
            tracing::debug!(
                target: "story.playback",
                session = %session.id,
                remaining_ms = remaining.as_millis() as u64,
                "resumed"
            );
        }
    }

    /// End the session from any state.
    ///
    /// Cancels the armed timer and retires the session identity in the same
    /// step, so any in-flight timer callback is discarded.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            self.clock.stop();
            tracing::info!(target: "story.playback", session = %session.id, "session closed");
        }
    }

    /// Dispatch a navigation intent.
    pub fn apply(&mut self, intent: NavigationIntent) {
        match intent {
            NavigationIntent::Open(group) => self.open(group),
            NavigationIntent::Close => self.close(),
            NavigationIntent::Advance => self.advance_item(),
            NavigationIntent::Retreat => self.retreat_item(),
            NavigationIntent::SkipGroup(delta) => self.skip_to_group(delta),
        }
    }

    /// Contact started: pause immediately.
    pub fn press(&mut self) {
        self.pause();
    }

    /// Contact ended: resume, then apply whatever the gesture resolves to.
    ///
    /// Navigation arms a fresh full-duration timer, which supersedes the
    /// remaining-time timer armed by the resume.
    pub fn release(&mut self, gesture: &Gesture) -> GestureKind {
        self.resume();
        let kind = classify(gesture, &self.config.gesture);
        if let Some(intent) = kind.intent() {
            self.apply(intent);
        }
        kind
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

impl PlaybackController {
    /// Advance logical time by `dt`.
    ///
    /// When the active item's clock completes, its armed timer fires through
    /// [`on_timer_fired`](Self::on_timer_fired) and the unused part of `dt`
    /// carries into the next item, so the landing position depends only on
    /// total elapsed time. Returns `true` if at least one transition happened.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let mut dt = dt;
        let mut advanced = false;
        // Each pass consumes a whole item, so this ends by the last item.
        while let Some(timer) = self.armed_timer() {
            if self.clock.tick(dt) != ClockStep::Completed {
                break;
            }
            let leftover = self.clock.leftover();
            if !self.on_timer_fired(timer.token) {
                break;
            }
            advanced = true;
            if leftover.is_zero() {
                break;
            }
            dt = leftover;
        }
        advanced
    }

    /// A timer expired. Applies only if `token` is the armed timer.
    ///
    /// Returns `true` if the expiry advanced playback, `false` if it was
    /// discarded as stale.
    pub fn on_timer_fired(&mut self, token: TimerToken) -> bool {
        if self.armed_timer().map(|t| t.token) != Some(token) {
            tracing::debug!(
                target: "story.playback",
                session = %token.session,
                generation = token.generation,
                live = ?self.session_id(),
                "stale timer discarded"
            );
            return false;
        }
        self.advance_item();
        true
    }

    /// Swap in a freshly loaded collection.
    ///
    /// A live session is closed first: its indices refer to the old
    /// collection. View history is kept.
    pub fn replace_collection(&mut self, collection: StoryCollection) {
        self.close();
        self.collection = collection;
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

impl PlaybackController {
    fn position(&self) -> Option<(usize, usize)> {
        self.session.as_ref().map(|s| (s.group, s.item))
    }

    fn group_len(&self, group: usize) -> usize {
        self.collection.group(group).map_or(0, |g| g.len())
    }

    /// Land on `(group, item)` playing, with a fresh full-duration timer.
    ///
    /// `mark_viewed` records the destination group in the history (a no-op
    /// for the global group).
    fn enter(&mut self, group: usize, item: usize, mark_viewed: bool) {
        if mark_viewed && let Some(g) = self.collection.group(group) {
            self.history.mark_viewed(g.source());
        }

        let duration = self.item_duration();
        self.clock.start(duration);
        let timer = self.arm(duration);
        if let Some(session) = self.session.as_mut() {
            session.group = group;
            session.item = item;
            session.paused = false;
            session.remaining = Duration::ZERO;
            session.timer = timer;
            tracing::debug!(
                target: "story.playback",
                session = %session.id,
                group,
                item,
                "item entered"
            );
        }
    }

    /// Mint a token for the live session. The previous timer, if any, is
    /// replaced by the caller storing the result.
    fn arm(&mut self, duration: Duration) -> Option<ArmedTimer> {
        let session = self.session.as_ref()?.id;
        let generation = self.next_generation;
        self.next_generation += 1;
        Some(ArmedTimer {
            token: TimerToken {
                session,
                generation,
            },
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItem, Timestamp};

    const FAR: Timestamp = Timestamp(u64::MAX);
    const SEC_6: Duration = Duration::from_secs(6);

    fn collection(sizes: &[(Option<&str>, usize)]) -> StoryCollection {
        let mut items = Vec::new();
        for (g, &(group, n)) in sizes.iter().enumerate() {
            for i in 0..n {
                let id = format!("{g}-{i}");
                let created = Timestamp(i as u64);
                items.push(match group {
                    None => ContentItem::global(id, "Coordenação", "b", created, FAR),
                    Some(name) => ContentItem::community(id, name, name, "b", created, FAR),
                });
            }
        }
        StoryCollection::build(items)
    }

    fn controller(sizes: &[(Option<&str>, usize)]) -> PlaybackController {
        PlaybackController::new(collection(sizes), StoryConfig::default())
    }

    #[test]
    fn open_rejects_out_of_bounds() {
        let mut c = controller(&[(Some("a"), 1)]);
        c.open(1);
        assert_eq!(c.state(), PlaybackState::Closed);
        assert!(c.armed_timer().is_none());
    }

    #[test]
    fn open_on_empty_collection_is_noop() {
        let mut c = controller(&[]);
        c.open(0);
        assert!(c.state().is_closed());
    }

    #[test]
    fn open_arms_full_duration_and_marks_viewed() {
        let mut c = controller(&[(Some("a"), 2), (Some("b"), 1)]);
        c.open(1);
        assert_eq!(c.state(), PlaybackState::Playing { group: 1, item: 0 });
        assert_eq!(c.armed_timer().map(|t| t.duration), Some(SEC_6));
        assert!(c.history().is_viewed(c.collection().groups()[1].source()));
        assert!(!c.history().is_viewed(c.collection().groups()[0].source()));
    }

    #[test]
    fn open_while_live_is_noop() {
        let mut c = controller(&[(Some("a"), 1), (Some("b"), 1)]);
        c.open(0);
        let id = c.session_id();
        c.open(1);
        assert_eq!(c.session_id(), id);
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 0 });
    }

    #[test]
    fn global_group_is_never_viewed() {
        let mut c = controller(&[(None, 2), (Some("a"), 1)]);
        c.open(0);
        c.advance_item();
        assert_eq!(c.history().len(), 0);
        c.advance_item();
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn advance_crosses_groups_then_closes() {
        let mut c = controller(&[(Some("a"), 2), (Some("b"), 1)]);
        c.open(0);
        c.advance_item();
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 1 });
        c.advance_item();
        assert_eq!(c.state(), PlaybackState::Playing { group: 1, item: 0 });
        c.advance_item();
        assert!(c.state().is_closed());
        assert!(c.session_id().is_none());
    }

    #[test]
    fn retreat_goes_to_last_item_of_previous_group() {
        let mut c = controller(&[(Some("a"), 3), (Some("b"), 1)]);
        c.open(1);
        c.retreat_item();
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 2 });
        c.retreat_item();
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 1 });
    }

    #[test]
    fn retreat_at_start_is_noop() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.open(0);
        let before = c.armed_timer();
        c.retreat_item();
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 0 });
        assert_eq!(c.armed_timer(), before, "no re-arm on a no-op");
    }

    #[test]
    fn skip_lands_on_first_item_and_ignores_out_of_range() {
        let mut c = controller(&[(Some("a"), 3), (Some("b"), 2), (Some("c"), 1)]);
        c.open(0);
        c.advance_item();
        c.skip_to_group(1);
        assert_eq!(c.state(), PlaybackState::Playing { group: 1, item: 0 });
        c.skip_to_group(5);
        assert_eq!(c.state(), PlaybackState::Playing { group: 1, item: 0 });
        c.skip_to_group(-2);
        assert_eq!(c.state(), PlaybackState::Playing { group: 1, item: 0 });
        c.skip_to_group(-1);
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 0 });
        c.skip_to_group(0);
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 0 });
    }

    #[test]
    fn pause_captures_and_resume_arms_remaining() {
        let mut c = controller(&[(Some("a"), 1)]);
        c.open(0);
        c.tick(Duration::from_millis(2400));
        c.pause();
        assert_eq!(
            c.state(),
            PlaybackState::Paused {
                group: 0,
                item: 0,
                remaining: Duration::from_millis(3600)
            }
        );
        assert!(c.armed_timer().is_none());

        c.resume();
        assert_eq!(
            c.armed_timer().map(|t| t.duration),
            Some(Duration::from_millis(3600))
        );
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut c = controller(&[(Some("a"), 1)]);
        c.open(0);
        c.tick(Duration::from_secs(1));
        c.pause();
        let paused = c.state();
        c.pause();
        assert_eq!(c.state(), paused);

        c.resume();
        let timer = c.armed_timer();
        c.resume();
        assert_eq!(c.armed_timer(), timer);
    }

    #[test]
    fn paused_clock_does_not_expire() {
        let mut c = controller(&[(Some("a"), 1)]);
        c.open(0);
        c.pause();
        assert!(!c.tick(Duration::from_secs(60)));
        assert!(c.state().is_paused());
    }

    #[test]
    fn tick_expiry_advances() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.open(0);
        assert!(!c.tick(Duration::from_millis(5999)));
        assert!(c.tick(Duration::from_millis(1)));
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 1 });
        assert_eq!(c.progress(), 0.0);
    }

    #[test]
    fn overshoot_carries_into_following_items() {
        let mut c = controller(&[(Some("a"), 4)]);
        c.open(0);
        assert!(c.tick(Duration::from_secs(13)));
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 2 });
        assert!((c.progress() - 1.0 / 6.0).abs() < 1e-9);
        assert_eq!(c.remaining(), Duration::from_secs(5));
    }

    #[test]
    fn one_large_tick_matches_many_small_ones() {
        let mut whole = controller(&[(Some("a"), 4), (Some("b"), 2)]);
        let mut split = controller(&[(Some("a"), 4), (Some("b"), 2)]);
        whole.open(0);
        split.open(0);

        whole.tick(Duration::from_secs(13));
        // 17ms frames do not divide the item duration.
        for _ in 0..764 {
            split.tick(Duration::from_millis(17));
        }
        split.tick(Duration::from_millis(12));

        assert_eq!(whole.state(), split.state());
        assert!((whole.progress() - split.progress()).abs() < 1e-9);
        assert_eq!(whole.remaining(), split.remaining());
    }

    #[test]
    fn overshoot_past_last_item_closes() {
        let mut c = controller(&[(Some("a"), 2), (Some("b"), 1)]);
        c.open(0);
        assert!(c.tick(Duration::from_secs(3600)));
        assert!(c.state().is_closed());
        assert!(c.armed_timer().is_none());
    }

    #[test]
    fn overshoot_carries_after_resume() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.open(0);
        c.tick(Duration::from_secs(4));
        c.pause();
        c.resume();
        c.tick(Duration::from_secs(3));
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 1 });
        assert_eq!(c.remaining(), Duration::from_secs(5));
    }

    #[test]
    fn superseded_token_is_discarded() {
        let mut c = controller(&[(Some("a"), 3)]);
        c.open(0);
        let first = c.armed_timer().map(|t| t.token);
        c.advance_item();
        let Some(first) = first else {
            panic!("timer armed on open");
        };
        assert!(!c.on_timer_fired(first));
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 1 });
    }

    #[test]
    fn token_from_closed_session_is_discarded_after_reopen() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.open(0);
        let old = c.armed_timer().map(|t| t.token);
        c.close();
        c.open(0);
        assert_ne!(c.armed_timer().map(|t| t.token), old);
        if let Some(old) = old {
            assert!(!c.on_timer_fired(old));
        }
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 0 });
    }

    #[test]
    fn release_resumes_then_navigates() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.open(0);
        c.tick(Duration::from_secs(3));
        c.press();
        assert!(c.state().is_paused());

        let kind = c.release(&Gesture::tap(300.0, 300.0, 390.0));
        assert_eq!(kind, GestureKind::TapRight);
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 1 });
        assert_eq!(c.armed_timer().map(|t| t.duration), Some(SEC_6));
    }

    #[test]
    fn indeterminate_release_only_resumes() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.open(0);
        c.tick(Duration::from_secs(3));
        c.press();
        let drag = Gesture::new(200.0, 300.0, 30.0, 0.0, Duration::from_millis(200), 390.0);
        assert_eq!(c.release(&drag), GestureKind::Indeterminate);
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 0 });
        assert_eq!(
            c.armed_timer().map(|t| t.duration),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn advance_from_paused_plays_next() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.open(0);
        c.pause();
        c.advance_item();
        assert_eq!(c.state(), PlaybackState::Playing { group: 0, item: 1 });
        assert!(c.armed_timer().is_some());
    }

    #[test]
    fn seeded_history_dims_without_replaying() {
        let sources = collection(&[(Some("a"), 1), (Some("b"), 1)]);
        let mut history = ViewHistory::new();
        history.mark_viewed(sources.groups()[0].source());

        let mut c = PlaybackController::new(sources, StoryConfig::default())
            .with_history(history);
        assert!(c.history().is_viewed(c.collection().groups()[0].source()));
        assert_eq!(c.collection().display_order(c.history()), vec![1, 0]);

        c.open(1);
        assert_eq!(c.history().len(), 2);
        assert_eq!(c.collection().display_order(c.history()), vec![0, 1]);
    }

    #[test]
    fn session_ids_increase_across_opens() {
        let mut c = controller(&[(Some("a"), 1)]);
        c.open(0);
        let first = c.session_id().map(SessionId::get);
        c.close();
        c.open(0);
        let second = c.session_id().map(SessionId::get);
        assert!(first < second, "{first:?} then {second:?}");
        assert_eq!(c.session_id().map(|id| id.to_string()), second.map(|n| format!("s{n}")));
    }

    #[test]
    fn replace_collection_closes_session_keeps_history() {
        let mut c = controller(&[(Some("a"), 1)]);
        c.open(0);
        c.replace_collection(collection(&[(Some("b"), 1)]));
        assert!(c.state().is_closed());
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.collection().groups()[0].name(), "b");
    }

    #[test]
    fn operations_on_closed_are_noops() {
        let mut c = controller(&[(Some("a"), 2)]);
        c.advance_item();
        c.retreat_item();
        c.skip_to_group(1);
        c.pause();
        c.resume();
        c.close();
        assert!(!c.tick(SEC_6));
        assert!(c.state().is_closed());
        assert!(c.history().is_empty());
        assert_eq!(c.progress(), 0.0);
        assert_eq!(c.remaining(), Duration::ZERO);
    }
}
