#![forbid(unsafe_code)]

//! Subscription system for timer-driven story messages.
//!
//! Subscriptions run on background threads and only ever *send* messages.
//! The program drains those messages and applies them one at a time on its
//! own thread, so playback state is never touched concurrently.
//!
//! # How it works
//!
//! 1. `StoryProgram::subscriptions()` returns the set of active subscriptions
//! 2. After each drain, the program reconciles active vs previous subscriptions
//! 3. New subscriptions are started, removed ones are stopped
//! 4. Subscription messages are routed through `StoryProgram::update()`
//!
//! The item [`Deadline`] derives its id from the armed timer token, so every
//! transition that re-arms replaces the old deadline thread.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use story_core::ArmedTimer;

/// A unique identifier for a subscription.
pub type SubId = u64;

/// A subscription produces messages from an external event source.
pub trait Subscription<M: Send + 'static>: Send {
    /// Unique identifier for deduplication.
    ///
    /// Subscriptions with the same ID are considered identical and are not
    /// restarted across reconciles.
    fn id(&self) -> SubId;

    /// Run on a background thread, sending messages until stopped or the
    /// receiver is gone.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);
}

/// Signal for stopping a subscription.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    pub(crate) fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: Arc::clone(&inner),
        };
        (signal, StopTrigger { inner })
    }

    /// Check if the stop signal has been triggered.
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if the full duration elapsed.
    /// Spurious wakeups are absorbed.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (stopped, _) = cvar
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *stopped
    }
}

/// Trigger to stop a subscription from the program side.
pub(crate) struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }
}

/// A running subscription handle.
pub(crate) struct RunningSubscription {
    pub(crate) id: SubId,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningSubscription {
    /// Stop the subscription and join its thread.
    pub(crate) fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RunningSubscription {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

/// Manages the lifecycle of subscriptions for a program.
pub(crate) struct SubscriptionManager<M: Send + 'static> {
    active: Vec<RunningSubscription>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> SubscriptionManager<M> {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            active: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Update the set of active subscriptions.
    ///
    /// - Starts subscriptions that are new (ID not in active set)
    /// - Stops subscriptions that are no longer declared
    /// - Leaves unchanged subscriptions running
    pub(crate) fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let new_ids: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();

        let mut remaining = Vec::new();
        for running in self.active.drain(..) {
            if new_ids.contains(&running.id) {
                remaining.push(running);
            } else {
                tracing::debug!(
                    target: "story.runtime",
                    sub_id = running.id,
                    "stopping subscription"
                );
                running.stop();
            }
        }
        self.active = remaining;

        let mut active_ids: HashSet<SubId> = self.active.iter().map(|r| r.id).collect();
        for sub in subscriptions {
            let id = sub.id();
            if !active_ids.insert(id) {
                continue;
            }

            tracing::debug!(target: "story.runtime", sub_id = id, "starting subscription");
            let (signal, trigger) = StopSignal::new();
            let sender = self.sender.clone();
            let thread = thread::spawn(move || {
                sub.run(sender, signal);
            });

            self.active.push(RunningSubscription {
                id,
                trigger,
                thread: Some(thread),
            });
        }
    }

    /// Drain pending messages without blocking.
    pub(crate) fn drain_messages(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    /// Block for the next message, up to `timeout`.
    pub(crate) fn recv_timeout(&self, timeout: Duration) -> Option<M> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Ids of running subscriptions.
    pub(crate) fn active_ids(&self) -> Vec<SubId> {
        self.active.iter().map(|r| r.id).collect()
    }

    /// Stop all running subscriptions.
    pub(crate) fn stop_all(&mut self) {
        for running in self.active.drain(..) {
            running.stop();
        }
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// --- Built-in subscriptions ---

/// Fires at a fixed interval. Drives frame ticks while a story plays.
pub struct Every<M: Send + 'static> {
    id: SubId,
    interval: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Every<M> {
    /// Create a tick subscription with the given interval and message factory.
    pub fn new(interval: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        // Stable id from the interval so reconciles keep the same thread.
        let id = interval.as_nanos() as u64 ^ 0x5449_434B; // "TICK"
        Self {
            id,
            interval,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for Every<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        loop {
            if stop.wait_timeout(self.interval) {
                break;
            }
            if sender.send((self.make_msg)()).is_err() {
                break;
            }
        }
    }
}

/// One-shot timer for the armed story item.
///
/// Sends a single message when the armed duration elapses, unless stopped
/// first.
pub struct Deadline<M: Send + 'static> {
    timer: ArmedTimer,
    make_msg: Box<dyn Fn(ArmedTimer) -> M + Send + Sync>,
}

/// High bits keep deadline ids apart from interval ids.
const DEADLINE_TAG: u64 = 0x4445_4144 << 32; // "DEAD"

impl<M: Send + 'static> Deadline<M> {
    /// Fire `make_msg(timer)` once `timer.duration` has elapsed.
    pub fn new(
        timer: ArmedTimer,
        make_msg: impl Fn(ArmedTimer) -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            timer,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for Deadline<M> {
    fn id(&self) -> SubId {
        DEADLINE_TAG ^ self.timer.token.id()
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        if !stop.wait_timeout(self.timer.duration) {
            let _ = sender.send((self.make_msg)(self.timer));
        }
    }
}

/// A mock subscription for testing.
///
/// Immediately sends all queued messages and then stops.
pub struct MockSubscription<M: Send + 'static> {
    id: SubId,
    messages: Vec<M>,
}

impl<M: Send + Clone + 'static> MockSubscription<M> {
    pub fn new(id: SubId, messages: Vec<M>) -> Self {
        Self { id, messages }
    }
}

impl<M: Send + Clone + 'static> Subscription<M> for MockSubscription<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, _stop: StopSignal) {
        for msg in &self.messages {
            if sender.send(msg.clone()).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_core::{
        ContentItem, PlaybackController, StoryCollection, StoryConfig, Timestamp, TimerToken,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum TestMsg {
        Tick,
        Fired(TimerToken),
        Value(i32),
    }

    fn armed(duration: Duration) -> ArmedTimer {
        let items = vec![ContentItem::community(
            "a1",
            "a",
            "A",
            "b",
            Timestamp(0),
            Timestamp(u64::MAX),
        )];
        let mut config = StoryConfig::default();
        config.playback.item_duration_ms = duration.as_millis() as u64;
        let mut c = PlaybackController::new(StoryCollection::build(items), config);
        c.open(0);
        c.armed_timer().expect("armed on open")
    }

    #[test]
    fn stop_signal_starts_false() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.is_stopped());
    }

    #[test]
    fn stop_signal_wait_returns_true_when_stopped() {
        let (signal, trigger) = StopSignal::new();
        trigger.stop();
        assert!(signal.is_stopped());
        assert!(signal.wait_timeout(Duration::from_millis(100)));
    }

    #[test]
    fn stop_signal_wait_returns_false_on_timeout() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn every_subscription_fires() {
        let sub = Every::new(Duration::from_millis(10), || TestMsg::Tick);
        let (tx, rx) = mpsc::channel();
        let (signal, trigger) = StopSignal::new();

        let handle = thread::spawn(move || sub.run(tx, signal));
        thread::sleep(Duration::from_millis(50));
        trigger.stop();
        handle.join().unwrap();

        let msgs: Vec<_> = rx.try_iter().collect();
        assert!(!msgs.is_empty(), "should have received at least one tick");
        assert!(msgs.iter().all(|m| *m == TestMsg::Tick));
    }

    #[test]
    fn every_subscription_uses_stable_id() {
        let a = Every::<TestMsg>::new(Duration::from_millis(16), || TestMsg::Tick);
        let b = Every::<TestMsg>::new(Duration::from_millis(16), || TestMsg::Tick);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn deadline_fires_once_with_token() {
        let timer = armed(Duration::from_millis(10));
        let sub = Deadline::new(timer, |t| TestMsg::Fired(t.token));
        let (tx, rx) = mpsc::channel();
        let (signal, _trigger) = StopSignal::new();

        sub.run(tx, signal);
        let msgs: Vec<_> = rx.try_iter().collect();
        assert_eq!(msgs, vec![TestMsg::Fired(timer.token)]);
    }

    #[test]
    fn stopped_deadline_never_fires() {
        let timer = armed(Duration::from_secs(30));
        let sub = Deadline::new(timer, |t| TestMsg::Fired(t.token));
        let (tx, rx) = mpsc::channel();
        let (signal, trigger) = StopSignal::new();

        let handle = thread::spawn(move || sub.run(tx, signal));
        trigger.stop();
        handle.join().unwrap();
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn deadline_ids_differ_from_interval_ids() {
        let timer = armed(Duration::from_millis(16));
        let deadline = Deadline::new(timer, |t| TestMsg::Fired(t.token));
        let every = Every::<TestMsg>::new(Duration::from_millis(16), || TestMsg::Tick);
        assert_ne!(deadline.id(), every.id());
    }

    #[test]
    fn subscription_manager_dedupes_duplicate_ids() {
        let mut mgr = SubscriptionManager::<TestMsg>::new();
        let subs: Vec<Box<dyn Subscription<TestMsg>>> = vec![
            Box::new(MockSubscription::new(7, vec![TestMsg::Value(1)])),
            Box::new(MockSubscription::new(7, vec![TestMsg::Value(2)])),
        ];
        mgr.reconcile(subs);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(mgr.drain_messages(), vec![TestMsg::Value(1)]);
        assert_eq!(mgr.active_ids(), vec![7]);
    }

    #[test]
    fn subscription_manager_stops_removed() {
        let mut mgr = SubscriptionManager::<TestMsg>::new();
        mgr.reconcile(vec![Box::new(Every::new(Duration::from_millis(5), || {
            TestMsg::Tick
        }))]);

        thread::sleep(Duration::from_millis(20));
        assert!(!mgr.drain_messages().is_empty());

        mgr.reconcile(vec![]);
        assert!(mgr.active_ids().is_empty());
        let _ = mgr.drain_messages();

        thread::sleep(Duration::from_millis(30));
        assert!(mgr.drain_messages().is_empty());
    }
}
