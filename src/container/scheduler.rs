//! Cancellable timers owned by a container instance
//!
//! The pane runs on the host's UI loop, so timers are plain deadlines that the
//! host drains by calling `MessageContainer::tick`. Nothing runs on another
//! thread and nothing blocks. Time comes from a [`Clock`] so tests can drive
//! it with [`ManualClock`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give another
/// to the container.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.elapsed_nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    task: T,
}

/// Deadline queue of tasks of type `T`
pub struct Scheduler<T> {
    clock: Arc<dyn Clock>,
    next_id: u64,
    pending: BTreeMap<TimerId, Pending<T>>,
}

impl<T: fmt::Debug> fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("next_id", &self.next_id)
            .field("pending", &self.pending)
            .finish()
    }
}

impl<T> Scheduler<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Run `task` once `delay` has elapsed
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = self.clock.now() + delay;
        self.pending.insert(id, Pending { deadline, task });
        id
    }

    /// Drop a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Drop every pending task
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return tasks whose deadline has passed, earliest first
    pub fn take_due(&mut self) -> Vec<(TimerId, T)> {
        let now = self.clock.now();
        let mut due: Vec<(TimerId, Instant)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(id, p)| (*id, p.deadline))
            .collect();
        due.sort_by_key(|(id, deadline)| (*deadline, *id));

        due.into_iter()
            .filter_map(|(id, _)| self.pending.remove(&id).map(|p| (id, p.task)))
            .collect()
    }

    /// Time until the earliest pending deadline, if any
    pub fn next_deadline_in(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .values()
            .map(|p| p.deadline.saturating_duration_since(now))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> (ManualClock, Scheduler<&'static str>) {
        let clock = ManualClock::new();
        let scheduler = Scheduler::new(Arc::new(clock.clone()));
        (clock, scheduler)
    }

    #[test]
    fn test_task_not_due_before_deadline() {
        let (clock, mut sched) = scheduler();
        sched.schedule(Duration::from_millis(100), "a");

        clock.advance(Duration::from_millis(99));
        assert!(sched.take_due().is_empty());

        clock.advance(Duration::from_millis(1));
        let due = sched.take_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, "a");
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_due_tasks_in_deadline_order() {
        let (clock, mut sched) = scheduler();
        sched.schedule(Duration::from_millis(30), "late");
        sched.schedule(Duration::from_millis(10), "early");

        clock.advance(Duration::from_millis(50));
        let order: Vec<_> = sched.take_due().into_iter().map(|(_, t)| t).collect();
        assert_eq!(order, vec!["early", "late"]);
    }

    #[test]
    fn test_cancel() {
        let (clock, mut sched) = scheduler();
        let id = sched.schedule(Duration::from_millis(10), "x");
        assert!(sched.is_pending(id));
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));

        clock.advance(Duration::from_secs(1));
        assert!(sched.take_due().is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let (clock, mut sched) = scheduler();
        sched.schedule(Duration::from_millis(10), "a");
        sched.schedule(Duration::from_millis(20), "b");
        assert_eq!(sched.cancel_all(), 2);

        clock.advance(Duration::from_secs(1));
        assert!(sched.take_due().is_empty());
    }

    #[test]
    fn test_next_deadline_in() {
        let (clock, mut sched) = scheduler();
        assert_eq!(sched.next_deadline_in(), None);
        sched.schedule(Duration::from_millis(40), "a");
        clock.advance(Duration::from_millis(15));
        assert_eq!(sched.next_deadline_in(), Some(Duration::from_millis(25)));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(5));
        assert_eq!(other.elapsed(), Duration::from_millis(5));
    }
}
