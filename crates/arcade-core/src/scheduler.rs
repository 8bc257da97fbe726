use std::time::Duration;

/// Shortest period a repeating timer may have. Guards `pop_due` against a
/// zero-period timer that would never let the clock advance.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a scheduled timer. Cancelling through the handle is the only
/// way to stop a timer before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<K> {
    id: TimerId,
    kind: K,
    due: Duration,
    period: Option<Duration>,
}

/// A timer firing returned by [`Scheduler::pop_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<K> {
    pub id: TimerId,
    pub kind: K,
    /// Clock time at which the timer was due.
    pub at: Duration,
}

/// Virtual clock with cancellable one-shot and repeating timers.
///
/// The host owns time: a game calls [`Scheduler::pop_due`] in a loop up to a
/// deadline, handles each firing to completion, then settles the clock with
/// [`Scheduler::advance_to`]. Because firings are popped one at a time, a
/// handler that cancels another timer (or all of them) prevents every later
/// firing, including ones that fall inside the same deadline.
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer<K>>,
}

impl<K: Clone> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            timers: Vec::new(),
        }
    }

    /// Current clock time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Clock time `dt` from now.
    pub fn deadline(&self, dt: Duration) -> Duration {
        self.now + dt
    }

    /// Schedule `kind` to fire every `period`, first at `now + period`.
    pub fn every(&mut self, period: Duration, kind: K) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(kind, self.now + period, Some(period))
    }

    /// Schedule `kind` to fire once at `now + delay`.
    pub fn after(&mut self, delay: Duration, kind: K) -> TimerId {
        self.insert(kind, self.now + delay, None)
    }

    fn insert(&mut self, kind: K, due: Duration, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            kind,
            due,
            period,
        });
        id
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Number of live timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Pop the earliest timer due at or before `deadline`, moving the clock to
    /// its due time. Ties resolve in registration order. Repeating timers are
    /// rescheduled one period later; one-shot timers are removed.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<Fired<K>> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= deadline)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;

        let timer = &self.timers[idx];
        let fired = Fired {
            id: timer.id,
            kind: timer.kind.clone(),
            at: timer.due,
        };
        let period = timer.period;
        self.now = self.now.max(fired.at);

        match period {
            Some(p) => self.timers[idx].due += p,
            None => {
                self.timers.swap_remove(idx);
            },
        }
        Some(fired)
    }

    /// Move the clock forward to `t`. Never moves it backwards.
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }
}
