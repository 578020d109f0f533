//! Virtual-time timer queue.
//!
//! Nothing here sleeps. Callers move the clock forward and pull due timers
//! one at a time with [`Scheduler::pop_due`], so handlers may cancel or arm
//! other timers between two firings.

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Monotonic clock in milliseconds since the session started.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackClock {
    pub elapsed_ms: u64,
}

impl PlaybackClock {
    pub fn advance(&mut self, delta: Duration) {
        self.advance_to(self.elapsed_ms.saturating_add(duration_ms(delta)));
    }

    /// Moves the clock to `ms`. Earlier values are ignored.
    pub fn advance_to(&mut self, ms: u64) {
        self.elapsed_ms = self.elapsed_ms.max(ms);
    }
}

/// Handle returned when arming a timer, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<A> {
    pub id: TimerId,
    pub due_ms: u64,
    pub action: A,
}

#[derive(Debug)]
struct Pending<A> {
    action: A,
    interval_ms: Option<u64>,
}

#[derive(Debug)]
pub struct Scheduler<A> {
    clock: PlaybackClock,
    queue: BTreeMap<(u64, TimerId), Pending<A>>,
    deadlines: HashMap<TimerId, u64>,
    next_id: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            clock: PlaybackClock::default(),
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<A: Clone> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.elapsed_ms
    }

    /// Arms a one-shot timer firing `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, action: A) -> TimerId {
        self.insert(duration_ms(delay), None, action)
    }

    /// Arms a timer that fires every `interval` until cancelled. A zero
    /// interval is bumped to one millisecond so the queue always drains.
    pub fn schedule_repeating(&mut self, interval: Duration, action: A) -> TimerId {
        let interval_ms = duration_ms(interval).max(1);
        self.insert(interval_ms, Some(interval_ms), action)
    }

    /// Cancels a pending timer. Returns `false` if it already fired or was
    /// never armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(due) => self.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    pub fn cancel_all(&mut self, ids: impl IntoIterator<Item = TimerId>) {
        for id in ids {
            self.cancel(id);
        }
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Removes and returns the earliest timer due at or before `until_ms`,
    /// moving the clock to its deadline. Ties fire in arming order. Repeating
    /// timers are re-armed before being returned.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired<A>> {
        let (&(due_ms, id), _) = self.queue.iter().next()?;
        if due_ms > until_ms {
            return None;
        }

        let pending = self.queue.remove(&(due_ms, id))?;
        self.deadlines.remove(&id);
        self.clock.advance_to(due_ms);

        if let Some(interval_ms) = pending.interval_ms {
            let next = due_ms.saturating_add(interval_ms);
            self.queue.insert(
                (next, id),
                Pending {
                    action: pending.action.clone(),
                    interval_ms: Some(interval_ms),
                },
            );
            self.deadlines.insert(id, next);
        }

        Some(Fired {
            id,
            due_ms,
            action: pending.action,
        })
    }

    /// Moves the clock forward without firing anything. Callers drain
    /// [`Scheduler::pop_due`] first.
    pub fn advance_clock_to(&mut self, ms: u64) {
        self.clock.advance_to(ms);
    }

    fn insert(&mut self, delay_ms: u64, interval_ms: Option<u64>, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.clock.elapsed_ms.saturating_add(delay_ms);
        self.queue.insert(
            (due, id),
            Pending {
                action,
                interval_ms,
            },
        );
        self.deadlines.insert(id, due);
        id
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
