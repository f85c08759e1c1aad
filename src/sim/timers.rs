/// Registry of cancellable deferred callbacks.
///
/// A timer is just a deadline stored under a key. `expire()` reports only
/// keys that are still registered, so removing an entry synchronously is
/// all it takes to guarantee it never fires.
///
/// Time is "elapsed since session start", passed in by the caller.

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::effect::EffectKind;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TimerKey {
    /// Activating -> ZeroGravity.
    ModeActivation,
    /// Auto-clear of a transient effect flag.
    Effect(EffectKind),
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    deadline: Duration,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct TimerRegistry {
    pending: HashMap<TimerKey, Timer>,
    next_seq: u64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to fire at `now + delay`. Re-arming replaces the old deadline.
    pub fn schedule(&mut self, key: TimerKey, now: Duration, delay: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(key, Timer { deadline: now + delay, seq });
    }

    /// Returns true if a pending timer was removed.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.pending.remove(&key).is_some()
    }

    /// Drop every effect timer, leaving the mode timer alone.
    pub fn cancel_effects(&mut self) {
        self.pending.retain(|k, _| !matches!(k, TimerKey::Effect(_)));
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    #[cfg(test)]
    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.pending.contains_key(&key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return every timer due at `now`, earliest deadline first.
    /// Ties keep scheduling order.
    pub fn expire(&mut self, now: Duration) -> Vec<TimerKey> {
        let mut due: Vec<(TimerKey, Timer)> = self
            .pending
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(k, t)| (*k, *t))
            .collect();
        due.sort_by_key(|(_, t)| (t.deadline, t.seq));
        for (key, _) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(k, _)| k).collect()
    }
}
