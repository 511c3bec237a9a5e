// Cancellable schedules
// A slot holding at most one outstanding timer of a given class

use std::time::Duration;

use super::events::{TimerId, TimerQueue};

/// Owns at most one pending timer in a [`TimerQueue`].
///
/// Scheduling through the slot always cancels whatever it held before, so
/// two competing timers of the same class can never be outstanding.
#[derive(Debug, Default)]
pub struct CancellableSchedule {
    slot: Option<TimerId>,
}

impl CancellableSchedule {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the previous timer, then fire `event` once after `delay`
    pub fn schedule<E: Clone>(
        &mut self,
        queue: &mut TimerQueue<E>,
        now: Duration,
        delay: Duration,
        event: E,
    ) -> TimerId {
        self.cancel(queue);
        let id = queue.schedule_once(now, delay, event);
        self.slot = Some(id);
        id
    }

    /// Cancel the previous timer, then fire `event` every `period`
    pub fn schedule_every<E: Clone>(
        &mut self,
        queue: &mut TimerQueue<E>,
        now: Duration,
        period: Duration,
        event: E,
    ) -> TimerId {
        self.cancel(queue);
        let id = queue.schedule_every(now, period, event);
        self.slot = Some(id);
        id
    }

    /// Cancel the held timer, if any. Returns true if one was pending.
    pub fn cancel<E: Clone>(&mut self, queue: &mut TimerQueue<E>) -> bool {
        match self.slot.take() {
            Some(id) => queue.cancel(id),
            None => false,
        }
    }

    /// Release the slot after its single-fire timer fired.
    ///
    /// Returns false if `id` is not the timer this slot currently owns, i.e.
    /// the firing timer belongs to an older schedule.
    pub fn complete(&mut self, id: TimerId) -> bool {
        if self.slot == Some(id) {
            self.slot = None;
            true
        } else {
            false
        }
    }

    /// Check whether `id` is the timer this slot owns
    pub fn owns(&self, id: TimerId) -> bool {
        self.slot == Some(id)
    }

    /// Check whether the slot holds a timer that has not fired yet
    pub fn is_pending<E: Clone>(&self, queue: &TimerQueue<E>) -> bool {
        self.slot.is_some_and(|id| queue.is_scheduled(id))
    }

    /// Forget the held timer without touching the queue (used after the
    /// queue itself was cleared)
    pub fn reset(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_schedule_cancels_previous() {
        let mut queue = TimerQueue::new();
        let mut slot = CancellableSchedule::new();

        let first = slot.schedule(&mut queue, ms(0), ms(100), "old");
        let second = slot.schedule(&mut queue, ms(50), ms(100), "new");

        assert!(!queue.is_scheduled(first));
        assert!(queue.is_scheduled(second));
        assert_eq!(queue.len(), 1);

        let fired = queue.pop_due(ms(1000)).unwrap();
        assert_eq!(fired.event, "new");
        assert!(slot.complete(fired.id));
        assert!(!slot.is_pending(&queue));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        let mut slot = CancellableSchedule::new();

        assert!(!slot.cancel(&mut queue));
        slot.schedule(&mut queue, ms(0), ms(10), ());
        assert!(slot.cancel(&mut queue));
        assert!(!slot.cancel(&mut queue));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_complete_rejects_foreign_timer() {
        let mut queue = TimerQueue::new();
        let mut slot = CancellableSchedule::new();
        let other = queue.schedule_once(ms(0), ms(5), 0);
        let mine = slot.schedule(&mut queue, ms(0), ms(10), 1);

        assert!(!slot.complete(other));
        assert!(slot.owns(mine));
        assert!(slot.complete(mine));
    }

    #[test]
    fn test_recurring_slot_stays_pending() {
        let mut queue = TimerQueue::new();
        let mut slot = CancellableSchedule::new();
        slot.schedule_every(&mut queue, ms(0), ms(10), ());

        queue.pop_due(ms(10)).unwrap();
        assert!(slot.is_pending(&queue));

        slot.cancel(&mut queue);
        assert!(queue.is_empty());
    }
}
