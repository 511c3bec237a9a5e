// Timer Management
// Handles scheduling and firing of single-shot and recurring timers

use std::time::Duration;

/// Identifier of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that came due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer<E> {
    /// Timer that fired (recurring timers keep their id across firings)
    pub id: TimerId,
    /// Deadline the timer was scheduled for, which may be earlier than the
    /// reading it was drained at
    pub at: Duration,
    /// Payload supplied when scheduling
    pub event: E,
}

#[derive(Debug, Clone)]
struct Entry<E> {
    id: TimerId,
    due: Duration,
    /// Insertion order, breaks ties between equal deadlines
    seq: u64,
    /// Re-arm interval for recurring timers
    period: Option<Duration>,
    event: E,
}

/// Queue of pending timers sorted by deadline.
///
/// Timers with equal deadlines fire in the order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
    next_seq: u64,
}

impl<E: Clone> TimerQueue<E> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Schedule `event` to fire once, `delay` after `now`
    pub fn schedule_once(&mut self, now: Duration, delay: Duration, event: E) -> TimerId {
        self.insert(now + delay, None, event)
    }

    /// Schedule `event` to fire every `period`, first at `now + period`.
    ///
    /// A zero period is raised to one millisecond so a recurring timer can
    /// never fire twice at the same instant.
    pub fn schedule_every(&mut self, now: Duration, period: Duration, event: E) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.insert(now + period, Some(period), event)
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check whether a timer is still pending
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.first().map(|e| e.due)
    }

    /// Remove and return the earliest timer due at or before `now`.
    ///
    /// Recurring timers are re-armed one period after their deadline before
    /// being returned.
    pub fn pop_due(&mut self, now: Duration) -> Option<FiredTimer<E>> {
        if self.entries.first().map_or(true, |e| e.due > now) {
            return None;
        }

        let entry = self.entries.remove(0);
        let fired = FiredTimer {
            id: entry.id,
            at: entry.due,
            event: entry.event.clone(),
        };

        if let Some(period) = entry.period {
            let seq = self.bump_seq();
            self.push_sorted(Entry {
                due: entry.due + period,
                seq,
                ..entry
            });
        }

        Some(fired)
    }

    /// Count pending timers whose payload matches `pred`
    pub fn count_matching(&self, pred: impl Fn(&E) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.event)).count()
    }

    /// Cancel every pending timer
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no timers are pending
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, due: Duration, period: Option<Duration>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.push_sorted(Entry {
            id,
            due,
            seq,
            period,
            event,
        });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn push_sorted(&mut self, entry: Entry<E>) {
        let key = (entry.due, entry.seq);
        let pos = self
            .entries
            .partition_point(|e| (e.due, e.seq) <= key);
        self.entries.insert(pos, entry);
    }
}

impl<E: Clone> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_timer_queue_new() {
        let queue: TimerQueue<u8> = TimerQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn test_schedule_once_fires_at_deadline() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_once(ms(100), ms(50), "a");

        assert_eq!(queue.next_deadline(), Some(ms(150)));
        assert!(queue.pop_due(ms(149)).is_none());

        let fired = queue.pop_due(ms(150)).unwrap();
        assert_eq!(fired.id, id);
        assert_eq!(fired.at, ms(150));
        assert_eq!(fired.event, "a");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_late_drain_reports_scheduled_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(ms(0), ms(10), ());
        let fired = queue.pop_due(ms(500)).unwrap();
        assert_eq!(fired.at, ms(10));
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(ms(0), ms(30), 3);
        queue.schedule_once(ms(0), ms(10), 1);
        queue.schedule_once(ms(0), ms(20), 2);

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_due(ms(100)))
            .map(|f| f.event)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_equal_deadlines_fire_in_schedule_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(ms(0), ms(10), "first");
        queue.schedule_once(ms(0), ms(10), "second");

        assert_eq!(queue.pop_due(ms(10)).unwrap().event, "first");
        assert_eq!(queue.pop_due(ms(10)).unwrap().event, "second");
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_once(ms(0), ms(10), ());

        assert!(queue.is_scheduled(id));
        assert!(queue.cancel(id));
        assert!(!queue.is_scheduled(id));
        assert!(!queue.cancel(id));
        assert!(queue.pop_due(ms(100)).is_none());
    }

    #[test]
    fn test_recurring_timer_rearms() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_every(ms(0), ms(8000), "tick");

        let first = queue.pop_due(ms(8000)).unwrap();
        assert_eq!(first.id, id);
        assert_eq!(first.at, ms(8000));
        assert!(queue.is_scheduled(id));
        assert_eq!(queue.next_deadline(), Some(ms(16000)));

        // Draining late catches up one period at a time
        assert_eq!(queue.pop_due(ms(25000)).unwrap().at, ms(16000));
        assert_eq!(queue.pop_due(ms(25000)).unwrap().at, ms(24000));
        assert!(queue.pop_due(ms(25000)).is_none());

        assert!(queue.cancel(id));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_period_is_raised() {
        let mut queue = TimerQueue::new();
        queue.schedule_every(ms(0), Duration::ZERO, ());
        assert_eq!(queue.next_deadline(), Some(ms(1)));
    }

    #[test]
    fn test_count_matching_and_clear() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(ms(0), ms(1), 1);
        queue.schedule_once(ms(0), ms(2), 2);
        queue.schedule_once(ms(0), ms(3), 1);

        assert_eq!(queue.count_matching(|e| *e == 1), 2);
        queue.clear();
        assert!(queue.is_empty());
    }
}
