use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashSet},
};

use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Scheduled<T> {
    due: Millis,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the earliest task first,
        // ties broken by scheduling order.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single threaded timer queue. Tasks only run when the owner asks for
/// what is due, so nothing fires behind its back.
pub struct Scheduler<T> {
    queue: BinaryHeap<Scheduled<T>>,
    live: HashSet<u64>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            live: HashSet::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Millis, task: T) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { due, seq, task });
        self.live.insert(seq);
        TaskHandle(seq)
    }

    /// Returns false when the task already ran or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.live.remove(&handle.0)
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.live.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.live.contains(&handle.0)
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Pops the earliest task due at or before `now`, with its due time.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, T)> {
        self.drop_cancelled();
        if self.queue.peek()?.due > now {
            return None;
        }
        let scheduled = self.queue.pop()?;
        self.live.remove(&scheduled.seq);
        Some((scheduled.due, scheduled.task))
    }

    pub fn next_due(&mut self) -> Option<Millis> {
        self.drop_cancelled();
        self.queue.peek().map(|s| s.due)
    }

    fn drop_cancelled(&mut self) {
        while let Some(head) = self.queue.peek() {
            if self.live.contains(&head.seq) {
                break;
            }
            self.queue.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(300, "c");
        scheduler.schedule(100, "a");
        scheduler.schedule(200, "b");
        scheduler.schedule(100, "a2");

        assert_eq!(scheduler.pop_due(50), None);
        assert_eq!(scheduler.pop_due(250), Some((100, "a")));
        assert_eq!(scheduler.pop_due(250), Some((100, "a2")));
        assert_eq!(scheduler.pop_due(250), Some((200, "b")));
        assert_eq!(scheduler.pop_due(250), None);
        assert_eq!(scheduler.next_due(), Some(300));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_cancelled_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule(10, 1);
        let second = scheduler.schedule(20, 2);
        assert!(scheduler.cancel(first));
        assert!(!scheduler.cancel(first));
        assert!(!scheduler.is_pending(first));
        assert!(scheduler.is_pending(second));
        assert_eq!(scheduler.next_due(), Some(20));
        assert_eq!(scheduler.pop_due(100), Some((20, 2)));
        assert!(!scheduler.cancel(second));
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(10, ());
        scheduler.schedule(20, ());
        scheduler.cancel_all();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.pop_due(u64::MAX), None);
        assert!(!scheduler.cancel(handle));
    }
}
