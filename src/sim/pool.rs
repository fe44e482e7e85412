use std::collections::VecDeque;

use super::ProcessId;

/// The bounded picker workforce. Mutual exclusion with a FIFO wait queue:
/// the longest-waiting requester always gets the next freed slot, no
/// priorities, no preemption of current holders.
#[derive(Debug)]
pub struct PickerPool {
    capacity: usize,
    in_use: usize,
    waiters: VecDeque<ProcessId>,
}

impl PickerPool {
    pub fn new(capacity: usize) -> Self {
        // capacity > 0 is enforced by config validation before any run
        Self {
            capacity,
            in_use: 0,
            waiters: VecDeque::new(),
        }
    }

    /// Grant a slot immediately when one is free, otherwise queue the
    /// caller. Returns whether the caller holds a slot now.
    pub(crate) fn acquire(&mut self, pid: ProcessId) -> bool {
        if self.in_use < self.capacity {
            self.in_use += 1;
            true
        } else {
            self.waiters.push_back(pid);
            false
        }
    }

    /// Free one slot. When someone is waiting the slot transfers straight
    /// to the head of the queue and is never observable as free, so late
    /// arrivals cannot overtake queued waiters.
    pub(crate) fn release(&mut self) -> Option<ProcessId> {
        debug_assert!(self.in_use > 0, "release without a holder");
        match self.waiters.pop_front() {
            granted @ Some(_) => granted,
            None => {
                self.in_use -= 1;
                None
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn holders(&self) -> usize {
        self.in_use
    }

    pub fn queue_depth(&self) -> usize {
        self.waiters.len()
    }

    pub fn occupancy(&self) -> f64 {
        self.in_use as f64 / self.capacity as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: usize) -> ProcessId {
        ProcessId(n)
    }

    #[test]
    fn grants_up_to_capacity_then_queues() {
        let mut pool = PickerPool::new(2);
        assert!(pool.acquire(pid(0)));
        assert!(pool.acquire(pid(1)));
        assert!(!pool.acquire(pid(2)));
        assert!(!pool.acquire(pid(3)));
        assert_eq!(pool.holders(), 2);
        assert_eq!(pool.queue_depth(), 2);
    }

    #[test]
    fn holders_never_exceed_capacity() {
        let mut pool = PickerPool::new(3);
        for n in 0..10 {
            pool.acquire(pid(n));
            assert!(pool.holders() <= pool.capacity());
        }
        for _ in 0..10 {
            pool.release();
            assert!(pool.holders() <= pool.capacity());
        }
    }

    #[test]
    fn releases_grant_waiters_fifo() {
        let mut pool = PickerPool::new(1);
        assert!(pool.acquire(pid(0)));
        assert!(!pool.acquire(pid(1)));
        assert!(!pool.acquire(pid(2)));
        assert!(!pool.acquire(pid(3)));
        assert_eq!(pool.release(), Some(pid(1)));
        assert_eq!(pool.release(), Some(pid(2)));
        assert_eq!(pool.release(), Some(pid(3)));
        // queue drained, the slot finally frees up
        assert_eq!(pool.release(), None);
        assert_eq!(pool.holders(), 0);
    }

    #[test]
    fn transferred_slot_is_not_stealable() {
        let mut pool = PickerPool::new(1);
        assert!(pool.acquire(pid(0)));
        assert!(!pool.acquire(pid(1)));
        // holder releases: slot goes to pid 1, pool still full
        assert_eq!(pool.release(), Some(pid(1)));
        assert_eq!(pool.holders(), 1);
        assert!(!pool.acquire(pid(2)));
    }

    #[test]
    fn occupancy_tracks_holders() {
        let mut pool = PickerPool::new(4);
        assert_eq!(pool.occupancy(), 0.0);
        pool.acquire(pid(0));
        pool.acquire(pid(1));
        assert_eq!(pool.occupancy(), 0.5);
    }
}
