use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use educe::Educe;
use rand_seeder::SipRng;

use crate::config::ModelParams;
use crate::randvars::Sampler;
use crate::stats::Statistics;
use crate::types::{Duration, Time};
use crate::utils::prelude::*;

pub mod inventory;
pub mod pool;
pub mod processes;

use inventory::Inventory;
use pool::PickerPool;

/// Handle of a process registered with the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(usize);

/// A scheduled resumption of one process.
///
/// Ordered by due time, ties broken by the global insertion counter so that
/// simultaneous events fire in the order they were scheduled. This ordering
/// decides which of two simultaneously-ready processes gets a pool slot
/// first, so it is load-bearing, not cosmetic.
#[derive(Debug, Clone, Copy, Educe)]
#[educe(PartialEq, Eq, PartialOrd, Ord)]
pub struct Event {
    time: Time,
    seq: u64,
    #[educe(PartialEq(ignore))]
    #[educe(PartialOrd(ignore))]
    #[educe(Ord(ignore))]
    pid: ProcessId,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} -> #{}", self.time, self.pid.0)
    }
}

/// The logical clock and the future event queue
#[derive(Debug, Default)]
pub struct Clock {
    now: Time,
    seq: u64,
    future: BinaryHeap<Reverse<Event>>,
}

impl Clock {
    pub fn now(&self) -> Time {
        self.now
    }

    fn schedule_at(&mut self, time: Time, pid: ProcessId) {
        debug_assert!(time >= self.now, "scheduling into the past");
        self.seq += 1;
        let event = Event {
            time,
            seq: self.seq,
            pid,
        };
        trace!(%event, "push event");
        self.future.push(Reverse(event));
    }

    fn schedule_in(&mut self, delay: Duration, pid: ProcessId) {
        self.schedule_at(self.now + delay, pid);
    }

    /// Pop the next event strictly before `until`, advancing the clock to
    /// its due time. When the head event is at or past the bound the clock
    /// pins to the bound and the event never fires; a process suspended
    /// there is abandoned and its effects are discarded.
    fn pop_due(&mut self, until: Time) -> Option<Event> {
        let due = self.future.peek().map(|Reverse(head)| head.time)?;
        if due < until {
            let Reverse(event) = self.future.pop().unwrap();
            self.now = event.time;
            Some(event)
        } else {
            self.now = until;
            None
        }
    }
}

/// What a process does next, decided at every resume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// suspend for a timed delay
    Timeout(Duration),
    /// parked until another process hands over a pool slot
    Wait,
    /// finished, never resumed again
    Complete,
}

/// A cooperatively scheduled process. `resume` runs without preemption
/// until it returns the next suspension point; shared state mutation never
/// straddles a suspension, which is what makes check-and-pick atomic.
pub trait Process {
    fn resume(&mut self, ctx: &mut Ctx<'_>) -> Step;

    /// short label for logging
    fn label(&self) -> &'static str {
        "process"
    }
}

/// Shared per-replication state: everything a process may touch while it is
/// the one process running.
struct World {
    clock: Clock,
    params: ModelParams,
    pool: PickerPool,
    inventory: Option<Inventory>,
    stats: Statistics,
    rng: SipRng,
}

/// The view a process gets of the world while resumed
pub struct Ctx<'a> {
    pid: ProcessId,
    world: &'a mut World,
}

impl Ctx<'_> {
    pub fn now(&self) -> Time {
        self.world.clock.now()
    }

    pub fn params(&self) -> &ModelParams {
        &self.world.params
    }

    pub fn stats(&mut self) -> &mut Statistics {
        &mut self.world.stats
    }

    pub fn inventory(&mut self) -> Option<&mut Inventory> {
        self.world.inventory.as_mut()
    }

    pub fn pool(&self) -> &PickerPool {
        &self.world.pool
    }

    pub fn draw(&mut self, sampler: Sampler) -> f64 {
        sampler.sample(&mut self.world.rng)
    }

    /// Try to take a picker. On success the caller holds a slot and must
    /// release it; otherwise the caller is queued FIFO and must return
    /// `Step::Wait`, to be resumed when a slot is handed over.
    pub fn acquire_picker(&mut self) -> bool {
        self.world.pool.acquire(self.pid)
    }

    /// Give the held slot back. If anyone is waiting, the slot transfers to
    /// the head waiter, which is woken at the current instant.
    pub fn release_picker(&mut self) {
        if let Some(next) = self.world.pool.release() {
            let now = self.world.clock.now();
            self.world.clock.schedule_at(now, next);
        }
    }
}

/// One replication's simulation: the event loop plus every spawned process
pub struct Simulation {
    world: World,
    processes: Vec<Option<Box<dyn Process>>>,
}

impl Simulation {
    pub fn new(params: ModelParams, inventory: Option<Inventory>, rng: SipRng) -> Self {
        let pool = PickerPool::new(params.pickers);
        Self {
            world: World {
                clock: Clock::default(),
                params,
                pool,
                inventory,
                stats: Statistics::default(),
                rng,
            },
            processes: Vec::new(),
        }
    }

    pub fn spawn_at(&mut self, time: Time, process: Box<dyn Process>) -> ProcessId {
        let pid = ProcessId(self.processes.len());
        self.processes.push(Some(process));
        self.world.clock.schedule_at(time, pid);
        pid
    }

    /// Drive the event loop until the queue runs dry or the next event is
    /// at or past `until`.
    pub fn run(&mut self, until: Time) {
        while let Some(event) = self.world.clock.pop_due(until) {
            self.dispatch(event);
        }
        trace!(now = %self.world.clock.now(), "event loop finished");
    }

    fn dispatch(&mut self, event: Event) {
        let mut process = match self.processes.get_mut(event.pid.0).and_then(Option::take) {
            Some(p) => p,
            None => return,
        };
        let step = process.resume(&mut Ctx {
            pid: event.pid,
            world: &mut self.world,
        });
        trace!(%event, label = process.label(), ?step, "resumed");
        match step {
            Step::Timeout(delay) => {
                self.world.clock.schedule_in(delay, event.pid);
                self.processes[event.pid.0] = Some(process);
            }
            // parked in the pool's wait queue; release_picker wakes it
            Step::Wait => {
                self.processes[event.pid.0] = Some(process);
            }
            Step::Complete => {}
        }
    }

    pub fn now(&self) -> Time {
        self.world.clock.now()
    }

    pub fn stats(&self) -> &Statistics {
        &self.world.stats
    }

    pub fn inventory(&self) -> Option<&Inventory> {
        self.world.inventory.as_ref()
    }

    pub fn into_stats(self) -> Statistics {
        self.world.stats
    }
}
