use crate::config::ScenarioParams;
use crate::randvars::Sampler;
use crate::types::{Duration, PickTask, Time};
use crate::utils::prelude::*;

use super::inventory::Fulfillment;
use super::{Ctx, Process, Step};

#[derive(Debug, Clone, Copy, PartialEq)]
enum PickState {
    /// first resume, at the task's arrival instant
    Arrive,
    /// stocked out, polling the ledger on the retry interval
    AwaitStock,
    /// parked in the pool's wait queue
    AwaitSlot,
    /// holding a slot for the service duration
    Service,
}

/// One order line working its way through the pick area.
///
/// Both policy variants share this state machine; the scenario parameters
/// decide how walking and searching are drawn and whether the ledger is
/// consulted at all.
#[derive(Debug)]
pub struct PickProcess {
    task: PickTask,
    state: PickState,
    arrival: Time,
    /// stock resolved, ready to queue for a picker
    ready_at: Time,
    service: Duration,
    granted: u32,
    shorted: bool,
}

impl PickProcess {
    pub fn new(task: PickTask) -> Self {
        Self {
            task,
            state: PickState::Arrive,
            arrival: Time(0.0),
            ready_at: Time(0.0),
            service: Duration(0.0),
            granted: 0,
            shorted: false,
        }
    }

    fn negotiate_stock(&mut self, ctx: &mut Ctx<'_>) -> Step {
        let requested = self.task.quantity;
        let outcome = match ctx.inventory() {
            Some(ledger) => ledger.check_and_pick(&self.task.sku, requested),
            // baseline scenario: unlimited virtual stock
            None => Fulfillment::Untracked,
        };
        self.granted = match outcome {
            Fulfillment::Untracked | Fulfillment::Full => requested,
            Fulfillment::Partial(granted) => {
                self.record_shortage(ctx);
                granted
            }
            Fulfillment::Empty => {
                self.record_shortage(ctx);
                self.state = PickState::AwaitStock;
                return Step::Timeout(ctx.params().retry);
            }
        };
        ctx.stats().units_fulfilled += u64::from(self.granted);

        self.service = self.draw_service_time(ctx);
        self.ready_at = ctx.now();
        if ctx.acquire_picker() {
            self.begin_service(ctx)
        } else {
            self.state = PickState::AwaitSlot;
            Step::Wait
        }
    }

    // one stockout event per pick that experienced any shortage
    fn record_shortage(&mut self, ctx: &mut Ctx<'_>) {
        if !self.shorted {
            self.shorted = true;
            ctx.stats().stockout_events += 1;
            debug!(task = %self.task, now = %ctx.now(), "stocked out");
        }
    }

    /// walk + search + check&pick + per-box handling + scan, drawn in the
    /// same order for every pick so a fixed seed reproduces the run
    fn draw_service_time(&mut self, ctx: &mut Ctx<'_>) -> Duration {
        let p = ctx.params();
        let walk_speed = p.walk_speed;
        let pieces_per_box = p.pieces_per_box;
        let (check_pick, per_box, scan) = (p.check_pick, p.per_box, p.scan);
        let (walk, search) = match p.scenario {
            ScenarioParams::Random {
                walk_distance,
                search_time,
            } => (walk_distance, search_time),
            ScenarioParams::Slotted { variation } => (
                Sampler::around(self.task.slot_distance, variation),
                // slot location is known, no searching
                Sampler::Point(0.0),
            ),
        };

        let walk_distance = ctx.draw(walk);
        let walk_time = 2.0 * walk_distance / walk_speed; // round trip
        let search_time = ctx.draw(search);
        let boxes = (f64::from(self.task.quantity) / f64::from(pieces_per_box)).ceil();
        let pick_time = ctx.draw(check_pick) + ctx.draw(per_box) * boxes + ctx.draw(scan);
        Duration(walk_time + search_time + pick_time)
    }

    fn begin_service(&mut self, ctx: &mut Ctx<'_>) -> Step {
        let wait = ctx.now() - self.ready_at;
        ctx.stats().wait_times.push(*wait);
        self.state = PickState::Service;
        Step::Timeout(self.service)
    }

    fn finish(&mut self, ctx: &mut Ctx<'_>) -> Step {
        ctx.release_picker();
        let flow = ctx.now() - self.arrival;
        let stats = ctx.stats();
        stats.service_times.push(*self.service);
        stats.flow_times.push(*flow);
        stats.picks_completed += 1;
        trace!(task = %self.task, now = %ctx.now(), "pick completed");
        Step::Complete
    }
}

impl Process for PickProcess {
    fn resume(&mut self, ctx: &mut Ctx<'_>) -> Step {
        match self.state {
            PickState::Arrive => {
                self.arrival = ctx.now();
                let stats = ctx.stats();
                stats.picks_attempted += 1;
                stats.units_requested += u64::from(self.task.quantity);
                self.negotiate_stock(ctx)
            }
            PickState::AwaitStock => self.negotiate_stock(ctx),
            PickState::AwaitSlot => self.begin_service(ctx),
            PickState::Service => self.finish(ctx),
        }
    }

    fn label(&self) -> &'static str {
        "pick"
    }
}

/// Periodic batch restocker. Scans the ledger every period and refills
/// every SKU at or below its reorder point; the stochastic restock cost is
/// charged against the clock and delays the next scan, but never holds a
/// picker slot.
#[derive(Debug, Default)]
pub struct Replenisher;

impl Process for Replenisher {
    fn resume(&mut self, ctx: &mut Ctx<'_>) -> Step {
        let restocked = match ctx.inventory() {
            Some(ledger) => ledger.restock_below_reorder(),
            None => Vec::new(),
        };
        let period = ctx.params().replenish_every;
        let restock = ctx.params().restock;
        let mut cost = Duration(0.0);
        for _ in &restocked {
            cost = cost + Duration(ctx.draw(restock));
        }
        if !restocked.is_empty() {
            ctx.stats().replenishments += restocked.len() as u64;
            debug!(
                n = restocked.len(),
                cost = %cost,
                now = %ctx.now(),
                "restocked SKUs at or below reorder point"
            );
        }
        Step::Timeout(period + cost)
    }

    fn label(&self) -> &'static str {
        "replenisher"
    }
}

/// Samples wait-queue depth and pool occupancy on a fixed interval
#[derive(Debug, Default)]
pub struct Monitor;

impl Process for Monitor {
    fn resume(&mut self, ctx: &mut Ctx<'_>) -> Step {
        let depth = ctx.pool().queue_depth();
        let occupancy = ctx.pool().occupancy();
        let every = ctx.params().monitor_every;
        let stats = ctx.stats();
        stats.queue_depth.push(depth);
        stats.occupancy.push(occupancy);
        Step::Timeout(every)
    }

    fn label(&self) -> &'static str {
        "monitor"
    }
}
