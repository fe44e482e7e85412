use itertools::Itertools;

use crate::types::{Duration, PickTask, Time};
use crate::utils::prelude::*;

/// Distinct shipment days present in the data, ascending
pub fn recorded_days(tasks: &[PickTask]) -> Vec<u32> {
    tasks.iter().map(|t| t.day).sorted().dedup().collect()
}

/// Re-base recorded arrivals onto one continuous timeline.
///
/// Day `k` of `days` starts at `k * day_len`; days are concatenated
/// back-to-back with no overnight gap. A task's offset is clipped to the
/// day length. Arrivals at or past `horizon` are dropped, logged, and are
/// not an error. The sort is stable, so same-instant arrivals keep their
/// record order and will be spawned FIFO.
pub fn rebase(tasks: &[PickTask], days: &[u32], day_len: Duration, horizon: Duration) -> Vec<(Time, PickTask)> {
    let mut arrivals = Vec::new();
    let mut dropped = 0usize;
    for (idx, day) in days.iter().enumerate() {
        for task in tasks.iter().filter(|t| t.day == *day) {
            let offset = task.time_of_day.min(*day_len);
            let at = Time(idx as f64 * *day_len + offset);
            if at.0 >= *horizon {
                dropped += 1;
                debug!(task = %task, %at, "arrival past run horizon, dropped");
                continue;
            }
            arrivals.push((at, task.clone()));
        }
    }
    if dropped > 0 {
        warn!(dropped, "dropped arrivals beyond the run horizon");
    }
    arrivals.sort_by(|a, b| a.0.cmp(&b.0));
    arrivals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkuId;

    fn task(day: u32, time_of_day: f64) -> PickTask {
        PickTask {
            sku: SkuId::from("A"),
            quantity: 1,
            day,
            time_of_day: Duration(time_of_day),
            slot_distance: 1.0,
        }
    }

    #[test]
    fn days_concatenate_without_gaps() {
        let tasks = vec![task(20110901, 30.0), task(20110902, 15.0), task(20110901, 470.0)];
        let days = recorded_days(&tasks);
        assert_eq!(days, vec![20110901, 20110902]);

        let arrivals = rebase(&tasks, &days, Duration(480.0), Duration(960.0));
        let times: Vec<f64> = arrivals.iter().map(|(t, _)| t.0).collect();
        assert_eq!(times, vec![30.0, 470.0, 495.0]);
    }

    #[test]
    fn offsets_are_clipped_to_the_day() {
        let tasks = vec![task(1, 9999.0)];
        let arrivals = rebase(&tasks, &[1, 1], Duration(480.0), Duration(2000.0));
        let times: Vec<f64> = arrivals.iter().map(|(t, _)| t.0).collect();
        // clipped to the day end, then re-based per day index
        assert_eq!(times, vec![480.0, 960.0]);
    }

    #[test]
    fn arrivals_past_the_horizon_are_dropped() {
        let tasks = vec![task(1, 100.0), task(2, 100.0)];
        let arrivals = rebase(&tasks, &[1, 2], Duration(480.0), Duration(480.0));
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].0, Time(100.0));
    }

    #[test]
    fn same_instant_arrivals_keep_record_order() {
        let mut tasks: Vec<PickTask> = (0..5).map(|i| {
            let mut t = task(1, 50.0);
            t.quantity = i;
            t
        })
        .collect();
        tasks.push(task(1, 10.0));
        let arrivals = rebase(&tasks, &[1], Duration(480.0), Duration(480.0));
        assert_eq!(arrivals[0].0, Time(10.0));
        let quantities: Vec<u32> = arrivals[1..].iter().map(|(_, t)| t.quantity).collect();
        assert_eq!(quantities, vec![0, 1, 2, 3, 4]);
    }
}
