use std::fmt;

use serde::Serialize;
use statrs::statistics::Statistics as _;

use crate::config::ModelParams;

/// Raw per-replication observations. Owned exclusively by the run that
/// produced them; one entry is appended per completed pick, counters track
/// everything else.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Statistics {
    pub picks_attempted: u64,
    pub picks_completed: u64,
    pub stockout_events: u64,
    pub replenishments: u64,
    pub units_requested: u64,
    pub units_fulfilled: u64,
    /// queueing delay before a pool slot was granted, minutes
    pub wait_times: Vec<f64>,
    /// hands-on time per completed pick, minutes
    pub service_times: Vec<f64>,
    /// arrival to completion, including stock-wait and queueing, minutes
    pub flow_times: Vec<f64>,
    /// periodic samples of the pool wait-queue depth
    pub queue_depth: Vec<usize>,
    /// periodic samples of holders / capacity
    pub occupancy: Vec<f64>,
}

impl Statistics {
    /// picks that were still waiting on stock or a slot at the run bound
    pub fn abandoned(&self) -> u64 {
        self.picks_attempted - self.picks_completed
    }

    pub fn total_service(&self) -> f64 {
        self.service_times.iter().sum()
    }

    /// fraction of requested units fulfilled without shortage
    pub fn fill_rate(&self) -> f64 {
        if self.units_requested == 0 {
            1.0
        } else {
            self.units_fulfilled as f64 / self.units_requested as f64
        }
    }
}

fn mean_or_zero(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().mean()
    }
}

/// Derived metrics of one replication. Mean service time is this run's own
/// completed-pick sample mean; nothing is pre-sampled or shared across runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub replication: usize,
    pub pickers: usize,
    pub attempted: u64,
    pub completed: u64,
    pub abandoned: u64,
    pub stockouts: u64,
    pub replenishments: u64,
    pub fill_rate_pct: f64,
    pub avg_wait: f64,
    pub avg_service: f64,
    pub avg_flow: f64,
    pub total_service: f64,
    /// total service time / (capacity x duration)
    pub utilization_pct: f64,
    /// mean of the monitor's occupancy samples
    pub monitored_utilization_pct: f64,
    pub throughput_per_hour: f64,
    /// completions / (effective pickers x hours)
    pub actual_lpmh: f64,
    /// 60 / mean service time, the per-picker rate at full utilization
    pub theoretical_lpmh: f64,
    /// capacity x duration / mean service time
    pub theoretical_capacity: f64,
}

impl RunReport {
    pub fn new(scenario: impl fmt::Display, replication: usize, stats: &Statistics, params: &ModelParams) -> Self {
        let duration = *params.duration;
        let hours = duration / 60.0;
        let effective = params.pickers as f64 * params.effective_fraction;
        let avg_service = mean_or_zero(&stats.service_times);
        let total_service = stats.total_service();
        let completed = stats.picks_completed as f64;

        Self {
            scenario: scenario.to_string(),
            replication,
            pickers: params.pickers,
            attempted: stats.picks_attempted,
            completed: stats.picks_completed,
            abandoned: stats.abandoned(),
            stockouts: stats.stockout_events,
            replenishments: stats.replenishments,
            fill_rate_pct: 100.0 * stats.fill_rate(),
            avg_wait: mean_or_zero(&stats.wait_times),
            avg_service,
            avg_flow: mean_or_zero(&stats.flow_times),
            total_service,
            utilization_pct: 100.0 * total_service / (params.pickers as f64 * duration),
            monitored_utilization_pct: 100.0 * mean_or_zero(&stats.occupancy),
            throughput_per_hour: completed / hours,
            actual_lpmh: completed / (effective * hours),
            theoretical_lpmh: if avg_service > 0.0 { 60.0 / avg_service } else { 0.0 },
            theoretical_capacity: if avg_service > 0.0 {
                params.pickers as f64 * duration / avg_service
            } else {
                0.0
            },
        }
    }
}

/// Sample mean and corrected standard deviation over replications
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std_dev: f64,
}

impl MeanStd {
    fn over(xs: Vec<f64>) -> Self {
        match xs.len() {
            0 => Self { mean: 0.0, std_dev: 0.0 },
            1 => Self {
                mean: xs[0],
                std_dev: 0.0,
            },
            _ => Self {
                mean: xs.iter().mean(),
                std_dev: xs.iter().std_dev(),
            },
        }
    }
}

impl fmt::Display for MeanStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ± {:.2}", self.mean, self.std_dev)
    }
}

/// Mean ± std of every metric over a scenario's replications
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub scenario: String,
    pub pickers: usize,
    pub replications: usize,
    pub completed: MeanStd,
    pub stockouts: MeanStd,
    pub fill_rate_pct: MeanStd,
    pub avg_wait: MeanStd,
    pub avg_service: MeanStd,
    pub avg_flow: MeanStd,
    pub utilization_pct: MeanStd,
    pub monitored_utilization_pct: MeanStd,
    pub throughput_per_hour: MeanStd,
    pub actual_lpmh: MeanStd,
    pub theoretical_lpmh: MeanStd,
    pub theoretical_capacity: MeanStd,
}

impl Aggregate {
    pub fn over(reports: &[RunReport]) -> Self {
        let metric = |sel: fn(&RunReport) -> f64| MeanStd::over(reports.iter().map(sel).collect());
        Self {
            scenario: reports.first().map(|r| r.scenario.clone()).unwrap_or_default(),
            pickers: reports.first().map(|r| r.pickers).unwrap_or_default(),
            replications: reports.len(),
            completed: metric(|r| r.completed as f64),
            stockouts: metric(|r| r.stockouts as f64),
            fill_rate_pct: metric(|r| r.fill_rate_pct),
            avg_wait: metric(|r| r.avg_wait),
            avg_service: metric(|r| r.avg_service),
            avg_flow: metric(|r| r.avg_flow),
            utilization_pct: metric(|r| r.utilization_pct),
            monitored_utilization_pct: metric(|r| r.monitored_utilization_pct),
            throughput_per_hour: metric(|r| r.throughput_per_hour),
            actual_lpmh: metric(|r| r.actual_lpmh),
            theoretical_lpmh: metric(|r| r.theoretical_lpmh),
            theoretical_capacity: metric(|r| r.theoretical_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::{ScenarioKind, SimConfig};

    fn params(pickers: usize, shift: f64) -> ModelParams {
        SimConfig {
            pickers,
            shift_minutes: shift,
            ..SimConfig::default()
        }
        .model_params(ScenarioKind::Random)
        .unwrap()
    }

    #[test]
    fn counters_stay_consistent() {
        let stats = Statistics {
            picks_attempted: 10,
            picks_completed: 7,
            ..Statistics::default()
        };
        assert_eq!(stats.abandoned(), 3);
        assert!(stats.picks_completed <= stats.picks_attempted);
    }

    #[test]
    fn utilization_matches_the_formula() {
        let stats = Statistics {
            picks_attempted: 4,
            picks_completed: 4,
            service_times: vec![2.0, 3.0, 4.0, 5.0],
            ..Statistics::default()
        };
        let report = RunReport::new("test", 0, &stats, &params(2, 100.0));
        // completed x mean service == total service when every pick records once
        let mean_service = stats.service_times.iter().sum::<f64>() / 4.0;
        assert_relative_eq!(
            report.utilization_pct,
            100.0 * (4.0 * mean_service) / (2.0 * 100.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn empty_run_produces_finite_metrics() {
        let report = RunReport::new("test", 0, &Statistics::default(), &params(5, 480.0));
        assert_eq!(report.completed, 0);
        assert_eq!(report.avg_service, 0.0);
        assert_eq!(report.theoretical_lpmh, 0.0);
        assert_eq!(report.fill_rate_pct, 100.0);
        assert!(report.utilization_pct == 0.0);
    }

    #[test]
    fn aggregate_mean_and_std() {
        let stats = Statistics::default();
        let p = params(5, 480.0);
        let mut a = RunReport::new("test", 0, &stats, &p);
        let mut b = RunReport::new("test", 1, &stats, &p);
        a.avg_service = 2.0;
        b.avg_service = 4.0;
        let agg = Aggregate::over(&[a, b]);
        assert_relative_eq!(agg.avg_service.mean, 3.0);
        assert_relative_eq!(agg.avg_service.std_dev, std::f64::consts::SQRT_2, epsilon = 1e-12);
        assert_eq!(agg.replications, 2);
    }

    #[test]
    fn single_replication_has_zero_std() {
        let agg = Aggregate::over(&[RunReport::new(
            "test",
            0,
            &Statistics::default(),
            &params(5, 480.0),
        )]);
        assert_eq!(agg.avg_service.std_dev, 0.0);
    }
}
