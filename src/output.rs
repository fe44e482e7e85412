use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::replication::ScenarioRun;
use crate::stats::Aggregate;
use crate::utils::prelude::*;

/// Per-replication derived metrics, one row each
pub fn write_reports_csv<'a>(path: &Path, runs: impl IntoIterator<Item = &'a ScenarioRun>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut n = 0usize;
    for run in runs {
        writer.serialize(&run.report)?;
        n += 1;
    }
    writer.flush()?;
    info!(n, path = %path.display(), "wrote replication reports");
    Ok(())
}

#[derive(Serialize)]
struct SequenceRow<'a> {
    scenario: &'a str,
    replication: usize,
    metric: &'static str,
    value: f64,
}

/// Raw observation sequences in long format, for external histogramming
pub fn write_timings_csv<'a>(path: &Path, runs: impl IntoIterator<Item = &'a ScenarioRun>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for run in runs {
        let sequences: [(&'static str, &[f64]); 4] = [
            ("wait", &run.stats.wait_times),
            ("service", &run.stats.service_times),
            ("flow", &run.stats.flow_times),
            ("occupancy", &run.stats.occupancy),
        ];
        for (metric, values) in sequences {
            for value in values {
                writer.serialize(SequenceRow {
                    scenario: &run.report.scenario,
                    replication: run.report.replication,
                    metric,
                    value: *value,
                })?;
            }
        }
        for depth in &run.stats.queue_depth {
            writer.serialize(SequenceRow {
                scenario: &run.report.scenario,
                replication: run.report.replication,
                metric: "queue_depth",
                value: *depth as f64,
            })?;
        }
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote raw timing sequences");
    Ok(())
}

pub fn write_summary_json(path: &Path, aggregates: &[Aggregate]) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, aggregates)?;
    info!(path = %path.display(), "wrote summary");
    Ok(())
}

pub fn render_aggregate(agg: &Aggregate) {
    println!();
    println!(
        "=== {} ({} pickers, {} replications, mean ± std) ===",
        agg.scenario, agg.pickers, agg.replications
    );
    println!("{:<28} {}", "Picks completed", agg.completed);
    println!("{:<28} {}", "Stockout events", agg.stockouts);
    println!("{:<28} {}", "Fill rate (%)", agg.fill_rate_pct);
    println!("{:<28} {}", "Avg wait (min)", agg.avg_wait);
    println!("{:<28} {}", "Avg service (min)", agg.avg_service);
    println!("{:<28} {}", "Avg flow (min)", agg.avg_flow);
    println!("{:<28} {}", "Utilization (%)", agg.utilization_pct);
    println!("{:<28} {}", "Throughput (picks/h)", agg.throughput_per_hour);
    println!("{:<28} {}", "Actual LPMH", agg.actual_lpmh);
    println!("{:<28} {}", "Theoretical LPMH", agg.theoretical_lpmh);
    println!("{:<28} {}", "Theoretical capacity", agg.theoretical_capacity);
}

pub fn render_comparison(before: &Aggregate, after: &Aggregate) {
    let service_reduction = if before.avg_service.mean > 0.0 {
        (1.0 - after.avg_service.mean / before.avg_service.mean) * 100.0
    } else {
        0.0
    };
    let capacity_gain = if before.theoretical_capacity.mean > 0.0 {
        (after.theoretical_capacity.mean / before.theoretical_capacity.mean - 1.0) * 100.0
    } else {
        0.0
    };

    println!();
    println!("{:<28} {:>18} {:>18} {:>14}", "Metric", before.scenario, after.scenario, "Change");
    println!("{}", "-".repeat(80));
    let row = |name: &str, b: f64, a: f64, change: String| {
        println!("{:<28} {:>18.2} {:>18.2} {:>14}", name, b, a, change);
    };
    row(
        "Avg service (min)",
        before.avg_service.mean,
        after.avg_service.mean,
        format!("{:.1}% faster", service_reduction),
    );
    row(
        "Utilization (%)",
        before.utilization_pct.mean,
        after.utilization_pct.mean,
        format!("{:+.1}", after.utilization_pct.mean - before.utilization_pct.mean),
    );
    row(
        "Actual LPMH",
        before.actual_lpmh.mean,
        after.actual_lpmh.mean,
        String::new(),
    );
    row(
        "Theoretical LPMH",
        before.theoretical_lpmh.mean,
        after.theoretical_lpmh.mean,
        format!("{:+.1}%", capacity_gain),
    );
    row(
        "Theoretical capacity",
        before.theoretical_capacity.mean,
        after.theoretical_capacity.mean,
        format!("{:+.1}%", capacity_gain),
    );
    row(
        "Fill rate (%)",
        before.fill_rate_pct.mean,
        after.fill_rate_pct.mean,
        String::new(),
    );
}

/// One sweep point: both scenarios at the same workforce size
#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub pickers: usize,
    pub before_utilization_pct: f64,
    pub after_utilization_pct: f64,
    pub before_actual_lpmh: f64,
    pub after_actual_lpmh: f64,
    pub before_capacity: f64,
    pub after_capacity: f64,
    pub capacity_gain_pct: f64,
}

impl SweepRow {
    pub fn new(pickers: usize, before: &Aggregate, after: &Aggregate) -> Self {
        let capacity_gain_pct = if before.theoretical_capacity.mean > 0.0 {
            (after.theoretical_capacity.mean / before.theoretical_capacity.mean - 1.0) * 100.0
        } else {
            0.0
        };
        Self {
            pickers,
            before_utilization_pct: before.utilization_pct.mean,
            after_utilization_pct: after.utilization_pct.mean,
            before_actual_lpmh: before.actual_lpmh.mean,
            after_actual_lpmh: after.actual_lpmh.mean,
            before_capacity: before.theoretical_capacity.mean,
            after_capacity: after.theoretical_capacity.mean,
            capacity_gain_pct,
        }
    }
}

pub fn render_sweep(rows: &[SweepRow]) {
    println!();
    println!(
        "{:<10} {:>14} {:>14} {:>14} {:>14} {:>15}",
        "Pickers", "Before Util%", "After Util%", "Before LPMH", "After LPMH", "Capacity Gain"
    );
    println!("{}", "-".repeat(85));
    for r in rows {
        println!(
            "{:<10} {:>14.1} {:>14.1} {:>14.2} {:>14.2} {:>+14.0}%",
            r.pickers,
            r.before_utilization_pct,
            r.after_utilization_pct,
            r.before_actual_lpmh,
            r.after_actual_lpmh,
            r.capacity_gain_pct
        );
    }
}

pub fn write_sweep_csv(path: &Path, rows: &[SweepRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(n = rows.len(), path = %path.display(), "wrote sweep results");
    Ok(())
}
