use crate::config::{AppConfigExt, ScenarioKind, SimConfig};
use crate::stats::Aggregate;
use crate::types::{PickTask, SkuParams};
use crate::utils::prelude::*;

pub mod config;
pub mod data;
pub mod incoming;
pub mod output;
pub mod randvars;
pub mod replication;
pub mod sim;
pub mod stats;
pub mod types;
pub mod utils;

fn load_inputs() -> Result<(SimConfig, Vec<PickTask>, Vec<SkuParams>)> {
    let (sim_cfg, data_cfg, cabinets) = {
        let cfg = config();
        (cfg.sim()?, cfg.data()?, cfg.cabinets()?)
    };
    sim_cfg.validate()?;
    let tasks = data::load_pick_tasks(&data_cfg.pick_lines, &cabinets)?;
    let skus = data::load_sku_params(&data_cfg.sku_params)?;
    Ok((sim_cfg, tasks, skus))
}

/// Run the configured (or given) scenario end-to-end and write its outputs
pub fn run_sim(kind: Option<ScenarioKind>) -> Result<()> {
    let _g = info_span!("sim").entered();

    let (sim_cfg, tasks, skus) = load_inputs()?;
    let kind = kind.unwrap_or(sim_cfg.scenario);
    let runs = replication::run_scenario(&sim_cfg, kind, &tasks, &skus)?;
    let agg = Aggregate::over(&replication::reports(&runs));
    output::render_aggregate(&agg);

    let out = config().output_dir()?;
    output::write_reports_csv(&out.file("replications.csv")?, &runs)?;
    output::write_timings_csv(&out.file("timings.csv")?, &runs)?;
    output::write_summary_json(&out.file("summary.json")?, std::slice::from_ref(&agg))?;

    Ok(())
}

/// Run both scenarios over the same pick data and report the improvement
pub fn run_compare() -> Result<()> {
    let _g = info_span!("compare").entered();

    let (sim_cfg, tasks, skus) = load_inputs()?;
    let before = replication::run_scenario(&sim_cfg, ScenarioKind::Random, &tasks, &skus)?;
    let after = replication::run_scenario(&sim_cfg, ScenarioKind::Slotted, &tasks, &skus)?;
    let agg_before = Aggregate::over(&replication::reports(&before));
    let agg_after = Aggregate::over(&replication::reports(&after));
    output::render_comparison(&agg_before, &agg_after);

    let out = config().output_dir()?;
    output::write_reports_csv(
        &out.file("comparison_replications.csv")?,
        before.iter().chain(after.iter()),
    )?;
    output::write_timings_csv(
        &out.file("comparison_timings.csv")?,
        before.iter().chain(after.iter()),
    )?;
    output::write_summary_json(&out.file("comparison_summary.json")?, &[agg_before, agg_after])?;

    Ok(())
}

/// Sweep workforce sizes, running both scenarios at each point
pub fn run_sweep() -> Result<()> {
    let _g = info_span!("sweep").entered();

    let (sim_cfg, tasks, skus) = load_inputs()?;
    let sweep = config().sweep()?;
    let mut rows = Vec::with_capacity(sweep.pickers.len());
    for pickers in sweep.pickers {
        let cfg = SimConfig {
            pickers,
            ..sim_cfg.clone()
        };
        let before = replication::run_scenario(&cfg, ScenarioKind::Random, &tasks, &skus)?;
        let after = replication::run_scenario(&cfg, ScenarioKind::Slotted, &tasks, &skus)?;
        rows.push(output::SweepRow::new(
            pickers,
            &Aggregate::over(&replication::reports(&before)),
            &Aggregate::over(&replication::reports(&after)),
        ));
    }
    output::render_sweep(&rows);

    let out = config().output_dir()?;
    output::write_sweep_csv(&out.file("sweep.csv")?, &rows)?;

    Ok(())
}
