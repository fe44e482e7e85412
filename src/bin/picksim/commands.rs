use structopt::StructOpt;

use picksim::config::ScenarioKind;
use picksim::utils::prelude::*;

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

/// Run one scenario end-to-end
#[derive(StructOpt)]
pub struct Run {
    /// Scenario to run (Random or Slotted), overrides the configured one
    #[structopt(short, long)]
    scenario: Option<ScenarioKind>,
}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        picksim::run_sim(self.scenario)
    }
}

/// Compare random storage against the fixed pick area
#[derive(StructOpt)]
pub struct Compare {}

impl Cmd for Compare {
    fn run(self) -> Result<()> {
        picksim::run_compare()
    }
}

/// Sensitivity analysis over workforce sizes
#[derive(StructOpt)]
pub struct Sweep {}

impl Cmd for Sweep {
    fn run(self) -> Result<()> {
        picksim::run_sweep()
    }
}

/// Show the configuration after all layers are merged
#[derive(StructOpt)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let value: serde_yaml::Value = config().fetch()?;
        println!("{}", serde_yaml::to_string(&value)?);

        Ok(())
    }
}
