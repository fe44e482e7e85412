use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use picksim::utils::{app_config, logging};
use picksim::utils::prelude::*;

use crate::commands::{self, Cmd};

#[derive(StructOpt)]
#[structopt(
    name = "picksim",
    about = "Warehouse order picking simulator",
    setting = AppSettings::VersionlessSubcommands
)]
pub struct Opts {
    /// Set a custom config file
    #[structopt(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Apply a named preset from the config
    #[structopt(short, long, value_name = "NAME")]
    preset: Option<String>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Run one scenario
    Run(commands::Run),
    /// Run both scenarios over the same data and compare
    Compare(commands::Compare),
    /// Sweep workforce sizes for both scenarios
    Sweep(commands::Sweep),
    /// Show the merged configuration
    Config(commands::Config),
}

/// Match commands
pub fn execute() -> Result<()> {
    let opts = Opts::from_args();

    // initialize configuration, then layer file and preset on top
    app_config::init()?;
    {
        let mut cfg = app_config::config_mut();
        if let Some(path) = &opts.config {
            cfg.use_file(path)?;
        }
        if let Some(name) = &opts.preset {
            cfg.use_preset(name)?;
        }
    }

    // logging reads the merged config, so it comes up last
    let _guards = logging::setup()?;
    trace!("start cli execution");

    match opts.command {
        Command::Run(cmd) => cmd.run(),
        Command::Compare(cmd) => cmd.run(),
        Command::Sweep(cmd) => cmd.run(),
        Command::Config(cmd) => cmd.run(),
    }
}
