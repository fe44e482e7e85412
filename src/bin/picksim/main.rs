use picksim::utils;
use picksim::utils::prelude::*;

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    utils::panic::setup();

    // Match commands
    cli::execute()
}
