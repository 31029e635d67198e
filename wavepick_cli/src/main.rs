use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use wavepick_core::batch::BatchRunner;
use wavepick_core::configuration::Configuration;

use crate::cli::Cli;

mod cli;
mod logger;

fn main() -> Result<()> {
    let args = Cli::parse();
    logger::init_logger(args.log_level)?;

    let mut config = match &args.config_file {
        None => {
            info!("No config file provided, use --config-file to provide a custom config");
            Configuration::default()
        }
        Some(config_file) => {
            Configuration::from_json_file(config_file).context("could not load configuration")?
        }
    };
    args.apply(&mut config)?;
    info!("Using configuration: {config:?}");

    let solver = config.solver.build().context("could not create solver")?;
    let runner = BatchRunner::new(solver.as_ref(), config);
    let summary = runner
        .run(&args.input_dir, &args.output_dir, |outcome| {
            println!("{outcome}\n")
        })
        .with_context(|| format!("could not process {}", args.input_dir.display()))?;

    if summary.failed() > 0 {
        warn!("{} instance files could not be processed", summary.failed());
    }
    Ok(())
}
