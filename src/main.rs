mod args;
mod tally;

use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    debug!("args: {:?}", args);

    let res = match (args.config.clone(), args.input.clone()) {
        (Some(config_path), _) => tally::run_survey(
            &config_path,
            args.reference.clone(),
            args.out.clone(),
            args.out_format.clone(),
        ),
        (None, Some(input)) => tally::run_survey_quick(&input, &args),
        (None, None) => {
            eprintln!("Either --config or --input must be provided. See --help.");
            std::process::exit(2);
        }
    };

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
