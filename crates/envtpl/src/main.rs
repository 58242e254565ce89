use std::process::ExitCode;

use clap::Parser;
use envtpl::{init_logging, run, Args, RunConfig};
use envtpl_render::env::{RealEnv, RealStdin};

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_logging(args.verbose) {
        eprintln!("envtpl: {:#}", err);
    }

    let config = RunConfig::from(args);
    match run(&config, RealEnv, &RealStdin) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("envtpl: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
