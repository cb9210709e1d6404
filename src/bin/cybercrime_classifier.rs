//! cybercrime-classifier CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use cybercrime_classifier::cli::args::*;
use cybercrime_classifier::cli::commands::*;

fn main() {
    // Parse command line arguments using clap
    let args = ClassifierArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Info,  // Default
        2 => LevelFilter::Debug, // Verbose
        _ => LevelFilter::Trace, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.thread_count())
        .build_global()
    {
        log::warn!("Could not configure the worker pool: {e}");
    }

    // Execute the command
    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
