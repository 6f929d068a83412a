//! EARL CLI: compiles and runs a single source file.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;
use tracing::{error, info};

#[derive(ClapParser)]
#[command(name = "earl")]
#[command(about = "EARL interpreter - compile and run .earl programs", long_about = None)]
struct Cli {
    /// Input .earl source file
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("earl=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("EARL: [DecodeError] could not read {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    info!("running {}", cli.input.display());

    match earl::run_source(&source) {
        Ok(value) => {
            info!("halted with {:?}", value);
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
