//! kioskctl - kiosk host provisioning orchestrator
//!
//! A one-shot command line tool that turns a bare Linux machine into a
//! kiosk host running a long-lived GUI application: release resolution,
//! package or manual installation, session and auto-start integration,
//! privileged-port capability grant, and a final verification report.

use clap::Parser;

mod arch;
mod caps;
mod cli;
mod commands;
mod common;
mod context;
mod error;
mod exec;
mod fetch;
mod installer;
mod integrate;
mod lookup;
mod progress;
mod release;
mod temp;
mod verify;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Provision(args) => commands::provision::run(args, cli.verbose),
        Commands::Verify(args) => commands::verify::run(args, cli.verbose),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
