//! Verify command implementation
//!
//! Re-runs the post-install checks against an already-provisioned machine
//! and prints the report. Checks only ever warn: the command exits 0 whether
//! or not they pass, matching the pipeline's contract that verification
//! never changes the exit status.

use std::path::PathBuf;

use crate::cli::{StrategyArg, VerifyArgs};
use crate::context::{InstallationContext, Principal};
use crate::error::Result;
use crate::installer::InstallStrategy;
use crate::lookup;
use crate::verify;

/// Run verify command
pub fn run(args: VerifyArgs, verbose: bool) -> Result<()> {
    let principal = Principal::lookup(&args.user)?;
    let ctx = InstallationContext {
        install_root: args
            .install_root
            .unwrap_or_else(|| PathBuf::from(format!("/opt/{}", args.product))),
        principal,
        repo: String::new(),
        product: args.product,
        arch_tag: String::new(),
        autostart: args.autostart,
        display: args.display,
        vt: args.vt,
        source_dir: PathBuf::from("."),
        verbose,
    };

    let strategy = match args.strategy {
        Some(StrategyArg::Package) => InstallStrategy::Package,
        Some(StrategyArg::Manual) => InstallStrategy::Manual,
        None => detect_strategy(&ctx),
    };
    if verbose {
        println!(
            "Verifying {} ({} strategy)",
            ctx.product,
            match strategy {
                InstallStrategy::Package => "package",
                InstallStrategy::Manual => "manual",
            }
        );
    }

    let report = verify::collect(&ctx, strategy);
    let endpoints = verify::Endpoints::discover();
    print!("{}", verify::render(&ctx, &report, &endpoints));
    Ok(())
}

/// Package strategy when the product command resolves on PATH, manual
/// otherwise; re-verification needs no memory of the original run.
fn detect_strategy(ctx: &InstallationContext) -> InstallStrategy {
    let path_var = std::env::var("PATH").unwrap_or_default();
    if lookup::resolve_on_path(&ctx.product, &path_var).is_some() {
        InstallStrategy::Package
    } else {
        InstallStrategy::Manual
    }
}
