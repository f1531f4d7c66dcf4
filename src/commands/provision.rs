//! Provision command implementation
//!
//! Runs the full pipeline, strictly sequentially:
//! 1. Preflight: require root, resolve the acting (non-root) identity
//! 2. Resolve the canonical architecture tag
//! 3. Resolve the latest release and its artifact for this architecture
//! 4. Fetch and validate the artifact and the install helper
//! 5. Install via the package or manual strategy
//! 6. Write the system-integration artifacts
//! 7. Grant the privileged-port capability (warning on failure)
//! 8. Verify and print the operator report
//!
//! Any fatal error before step 8 aborts the run with a non-zero exit; there
//! is no rollback; re-running the idempotent pipeline is the recovery
//! mechanism. Steps 7 and 8 only ever produce warnings.

use std::path::PathBuf;

use crate::arch;
use crate::caps;
use crate::cli::ProvisionArgs;
use crate::context::{self, InstallationContext, Principal};
use crate::error::Result;
use crate::fetch::{self, DownloadWorkspace};
use crate::installer;
use crate::integrate;
use crate::progress::StageProgress;
use crate::release;
use crate::verify;

/// Run provision command
pub fn run(args: ProvisionArgs, verbose: bool) -> Result<()> {
    context::ensure_root()?;
    let user = context::acting_user(args.user.as_deref())?;
    let principal = Principal::lookup(&user)?;

    let ctx = build_context(args, principal, verbose)?;
    if verbose {
        println!(
            "Provisioning {} for {} ({}) into {}",
            ctx.product,
            ctx.principal.name,
            ctx.arch_tag,
            ctx.install_root.display()
        );
    }

    let progress = StageProgress::new(if ctx.repo.is_empty() { 4 } else { 6 });
    let result = pipeline(&ctx, &progress);
    match result {
        Ok(()) => {
            progress.finish();
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            Err(e)
        }
    }
}

fn build_context(
    args: ProvisionArgs,
    principal: Principal,
    verbose: bool,
) -> Result<InstallationContext> {
    let repo = args.repo.unwrap_or_default();
    let product = match args.product {
        Some(product) => product,
        // Required-unless-present guarantees a repo slug here
        None => repo.rsplit('/').next().unwrap_or(&repo).to_string(),
    };
    let platform_id = match args.platform_id {
        Some(id) => id,
        None => arch::local_platform_id()?,
    };
    let arch_tag = arch::resolve(&platform_id)?.to_string();

    let source_dir = match args.source_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let source_dir = std::fs::canonicalize(&source_dir).unwrap_or(source_dir);

    Ok(InstallationContext {
        install_root: args
            .install_root
            .unwrap_or_else(|| PathBuf::from(format!("/opt/{product}"))),
        principal,
        repo,
        product,
        arch_tag,
        autostart: args.autostart,
        display: args.display,
        vt: args.vt,
        source_dir,
        verbose,
    })
}

fn pipeline(ctx: &InstallationContext, progress: &StageProgress) -> Result<()> {
    // Workspace must outlive the install stage; dropped (and removed) when
    // the pipeline returns, on success and failure alike.
    let mut workspace: Option<DownloadWorkspace> = None;
    let mut helper: Option<PathBuf> = None;

    if !ctx.repo.is_empty() {
        progress.stage("resolving release");
        let doc = release::fetch_latest(&ctx.repo)?;
        let desc = release::resolve(&doc, &ctx.repo, &ctx.product, &ctx.arch_tag)?;
        if ctx.verbose {
            println!("  Latest release: {} ({})", desc.tag, desc.artifact_name);
        }
        progress.complete_stage();

        progress.stage("fetching artifacts");
        let ws = DownloadWorkspace::new()?;
        let (_artifact, helper_path) = fetch::fetch_release(&desc, &ws)?;
        workspace = Some(ws);
        helper = Some(helper_path);
        progress.complete_stage();
    }

    progress.stage("installing");
    let helper_path = helper
        .unwrap_or_else(|| ctx.source_dir.join("scripts/install-dependencies.sh"));
    let fetched_dir = workspace.as_ref().map(|ws| ws.path().to_path_buf());
    let mut outcome = installer::install(ctx, &helper_path, fetched_dir.as_deref())?;
    progress.complete_stage();

    progress.stage("integrating");
    let _artifacts = integrate::integrate(ctx)?;
    progress.complete_stage();

    progress.stage("granting capability");
    let grant_result = caps::grant(ctx, &mut outcome);
    progress.complete_stage();

    progress.stage("verifying");
    let mut report = verify::collect(ctx, outcome.strategy);
    match grant_result {
        Ok(grant) => {
            if ctx.verbose {
                println!(
                    "  Granted {} on {}",
                    grant.capability,
                    grant.binary.display()
                );
            }
        }
        Err(warning) => report.warnings.insert(0, warning),
    }
    progress.complete_stage();

    let endpoints = verify::Endpoints::discover();
    print!("{}", verify::render(ctx, &report, &endpoints));
    Ok(())
}
