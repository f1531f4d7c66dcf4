//! Installation strategies
//!
//! A state machine with two terminal success states and fatal failure:
//! probe the ranked candidate locations for a locally built package artifact;
//! if one exists, install it through the platform package manager (Package
//! strategy), otherwise copy the source checkout into the install root and
//! run the dependency-install helper as the principal (Manual strategy).
//!
//! Both strategies are fatal on failure. In particular a present-but-broken
//! package never falls back to the manual strategy: that asymmetry surfaces
//! packaging defects instead of masking them.

use std::path::{Path, PathBuf};

use crate::common::fs::{Owner, copy_path_owned, ensure_dir_owned, write_system};
use crate::context::InstallationContext;
use crate::error::{ProvisionError, Result};
use crate::exec;
use crate::lookup;

/// Which installation strategy succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStrategy {
    Package,
    Manual,
}

/// Result of a successful installation. Constructing one implies success;
/// every failure path aborts with a fatal error instead.
#[derive(Debug)]
pub struct InstallationOutcome {
    pub strategy: InstallStrategy,
    /// Real runtime binary, resolved later by the capability granter
    pub runtime_binary: Option<PathBuf>,
}

/// Source files the manual strategy requires under the source directory.
const MANUAL_SOURCES: [&str; 3] = ["dist", "src", "package.json"];

/// Probe the ranked candidate locations for a package artifact: the download
/// workspace when a release was fetched, then the source directory, then its
/// nested build-output subdirectory. Newest modification time wins within a
/// location.
pub fn probe_package(ctx: &InstallationContext, fetched_dir: Option<&Path>) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = fetched_dir {
        candidates.push(dir.to_path_buf());
    }
    candidates.push(ctx.source_dir.clone());
    candidates.push(ctx.source_dir.join("dist"));
    lookup::newest_match(&candidates, &format!("{}-", ctx.product), ".deb")
}

/// Execute the chosen strategy and return the outcome.
pub fn install(
    ctx: &InstallationContext,
    helper: &Path,
    fetched_dir: Option<&Path>,
) -> Result<InstallationOutcome> {
    match probe_package(ctx, fetched_dir) {
        Some(package) => {
            if ctx.verbose {
                println!("  Found package artifact: {}", package.display());
            }
            install_package(ctx, &package)?;
            Ok(InstallationOutcome {
                strategy: InstallStrategy::Package,
                runtime_binary: None,
            })
        }
        None => {
            if ctx.verbose {
                println!("  No package artifact found, using manual strategy");
            }
            install_manual(ctx, helper)?;
            Ok(InstallationOutcome {
                strategy: InstallStrategy::Manual,
                runtime_binary: None,
            })
        }
    }
}

/// Package strategy: hand the artifact to the package manager, then register
/// the product's library directory with the dynamic linker.
fn install_package(ctx: &InstallationContext, package: &Path) -> Result<()> {
    let package_arg = package.display().to_string();
    exec::run("apt-get", &["install", "-y", "--reinstall", &package_arg]).map_err(|e| {
        ProvisionError::PackageInstallFailed {
            package: package_arg.clone(),
            reason: e.to_string(),
        }
    })?;

    let lib_dir = library_dir(ctx);
    write_system(&ld_conf_path(&ctx.product), &format!("{}\n", lib_dir.display()))?;
    exec::run("ldconfig", &[])?;
    Ok(())
}

/// Library directory registered with the dynamic linker: the first existing
/// known location, falling back to the install root itself.
fn library_dir(ctx: &InstallationContext) -> PathBuf {
    lookup::first_existing([
        ctx.install_root.join("lib"),
        ctx.install_root.join("usr/lib"),
        PathBuf::from(format!("/usr/lib/{}", ctx.product)),
    ])
    .unwrap_or_else(|| ctx.install_root.clone())
}

fn ld_conf_path(product: &str) -> PathBuf {
    PathBuf::from(format!("/etc/ld.so.conf.d/{product}.conf"))
}

/// Manual strategy: verify every required source artifact up front (nothing
/// is copied when any is missing), copy them into the install root owned by
/// the principal, then run the dependency-install helper as the principal.
fn install_manual(ctx: &InstallationContext, helper: &Path) -> Result<()> {
    let missing = missing_manual_sources(&ctx.source_dir);
    if !missing.is_empty() {
        return Err(ProvisionError::MissingManualInstallFiles {
            missing: missing.join(", "),
        });
    }

    let owner = Owner {
        uid: ctx.principal.uid,
        gid: ctx.principal.gid,
    };
    ensure_dir_owned(&ctx.install_root, owner)?;
    for name in MANUAL_SOURCES {
        copy_path_owned(
            &ctx.source_dir.join(name),
            &ctx.install_root.join(name),
            owner,
        )?;
    }

    let helper_arg = helper.display().to_string();
    exec::run_as(
        &ctx.principal.name,
        "bash",
        &[&helper_arg],
        Some(&ctx.install_root),
    )
    .map_err(|e| ProvisionError::DependencyInstallFailed {
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Names of required manual-install sources missing under `source_dir`.
fn missing_manual_sources(source_dir: &Path) -> Vec<&'static str> {
    MANUAL_SOURCES
        .into_iter()
        .filter(|name| !source_dir.join(name).exists())
        .collect()
}
