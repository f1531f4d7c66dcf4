//! Capability granting for privileged network ports
//!
//! The kiosk service binds privileged ports without running as root: the real
//! runtime binary gets a narrowly scoped `cap_net_bind_service` grant via
//! setcap, immediately re-queried with getcap to confirm it took effect.
//!
//! Nothing in this module is fatal. A failed locate or an unconfirmed grant
//! leaves the system usable on a non-privileged port, so failures come back
//! as a warning message carrying the manual remediation command.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::context::InstallationContext;
use crate::error::Result;
use crate::exec;
use crate::installer::{InstallStrategy, InstallationOutcome};
use crate::lookup;

pub const CAPABILITY: &str = "cap_net_bind_service";

/// A confirmed capability grant.
#[derive(Debug)]
pub struct CapabilityGrant {
    pub binary: PathBuf,
    pub capability: String,
    pub confirmed: bool,
}

/// Locate the runtime binary, grant the capability and confirm it. On any
/// failure returns the warning message for the final report; the outcome's
/// runtime binary path is still filled in when the locate step succeeded.
pub fn grant(
    ctx: &InstallationContext,
    outcome: &mut InstallationOutcome,
) -> std::result::Result<CapabilityGrant, String> {
    let binary = locate_runtime_binary(ctx, outcome.strategy).ok_or_else(|| {
        format!(
            "could not locate the runtime binary; grant manually with: \
             setcap '{CAPABILITY}=+ep' <binary>"
        )
    })?;
    outcome.runtime_binary = Some(binary.clone());

    match apply_and_confirm(&binary) {
        Ok(()) => Ok(CapabilityGrant {
            capability: CAPABILITY.to_string(),
            binary,
            confirmed: true,
        }),
        Err(reason) => Err(format!(
            "capability grant not confirmed on {} ({reason}); grant manually with: \
             setcap '{CAPABILITY}=+ep' {}",
            binary.display(),
            binary.display(),
        )),
    }
}

fn apply_and_confirm(binary: &Path) -> std::result::Result<(), String> {
    let binary_arg = binary.display().to_string();
    exec::run("setcap", &[&format!("{CAPABILITY}=+ep"), &binary_arg])
        .map_err(|e| e.to_string())?;

    // Re-query: a setcap that "succeeds" on an unsupported filesystem still
    // leaves the binary without the capability.
    let out = exec::run("getcap", &[&binary_arg]).map_err(|e| e.to_string())?;
    if out.stdout.contains(CAPABILITY) {
        Ok(())
    } else {
        Err("getcap does not report the capability".to_string())
    }
}

/// Locate the real elevated-privilege-requiring binary for the strategy.
pub fn locate_runtime_binary(
    ctx: &InstallationContext,
    strategy: InstallStrategy,
) -> Option<PathBuf> {
    match strategy {
        InstallStrategy::Package => {
            let ranked = [
                ctx.install_root.join(&ctx.product),
                PathBuf::from(format!("/usr/bin/{}", ctx.product)),
                PathBuf::from(format!("/usr/local/bin/{}", ctx.product)),
            ];
            let search_roots = [
                ctx.install_root.clone(),
                PathBuf::from(format!("/usr/lib/{}", ctx.product)),
            ];
            locate_named_executable(&ctx.product, &ranked, &search_roots)
        }
        InstallStrategy::Manual => {
            // The dependency runtime binds the port; resolve its real
            // (symlink-free) path so the grant outlives version-manager
            // symlink swaps.
            let path_var = std::env::var("PATH").unwrap_or_default();
            let node = lookup::resolve_on_path("node", &path_var)?;
            fs::canonicalize(node).ok()
        }
    }
}

/// Ranked known paths first, then a scoped filesystem search for an
/// executable with the product's name, excluding wrapper scripts.
fn locate_named_executable(
    name: &str,
    ranked: &[PathBuf],
    search_roots: &[PathBuf],
) -> Option<PathBuf> {
    if let Some(found) = lookup::first_existing(ranked.iter().filter(|p| p.is_file())) {
        return Some(found);
    }

    for root in search_roots {
        for entry in WalkDir::new(root).into_iter().flatten() {
            let path = entry.path();
            if !path.is_file() || path.file_name().and_then(|n| n.to_str()) != Some(name) {
                continue;
            }
            if is_wrapper_script(path) || !is_executable(path) {
                continue;
            }
            return Some(path.to_path_buf());
        }
    }
    None
}

fn is_wrapper_script(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("sh")
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
