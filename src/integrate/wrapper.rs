//! Startup wrapper generation
//!
//! The wrapper launches the installed runtime in locked-down full-screen
//! mode. It prefers the package-installed command when resolvable and falls
//! back to the source-tree invocation, so the same wrapper works for both
//! installation strategies and survives switching between them on re-runs.
//! All output is captured to the fixed kiosk log for later diagnosis.

use std::path::PathBuf;

use crate::common::fs::{Owner, ensure_dir_owned, write_owned};
use crate::context::InstallationContext;
use crate::error::Result;

pub fn wrapper_path(ctx: &InstallationContext) -> PathBuf {
    ctx.install_root.join("start-kiosk.sh")
}

/// Render the wrapper script.
pub fn render(ctx: &InstallationContext) -> String {
    format!(
        r#"#!/bin/bash
# Generated by kioskctl; overwritten on re-provisioning.
LOG="{log}"

if command -v {product} >/dev/null 2>&1; then
    exec {product} --kiosk --start-fullscreen --no-first-run >>"$LOG" 2>&1
fi

cd "{install_root}" || exit 1
exec node dist/main.js --kiosk --start-fullscreen >>"$LOG" 2>&1
"#,
        log = ctx.kiosk_log_path().display(),
        product = ctx.product,
        install_root = ctx.install_root.display(),
    )
}

/// Write the wrapper into the install root, executable and owned by the
/// principal.
pub fn write(ctx: &InstallationContext) -> Result<PathBuf> {
    let owner = Owner {
        uid: ctx.principal.uid,
        gid: ctx.principal.gid,
    };
    ensure_dir_owned(&ctx.install_root, owner)?;
    let path = wrapper_path(ctx);
    write_owned(&path, &render(ctx), 0o755, owner)?;
    Ok(path)
}
