//! System integration: the machine-specific runtime glue
//!
//! Writes three artifacts, each an idempotent overwrite on re-run: the
//! startup wrapper, the display-session profile, and the auto-start
//! mechanism in one of its two variants. The variant is a tagged enum chosen
//! once in the installation context and dispatched here, never inferred.

pub mod autostart;
pub mod session;
pub mod wrapper;

use std::path::PathBuf;

use crate::common::fs::{Owner, touch_owned};
use crate::context::InstallationContext;
use crate::error::Result;

pub use autostart::AutostartDescriptor;

/// Paths written by the integrator; read back only by the verifier's
/// existence checks.
#[derive(Debug)]
pub struct IntegrationArtifacts {
    pub wrapper: PathBuf,
    pub session_profile: PathBuf,
    pub autostart: AutostartDescriptor,
    pub display: u32,
}

/// Write all integration artifacts for the run.
pub fn integrate(ctx: &InstallationContext) -> Result<IntegrationArtifacts> {
    // The wrapper appends to the kiosk log as the principal, who cannot
    // create files under /var/log; hand over a writable file up front.
    let owner = Owner {
        uid: ctx.principal.uid,
        gid: ctx.principal.gid,
    };
    touch_owned(&ctx.kiosk_log_path(), 0o644, owner)?;

    let wrapper = wrapper::write(ctx)?;
    let session_profile = session::write(ctx)?;
    let autostart = autostart::apply(ctx)?;

    Ok(IntegrationArtifacts {
        wrapper,
        session_profile,
        autostart,
        display: ctx.display,
    })
}
