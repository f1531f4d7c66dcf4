//! Display-session profile generation
//!
//! The session profile disables screen blanking and power management, hides
//! the pointer after a short idle, starts a minimal window manager, gives it
//! a moment to initialize, then hands off to the startup wrapper. A missing
//! wrapper fails visibly with a message on stderr rather than leaving a
//! blank screen with no explanation.

use std::path::PathBuf;

use crate::common::fs::{Owner, write_owned};
use crate::context::InstallationContext;
use crate::error::Result;
use crate::integrate::wrapper;

pub fn profile_path(ctx: &InstallationContext) -> PathBuf {
    ctx.principal.home.join(".xinitrc")
}

/// Render the session profile.
pub fn render(ctx: &InstallationContext) -> String {
    format!(
        r#"#!/bin/sh
# Generated by kioskctl; overwritten on re-provisioning.
xset s off
xset s noblank
xset -dpms

unclutter -idle 0.5 -root &
matchbox-window-manager -use_titlebar no &
sleep 2

WRAPPER="{wrapper}"
if [ ! -x "$WRAPPER" ]; then
    echo "kiosk startup wrapper missing or not executable: $WRAPPER" >&2
    exit 1
fi
exec "$WRAPPER"
"#,
        wrapper = wrapper::wrapper_path(ctx).display(),
    )
}

/// Write the session profile into the principal's home, owned by the
/// principal.
pub fn write(ctx: &InstallationContext) -> Result<PathBuf> {
    let path = profile_path(ctx);
    let owner = Owner {
        uid: ctx.principal.uid,
        gid: ctx.principal.gid,
    };
    write_owned(&path, &render(ctx), 0o644, owner)?;
    Ok(path)
}
