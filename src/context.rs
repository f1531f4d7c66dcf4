//! Installation context: the immutable inputs of a provisioning run
//!
//! Built once by the provision command after the privilege preflight and
//! passed by reference through every pipeline stage. Nothing here mutates
//! after construction.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::{ProvisionError, Result};
use crate::exec;

/// The non-root identity the kiosk session runs as.
///
/// Everything written into this user's home, and everything copied for the
/// manual install strategy, is chowned to this identity so no root-owned
/// files are left behind.
#[derive(Debug, Clone)]
pub struct Principal {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl Principal {
    /// Look up a user in a passwd-format file (`/etc/passwd` in production,
    /// a fixture in tests).
    pub fn lookup_in(passwd_path: &Path, name: &str) -> Result<Self> {
        let content = fs::read_to_string(passwd_path)?;
        for line in content.lines() {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 6 || fields[0] != name {
                continue;
            }
            let uid = fields[2].parse::<u32>();
            let gid = fields[3].parse::<u32>();
            if let (Ok(uid), Ok(gid)) = (uid, gid) {
                return Ok(Principal {
                    name: name.to_string(),
                    uid,
                    gid,
                    home: PathBuf::from(fields[5]),
                });
            }
        }
        Err(ProvisionError::UnknownUser {
            name: name.to_string(),
        })
    }

    /// Look up a user in the system passwd database.
    pub fn lookup(name: &str) -> Result<Self> {
        Self::lookup_in(Path::new("/etc/passwd"), name)
    }
}

/// How the kiosk session gets started on boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AutostartVariant {
    /// Login-profile hook on an auto-logged-in virtual terminal
    Profile,
    /// Supervised systemd service that owns session startup
    Service,
}

/// Immutable inputs of one provisioning run.
#[derive(Debug, Clone)]
pub struct InstallationContext {
    pub principal: Principal,
    /// `owner/repo` slug of the release source
    pub repo: String,
    /// Product name; drives artifact names, install root and unit names
    pub product: String,
    pub install_root: PathBuf,
    /// Canonical architecture tag (see `crate::arch`)
    pub arch_tag: String,
    pub autostart: AutostartVariant,
    /// X display number the session runs on
    pub display: u32,
    /// Virtual terminal for the profile autostart variant
    pub vt: u32,
    /// Directory probed for a local package artifact and manual-install sources
    pub source_dir: PathBuf,
    pub verbose: bool,
}

impl InstallationContext {
    /// Fixed log location the startup wrapper redirects into.
    pub fn kiosk_log_path(&self) -> PathBuf {
        PathBuf::from(format!("/var/log/{}-kiosk.log", self.product))
    }
}

/// Refuse to run without an elevated-privilege context.
pub fn ensure_root() -> Result<()> {
    let out = exec::run("id", &["-u"])?;
    if out.stdout.trim() == "0" {
        Ok(())
    } else {
        Err(ProvisionError::InsufficientPrivilege)
    }
}

/// Determine the requesting (non-root) identity: an explicit `--user` wins,
/// then `SUDO_USER`. Root itself is never an acceptable acting identity.
pub fn acting_user(explicit: Option<&str>) -> Result<String> {
    let sudo_user = std::env::var("SUDO_USER").ok();
    acting_user_from(explicit, sudo_user.as_deref())
}

fn acting_user_from(explicit: Option<&str>, sudo_user: Option<&str>) -> Result<String> {
    let candidate = explicit.or(sudo_user).unwrap_or("").trim();
    if candidate.is_empty() || candidate == "root" {
        return Err(ProvisionError::NoActingIdentity);
    }
    Ok(candidate.to_string())
}
