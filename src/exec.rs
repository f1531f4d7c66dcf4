//! External command execution with unified error mapping
//!
//! Every system-level step (package manager, ldconfig, setcap, systemctl,
//! hostname) goes through [`run`] so failures carry the program name and the
//! trimmed stderr. Steps that must not run with elevated identity (dependency
//! install, anything touching the principal's caches) go through [`run_as`].

use std::path::Path;
use std::process::Command;

use crate::error::{ProvisionError, Result};

/// Captured output of a successful command.
#[derive(Debug)]
pub struct ExecOutput {
    pub stdout: String,
}

/// Run a command, capturing output; non-zero exit maps to `CommandFailed`.
pub fn run(program: &str, args: &[&str]) -> Result<ExecOutput> {
    run_in(program, args, None)
}

/// Run a command with a working directory.
pub fn run_in(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ExecOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|e| ProvisionError::CommandFailed {
        command: program.to_string(),
        reason: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProvisionError::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            reason: stderr.trim().to_string(),
        });
    }

    Ok(ExecOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

/// Run a command as another (non-root) user via `sudo -u`.
///
/// Used for the dependency-install step so dependency caches under the
/// principal's home never end up root-owned.
pub fn run_as(user: &str, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ExecOutput> {
    let mut sudo_args: Vec<&str> = vec!["-u", user, "-H", program];
    sudo_args.extend_from_slice(args);
    run_in("sudo", &sudo_args, cwd)
}
