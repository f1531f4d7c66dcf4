//! File system operations with explicit ownership assignment
//!
//! The orchestrator runs as root but must never leave root-owned files in the
//! install root or the principal's home, so every write and copy here takes
//! the target uid/gid and chowns what it creates.

use std::fs;
use std::os::unix::fs::{PermissionsExt, chown};
use std::path::Path;

use crate::error::{ProvisionError, Result};

/// Owner a written or copied entry is assigned to.
#[derive(Debug, Clone, Copy)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

/// Create a directory (and parents) owned by `owner`.
pub fn ensure_dir_owned(path: &Path, owner: Owner) -> Result<()> {
    fs::create_dir_all(path)?;
    chown(path, Some(owner.uid), Some(owner.gid))?;
    Ok(())
}

/// Write a file with the given mode and owner, replacing any existing file.
pub fn write_owned(path: &Path, content: &str, mode: u32, owner: Owner) -> Result<()> {
    fs::write(path, content).map_err(|e| ProvisionError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    chown(path, Some(owner.uid), Some(owner.gid))?;
    Ok(())
}

/// Create a file if absent and assign mode and owner, preserving any
/// existing content. Used for the kiosk log, which the principal must be
/// able to append to but which lives under a root-owned directory.
pub fn touch_owned(path: &Path, mode: u32, owner: Owner) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ProvisionError::FileWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    chown(path, Some(owner.uid), Some(owner.gid))?;
    Ok(())
}

/// Write a root-owned system file (units, linker config) with 0644 mode.
pub fn write_system(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).map_err(|e| ProvisionError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

/// Copy a file or directory tree into `dst`, chowning every created entry.
pub fn copy_path_owned(src: &Path, dst: &Path, owner: Owner) -> Result<()> {
    if src.is_dir() {
        copy_dir_owned(src, dst, owner)
    } else {
        fs::copy(src, dst)?;
        chown(dst, Some(owner.uid), Some(owner.gid))?;
        Ok(())
    }
}

fn copy_dir_owned(src: &Path, dst: &Path, owner: Owner) -> Result<()> {
    ensure_dir_owned(dst, owner)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let entry_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry_path.is_dir() {
            copy_dir_owned(&entry_path, &dst_path, owner)?;
        } else {
            fs::copy(&entry_path, &dst_path)?;
            chown(&dst_path, Some(owner.uid), Some(owner.gid))?;
        }
    }
    Ok(())
}
