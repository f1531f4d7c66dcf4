//! Safe temporary directory base for the download workspace.
//!
//! Never returns a relative path, so the ephemeral workspace is never created
//! under the current working directory (e.g. when TMPDIR=tmp and cwd is the
//! operator's source checkout that the installer later probes).

use std::env;
use std::path::PathBuf;

/// Returns an absolute directory path suitable for creating the ephemeral
/// download workspace under.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        PathBuf::from("/tmp")
    }
}
