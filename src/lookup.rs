//! Ranked-candidate lookup
//!
//! Several stages share the same search shape: an ordered list of candidate
//! locations where earlier entries outrank later ones, with newest
//! modification time as the deterministic tie-break within a location. The
//! installer probes for package artifacts this way and the capability granter
//! locates runtime binaries this way.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Return the first path in `candidates` that exists.
pub fn first_existing<I, P>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    candidates
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .find(|p| p.exists())
}

/// Resolve a program name against a PATH-style search string.
pub fn resolve_on_path(program: &str, path_var: &str) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Search ordered candidate directories for a file named `{prefix}*{suffix}`.
///
/// The first directory containing any match wins; within that directory the
/// most recently modified match is returned.
pub fn newest_match(dirs: &[PathBuf], prefix: &str, suffix: &str) -> Option<PathBuf> {
    for dir in dirs {
        let mut matches: Vec<(PathBuf, SystemTime)> = Vec::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if !(name.starts_with(prefix) && name.ends_with(suffix)) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            matches.push((path, modified));
        }
        if let Some(newest) = matches
            .into_iter()
            .max_by_key(|(_, modified)| *modified)
            .map(|(path, _)| path)
        {
            return Some(newest);
        }
    }
    None
}
