//! Architecture resolution: raw platform identifier to canonical package tag
//!
//! The mapping is a fixed finite table. Anything outside it is fatal; the
//! pipeline never proceeds with a guessed tag, because the constructed artifact
//! filename would silently miss every release asset.

use crate::error::{ProvisionError, Result};
use crate::exec;

/// Resolve a raw platform identifier (as reported by `uname -m` or passed via
/// `--platform-id`) to the canonical architecture tag used in artifact names.
pub fn resolve(platform: &str) -> Result<&'static str> {
    match platform.trim() {
        "x86_64" | "amd64" => Ok("amd64"),
        "aarch64" | "arm64" => Ok("arm64"),
        "armv7l" | "armhf" => Ok("armv7l"),
        other => Err(ProvisionError::UnsupportedArchitecture {
            platform: other.to_string(),
        }),
    }
}

/// Raw platform identifier of the running machine, as reported by
/// `uname -m`. A compile-time constant will not do here: on armv7 builds it
/// reads `arm`, which is not a mappable identifier.
pub fn local_platform_id() -> Result<String> {
    let out = exec::run("uname", &["-m"])?;
    Ok(out.stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x86_64_aliases_map_to_amd64() {
        assert_eq!(resolve("x86_64").unwrap(), "amd64");
        assert_eq!(resolve("amd64").unwrap(), "amd64");
    }

    #[test]
    fn test_arm64_aliases_map_to_arm64() {
        assert_eq!(resolve("aarch64").unwrap(), "arm64");
        assert_eq!(resolve("arm64").unwrap(), "arm64");
    }

    #[test]
    fn test_armv7_aliases_map_to_armv7l() {
        assert_eq!(resolve("armv7l").unwrap(), "armv7l");
        assert_eq!(resolve("armhf").unwrap(), "armv7l");
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        // uname output arrives with a trailing newline
        assert_eq!(resolve("aarch64\n").unwrap(), "arm64");
    }

    #[test]
    fn test_unsupported_identifier_is_fatal() {
        let err = resolve("mips64").unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::UnsupportedArchitecture { ref platform } if platform == "mips64"
        ));
        // The bare compiler family name is not a mappable identifier either
        assert!(resolve("arm").is_err());
    }

    #[test]
    fn test_local_platform_id_reports_uname_output() {
        let uname = std::process::Command::new("uname")
            .arg("-m")
            .output()
            .unwrap();
        let expected = String::from_utf8_lossy(&uname.stdout).trim().to_string();
        assert_eq!(local_platform_id().unwrap(), expected);
    }

    #[test]
    fn test_empty_identifier_is_fatal() {
        assert!(resolve("").is_err());
    }
}
