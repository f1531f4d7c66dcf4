//! Error types and handling for kioskctl
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! There are exactly two severities in the provisioning pipeline: fatal errors,
//! which are variants of [`ProvisionError`] and abort the whole run, and
//! warnings, which are never errors at all: they are collected into the final
//! verification report (see `crate::verify`).

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for kioskctl operations. Every variant is fatal.
#[derive(Error, Diagnostic, Debug)]
pub enum ProvisionError {
    // Preflight errors
    #[error("Insufficient privilege: provisioning must run as root")]
    #[diagnostic(
        code(kioskctl::preflight::insufficient_privilege),
        help("Re-run under sudo: sudo kioskctl provision <owner/repo>")
    )]
    InsufficientPrivilege,

    #[error("Cannot determine the requesting (non-root) identity")]
    #[diagnostic(
        code(kioskctl::preflight::no_acting_identity),
        help("Invoke via sudo from a regular account, or pass --user <name>")
    )]
    NoActingIdentity,

    #[error("Unknown user '{name}'")]
    #[diagnostic(
        code(kioskctl::preflight::unknown_user),
        help("The acting identity must exist in /etc/passwd on the target machine")
    )]
    UnknownUser { name: String },

    // Architecture errors
    #[error("Unsupported platform identifier: {platform}")]
    #[diagnostic(
        code(kioskctl::arch::unsupported),
        help("Supported identifiers: x86_64, amd64, aarch64, arm64, armv7l, armhf")
    )]
    UnsupportedArchitecture { platform: String },

    // Release resolution errors
    #[error("Release metadata unavailable for {repo}: {reason}")]
    #[diagnostic(
        code(kioskctl::release::metadata_unavailable),
        help("Check the repository slug and that it has at least one published release")
    )]
    ReleaseMetadataUnavailable { repo: String, reason: String },

    #[error("Release asset '{expected}' not found; available assets: {available}")]
    #[diagnostic(
        code(kioskctl::release::artifact_not_found),
        help("The release may not ship a package for this architecture yet")
    )]
    ArtifactNotFound { expected: String, available: String },

    // Download errors
    #[error("Download failed from {url}: {reason}")]
    #[diagnostic(
        code(kioskctl::fetch::download_failed),
        help("Check network connectivity and that the URL is reachable from this machine")
    )]
    DownloadFailed { url: String, reason: String },

    #[error("Invalid artifact at {path}: expected a Debian package, got {observed} ({size} bytes)")]
    #[diagnostic(
        code(kioskctl::fetch::invalid_artifact),
        help("The download may be an HTML error page or a truncated file; delete it and re-run")
    )]
    InvalidArtifact {
        path: String,
        observed: String,
        size: u64,
    },

    // Installer errors
    #[error("Package install failed for {package}: {reason}")]
    #[diagnostic(
        code(kioskctl::install::package_failed),
        help(
            "A present-but-broken package is treated as an operator error; fix or remove the \
             .deb before re-running (there is no automatic fallback to the manual strategy)"
        )
    )]
    PackageInstallFailed { package: String, reason: String },

    #[error("Missing manual-install source files: {missing}")]
    #[diagnostic(
        code(kioskctl::install::missing_manual_files),
        help("Run from a built source checkout containing dist/, src/ and package.json")
    )]
    MissingManualInstallFiles { missing: String },

    #[error("Dependency install failed: {reason}")]
    #[diagnostic(
        code(kioskctl::install::dependency_failed),
        help("Re-run after fixing the reported helper failure; the step runs as the acting user")
    )]
    DependencyInstallFailed { reason: String },

    // Process execution errors
    #[error("Command '{command}' failed: {reason}")]
    #[diagnostic(code(kioskctl::exec::command_failed))]
    CommandFailed { command: String, reason: String },

    // File system errors
    #[error("Failed to write file: {path}")]
    #[diagnostic(code(kioskctl::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(kioskctl::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for ProvisionError {
    fn from(err: std::io::Error) -> Self {
        ProvisionError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProvisionError {
    fn from(err: serde_json::Error) -> Self {
        ProvisionError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ProvisionError>;
