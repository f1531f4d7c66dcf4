//! Artifact download and validation
//!
//! Downloads land in an ephemeral workspace backed by `tempfile::TempDir`, so
//! cleanup is guaranteed by drop on every exit path, including fatal aborts
//! and unwinding. After download the artifact is sniffed against
//! the Debian package signature; this guards against installing an HTML error
//! page or a truncated file as if it were a real package.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ProvisionError, Result};
use crate::release::ReleaseDescriptor;
use crate::temp;

/// Debian packages are `ar` archives; every one starts with this magic.
const DEB_MAGIC: &[u8] = b"!<arch>\n";

/// Ephemeral download area, removed on drop.
pub struct DownloadWorkspace {
    dir: TempDir,
}

impl DownloadWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("kioskctl-")
            .tempdir_in(temp::temp_dir_base())?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Download `url` into the workspace under `file_name`.
    pub fn download(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("kioskctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProvisionError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let mut response = client
            .get(url)
            .send()
            .map_err(|e| ProvisionError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ProvisionError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let dest = self.dir.path().join(file_name);
        let mut file = fs::File::create(&dest)?;
        response
            .copy_to(&mut file)
            .map_err(|e| ProvisionError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(dest)
    }
}

/// Validation state of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Unvalidated,
    Valid,
    Invalid,
}

/// A downloaded file plus what the sniff concluded about it.
#[derive(Debug)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub size: u64,
    pub status: ValidationStatus,
}

impl LocalArtifact {
    pub fn new(path: PathBuf) -> Result<Self> {
        let size = fs::metadata(&path)?.len();
        Ok(Self {
            path,
            size,
            status: ValidationStatus::Unvalidated,
        })
    }

    /// Sniff the file against the Debian package signature. On mismatch the
    /// artifact is marked invalid and the error reports the observed leading
    /// bytes and the byte size.
    pub fn validate(&mut self) -> Result<()> {
        let head = read_head(&self.path, DEB_MAGIC.len())?;
        if head == DEB_MAGIC {
            self.status = ValidationStatus::Valid;
            Ok(())
        } else {
            self.status = ValidationStatus::Invalid;
            Err(ProvisionError::InvalidArtifact {
                path: self.path.display().to_string(),
                observed: printable_prefix(&head),
                size: self.size,
            })
        }
    }
}

fn read_head(path: &Path, len: usize) -> Result<Vec<u8>> {
    use std::io::Read;
    let mut file = fs::File::open(path)?;
    let mut buf = vec![0u8; len];
    let n = file.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

fn printable_prefix(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "(empty file)".to_string();
    }
    bytes.iter().map(|b| b.escape_ascii().to_string()).collect()
}

/// Download the release artifact and the companion install helper into the
/// workspace; validate the artifact before handing it to the installer.
pub fn fetch_release(
    desc: &ReleaseDescriptor,
    workspace: &DownloadWorkspace,
) -> Result<(LocalArtifact, PathBuf)> {
    let artifact_path = workspace.download(&desc.artifact_url, &desc.artifact_name)?;
    let helper_path = workspace.download(&desc.helper_url, "install-dependencies.sh")?;

    let mut artifact = LocalArtifact::new(artifact_path)?;
    artifact.validate()?;
    Ok((artifact, helper_path))
}
