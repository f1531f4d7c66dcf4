//! Release resolution against a GitHub-style releases endpoint
//!
//! One read-only query fetches the latest-release document; everything else
//! here is pure: version normalization, expected-filename construction and
//! the exact-match asset search. When the expected asset is missing, the
//! error deliberately lists every asset name from the document so an operator
//! can see at a glance what the release actually ships.

use serde::Deserialize;

use crate::error::{ProvisionError, Result};

const API_BASE: &str = "https://api.github.com";
const RAW_BASE: &str = "https://raw.githubusercontent.com";
const USER_AGENT: &str = concat!("kioskctl/", env!("CARGO_PKG_VERSION"));

/// Relative path of the dependency-install helper inside the release's tree.
const HELPER_SCRIPT_PATH: &str = "scripts/install-dependencies.sh";

/// Latest-release document as returned by the releases endpoint.
#[derive(Debug, Deserialize)]
pub struct ReleaseDocument {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    /// Error detail on "Not Found" responses
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Fully resolved release: version identifiers plus the download URLs the
/// fetcher needs. Read-only downstream of this module.
#[derive(Debug, Clone)]
pub struct ReleaseDescriptor {
    /// Raw tag as published (e.g. `v2.3.0`)
    pub tag: String,
    /// Numeric-normalized version (e.g. `2.3.0`)
    pub version: String,
    pub artifact_name: String,
    pub artifact_url: String,
    pub helper_url: String,
}

/// Fetch the latest-release document for `owner/repo`.
pub fn fetch_latest(repo: &str) -> Result<ReleaseDocument> {
    let url = format!("{API_BASE}/repos/{repo}/releases/latest");
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProvisionError::ReleaseMetadataUnavailable {
            repo: repo.to_string(),
            reason: e.to_string(),
        })?;

    let response =
        client
            .get(&url)
            .send()
            .map_err(|e| ProvisionError::ReleaseMetadataUnavailable {
                repo: repo.to_string(),
                reason: e.to_string(),
            })?;

    response
        .json::<ReleaseDocument>()
        .map_err(|e| ProvisionError::ReleaseMetadataUnavailable {
            repo: repo.to_string(),
            reason: e.to_string(),
        })
}

/// Strip exactly one leading non-numeric version-scheme prefix character,
/// e.g. `v2.3.0` -> `2.3.0`. A no-op for already-numeric versions.
pub fn normalize_version(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if !first.is_ascii_digit() => chars.as_str().to_string(),
        _ => tag.to_string(),
    }
}

/// Expected artifact filename under the fixed naming scheme.
pub fn expected_asset_name(product: &str, version: &str, arch_tag: &str) -> String {
    format!("{product}-{version}-linux-{arch_tag}.deb")
}

/// Resolve a release document into a [`ReleaseDescriptor`] for the target
/// product and architecture.
pub fn resolve(
    doc: &ReleaseDocument,
    repo: &str,
    product: &str,
    arch_tag: &str,
) -> Result<ReleaseDescriptor> {
    let tag = match doc.tag_name.as_deref() {
        Some(tag) if !tag.is_empty() => tag.to_string(),
        _ => {
            return Err(ProvisionError::ReleaseMetadataUnavailable {
                repo: repo.to_string(),
                reason: doc
                    .message
                    .clone()
                    .unwrap_or_else(|| "empty release document".to_string()),
            });
        }
    };

    let version = normalize_version(&tag);
    let artifact_name = expected_asset_name(product, &version, arch_tag);

    let asset = doc
        .assets
        .iter()
        .find(|a| a.name == artifact_name)
        .ok_or_else(|| ProvisionError::ArtifactNotFound {
            expected: artifact_name.clone(),
            available: if doc.assets.is_empty() {
                "(none)".to_string()
            } else {
                doc.assets
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        })?;

    Ok(ReleaseDescriptor {
        helper_url: format!("{RAW_BASE}/{repo}/{tag}/{HELPER_SCRIPT_PATH}"),
        tag,
        version,
        artifact_name,
        artifact_url: asset.browser_download_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> ReleaseDocument {
        serde_json::from_str(json).unwrap()
    }

    const RELEASE_JSON: &str = r#"{
        "tag_name": "v2.3.0",
        "assets": [
            {"name": "helloscreen-2.3.0-linux-amd64.deb",
             "browser_download_url": "https://dl.test/helloscreen-2.3.0-linux-amd64.deb"},
            {"name": "helloscreen-2.3.0-linux-arm64.deb",
             "browser_download_url": "https://dl.test/helloscreen-2.3.0-linux-arm64.deb"},
            {"name": "checksums.txt",
             "browser_download_url": "https://dl.test/checksums.txt"}
        ]
    }"#;

    #[test]
    fn test_normalize_version_strips_one_prefix_char() {
        assert_eq!(normalize_version("v2.3.0"), "2.3.0");
        assert_eq!(normalize_version("r10.0"), "10.0");
    }

    #[test]
    fn test_normalize_version_noop_when_numeric() {
        assert_eq!(normalize_version("2.3.0"), "2.3.0");
    }

    #[test]
    fn test_normalize_version_strips_only_one_char() {
        // Only a single-character scheme prefix is recognized
        assert_eq!(normalize_version("vv2.3.0"), "v2.3.0");
    }

    #[test]
    fn test_expected_asset_name_scheme() {
        assert_eq!(
            expected_asset_name("helloscreen", "2.3.0", "arm64"),
            "helloscreen-2.3.0-linux-arm64.deb"
        );
    }

    #[test]
    fn test_resolve_finds_exact_asset() {
        let d = doc(RELEASE_JSON);
        let resolved = resolve(&d, "acme/helloscreen", "helloscreen", "arm64").unwrap();
        assert_eq!(resolved.tag, "v2.3.0");
        assert_eq!(resolved.version, "2.3.0");
        assert_eq!(resolved.artifact_name, "helloscreen-2.3.0-linux-arm64.deb");
        assert_eq!(
            resolved.artifact_url,
            "https://dl.test/helloscreen-2.3.0-linux-arm64.deb"
        );
    }

    #[test]
    fn test_resolve_helper_url_pinned_to_tag() {
        let d = doc(RELEASE_JSON);
        let resolved = resolve(&d, "acme/helloscreen", "helloscreen", "amd64").unwrap();
        assert_eq!(
            resolved.helper_url,
            "https://raw.githubusercontent.com/acme/helloscreen/v2.3.0/scripts/install-dependencies.sh"
        );
    }

    #[test]
    fn test_resolve_missing_asset_lists_every_name() {
        let d = doc(RELEASE_JSON);
        let err = resolve(&d, "acme/helloscreen", "helloscreen", "armv7l").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("helloscreen-2.3.0-linux-armv7l.deb"));
        assert!(message.contains("helloscreen-2.3.0-linux-amd64.deb"));
        assert!(message.contains("helloscreen-2.3.0-linux-arm64.deb"));
        assert!(message.contains("checksums.txt"));
    }

    #[test]
    fn test_resolve_not_found_document() {
        let d = doc(r#"{"message": "Not Found"}"#);
        let err = resolve(&d, "acme/gone", "gone", "arm64").unwrap_err();
        match err {
            ProvisionError::ReleaseMetadataUnavailable { repo, reason } => {
                assert_eq!(repo, "acme/gone");
                assert_eq!(reason, "Not Found");
            }
            other => panic!("expected ReleaseMetadataUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_empty_document() {
        let d = doc("{}");
        let err = resolve(&d, "acme/empty", "empty", "arm64").unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::ReleaseMetadataUnavailable { .. }
        ));
    }

    #[test]
    fn test_resolve_empty_asset_list_reports_none() {
        let d = doc(r#"{"tag_name": "v1.0.0", "assets": []}"#);
        let err = resolve(&d, "acme/bare", "bare", "arm64").unwrap_err();
        assert!(err.to_string().contains("(none)"));
    }
}
