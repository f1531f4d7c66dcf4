//! Common test utilities for kioskctl integration tests

use std::path::PathBuf;
use tempfile::TempDir;

/// A fake target-machine root for integration tests
pub struct TestHost {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to the fake host root
    pub path: PathBuf,
}

impl TestHost {
    /// Create a new empty host root
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Create a directory under the host root
    #[allow(dead_code)]
    pub fn create_dir(&self, rel: &str) -> PathBuf {
        let dir = self.path.join(rel);
        std::fs::create_dir_all(&dir).expect("Failed to create directory");
        dir
    }

    /// Write a file under the host root
    #[allow(dead_code)]
    pub fn write_file(&self, rel: &str, content: &str) {
        let file_path = self.path.join(rel);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Check if a file exists under the host root
    #[allow(dead_code)]
    pub fn file_exists(&self, rel: &str) -> bool {
        self.path.join(rel).exists()
    }
}
