//! [`TestTree`] builder for directory-tree test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A temporary directory tree with helpers for setup and assertion.
///
/// Paths passed to the helpers are relative to the tree root and use `/`.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TestTree;
///
/// let source = TestTree::new();
/// source.write("sub/b.txt", "Y");
/// source.assert_file("sub/b.txt", "Y");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create an empty temporary tree.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the tree.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Resolve a `/`-separated relative path against the root.
    pub fn path(&self, relative: &str) -> PathBuf {
        let mut path = self.root().to_path_buf();
        path.extend(relative.split('/'));
        path
    }

    /// Write a file, creating parent directories as needed.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }

    /// Create a directory and its parents.
    pub fn mkdir(&self, relative: &str) {
        fs::create_dir_all(self.path(relative)).unwrap();
    }

    /// Remove a file.
    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.path(relative)).unwrap();
    }

    /// Read a file as UTF-8.
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("failed to read {}: {}", relative, e))
    }

    /// Whether anything exists at the path.
    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// All regular files below the root, as sorted `/`-separated paths.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(self.root())
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let relative = e.path().strip_prefix(self.root()).unwrap();
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();
        files.sort();
        files
    }

    /// Assert that a file exists with the given content.
    pub fn assert_file(&self, relative: &str, expected: &str) {
        assert!(
            self.path(relative).is_file(),
            "expected file {} to exist",
            relative
        );
        assert_eq!(self.read(relative), expected, "content of {}", relative);
    }

    /// Assert that nothing exists at the path.
    pub fn assert_missing(&self, relative: &str) {
        assert!(
            !self.exists(relative),
            "expected {} to be absent",
            relative
        );
    }
}

/// Whether the tests run as root, which bypasses permission checks.
pub fn is_root() -> bool {
    match std::process::Command::new("id").arg("-u").output() {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "0",
        Err(_) => false,
    }
}
