//! Scratch directories laid out like native library search paths.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory that tests fill with library files and subdirectories.
/// Removed when dropped.
pub struct LibDir {
    dir: TempDir,
}

impl LibDir {
    pub fn new() -> anyhow::Result<LibDir> {
        Ok(LibDir {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a file named `name` holding `contents`.
    pub fn add_file(&self, name: &str, contents: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Copies an existing file into the directory under `name`.
    pub fn add_copy(&self, name: &str, source: &Path) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::copy(source, &path)?;
        Ok(path)
    }

    /// Creates a subdirectory named `name`.
    pub fn add_subdir(&self, name: &str) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::create_dir(&path)?;
        Ok(path)
    }
}

/// Returns the path of a small shared library present on this host that can be
/// loaded (and loaded again from a copy) inside a test process, if one is found.
pub fn system_library_path() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "/lib/x86_64-linux-gnu/libm.so.6",
        "/usr/lib/x86_64-linux-gnu/libm.so.6",
        "/lib/aarch64-linux-gnu/libm.so.6",
        "/usr/lib/aarch64-linux-gnu/libm.so.6",
        "/lib64/libm.so.6",
        "/usr/lib64/libm.so.6",
        "/usr/lib/libm.so.6",
    ];
    CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lib_dir_layout() {
        let dir = LibDir::new().unwrap();
        let file = dir.add_file("libfoo.so", b"not a library").unwrap();
        let sub = dir.add_subdir("nested").unwrap();
        assert!(file.is_file());
        assert!(sub.is_dir());
        assert_eq!(file.parent(), Some(dir.path()));
    }
}
