//! Stable streaming fingerprint accumulator backed by blake3.

use crate::error::{BuildError, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

/// Accumulates bytes into a stable digest. Equal append sequences produce
/// equal digests across runs and across machines.
pub struct HashBuilder {
    hasher: blake3::Hasher,
}

impl HashBuilder {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Appends a string followed by a zero byte so adjacent appends cannot
    /// run together.
    pub fn append_str(&mut self, text: &str) {
        self.hasher.update(text.as_bytes());
        self.hasher.update(&[0]);
    }

    /// Appends a file's contents, or for a directory every contained file's
    /// relative path and contents in sorted order.
    pub fn append_path(&mut self, path: &Path) -> Result<()> {
        if path.is_dir() {
            let mut files = BTreeSet::new();
            for entry in WalkDir::new(path) {
                let entry = entry.map_err(|e| {
                    BuildError::io(path, e.into_io_error().unwrap_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::Other, "walk failed")
                    }))
                })?;
                if entry.file_type().is_file() {
                    files.insert(entry.into_path());
                }
            }
            for file in files {
                let relative = file.strip_prefix(path).unwrap_or(&file);
                self.append_str(&relative.to_string_lossy().replace('\\', "/"));
                self.append_file(&file)?;
            }
            Ok(())
        } else {
            self.append_file(path)
        }
    }

    fn append_file(&mut self, path: &Path) -> Result<()> {
        let mut file = File::open(path).map_err(|e| BuildError::io(path, e))?;
        let mut buffer = [0u8; 8192];
        loop {
            let n = file.read(&mut buffer).map_err(|e| BuildError::io(path, e))?;
            if n == 0 {
                break;
            }
            self.hasher.update(&buffer[..n]);
        }
        Ok(())
    }

    /// Finalizes the digest as lowercase hex.
    pub fn finalize_hex(self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn hex_of(build: impl FnOnce(&mut HashBuilder)) -> String {
        let mut builder = HashBuilder::new();
        build(&mut builder);
        builder.finalize_hex()
    }

    #[test]
    fn test_deterministic() {
        let a = hex_of(|b| b.append_str("hello"));
        let b = hex_of(|b| b.append_str("hello"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_input_different_digest() {
        let a = hex_of(|b| b.append_str("hello"));
        let b = hex_of(|b| b.append_str("world"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_string_appends_do_not_run_together() {
        let a = hex_of(|b| {
            b.append_str("ab");
            b.append_str("c");
        });
        let b = hex_of(|b| {
            b.append_str("a");
            b.append_str("bc");
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_directory_hash_covers_relative_paths_and_contents() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "beta").unwrap();

        let first = {
            let mut b = HashBuilder::new();
            b.append_path(dir.path()).unwrap();
            b.finalize_hex()
        };

        // Same tree hashes identically.
        let second = {
            let mut b = HashBuilder::new();
            b.append_path(dir.path()).unwrap();
            b.finalize_hex()
        };
        assert_eq!(first, second);

        // Renaming a file changes the digest even with identical contents.
        fs::rename(dir.path().join("a.txt"), dir.path().join("c.txt")).unwrap();
        let renamed = {
            let mut b = HashBuilder::new();
            b.append_path(dir.path()).unwrap();
            b.finalize_hex()
        };
        assert_ne!(first, renamed);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let mut builder = HashBuilder::new();
        let err = builder
            .append_path(Path::new("/nonexistent/input.bin"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/input.bin"));
    }
}
