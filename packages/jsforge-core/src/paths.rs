//! Filesystem primitives shared by every pipeline step: idempotent directory
//! creation, recursive gathers (plain and ignore-file-aware) and a recursive
//! copy with an optional byte rewrite hook.

use crate::error::{BuildError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Per-directory exclusion list honoured by [`gather_ignoring`].
pub const IGNORE_FILE_NAME: &str = ".j2cl-maven-plugin-ignore.txt";

/// Rewrite hook applied to file bytes during [`copy_files`]; receives the
/// source bytes and the source path.
pub type Rewrite<'a> = dyn Fn(&[u8], &Path) -> Vec<u8> + 'a;

/// Idempotent recursive directory creation.
pub fn create_if_absent(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|e| BuildError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Returns the path iff it exists as a directory.
pub fn exists_dir(path: &Path) -> Option<PathBuf> {
    if path.is_dir() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Recursive delete; absent paths are not an error.
pub fn remove_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn is_java_file(path: &Path) -> bool {
    file_name_of(path).ends_with(".java")
}

/// True for any `.js` file, including `.native.js`.
pub fn is_javascript_file(path: &Path) -> bool {
    file_name_of(path).ends_with(".js")
}

pub fn is_native_javascript_file(path: &Path) -> bool {
    file_name_of(path).ends_with(".native.js")
}

pub fn is_class_file(path: &Path) -> bool {
    file_name_of(path).ends_with(".class")
}

/// Finds all files under `root` accepted by `include`, sorted
/// lexicographically so downstream hashing is deterministic.
pub fn gather(root: &Path, include: &dyn Fn(&Path) -> bool) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed"));
            BuildError::io(root, io)
        })?;
        if entry.file_type().is_file() && include(entry.path()) {
            files.insert(entry.into_path());
        }
    }
    Ok(files)
}

/// Like [`gather`] but honours ignore files.
///
/// On entering a directory `D`, each non-blank, non-comment line of
/// `D/.j2cl-maven-plugin-ignore.txt` becomes a glob pattern rooted at `D`.
/// Patterns stay active for everything below `D` and are dropped when the
/// walk leaves `D`. A file is included iff `include` accepts it and no
/// active pattern matches its path.
pub fn gather_ignoring(root: &Path, include: &dyn Fn(&Path) -> bool) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    if !root.exists() {
        return Ok(files);
    }
    let mut active = Vec::new();
    visit_ignoring(root, include, &mut active, &mut files)?;
    Ok(files)
}

fn visit_ignoring(
    dir: &Path,
    include: &dyn Fn(&Path) -> bool,
    active: &mut Vec<String>,
    files: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    let pushed = read_ignore_patterns(dir, active)?;

    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            visit_ignoring(&path, include, active, files)?;
        } else {
            let text = path.to_string_lossy().replace('\\', "/");
            let excluded = active.iter().any(|pattern| glob_match(pattern, &text));
            if !excluded && include(&path) {
                files.insert(path);
            }
        }
    }

    active.truncate(active.len() - pushed);
    Ok(())
}

/// Reads `dir`'s ignore file, pushing one pattern per effective line.
/// Returns the number of patterns pushed so the caller can pop them on exit.
///
/// Comment lines (`#` prefix) and blank lines carry no pattern.
fn read_ignore_patterns(dir: &Path, active: &mut Vec<String>) -> Result<usize> {
    let ignore_file = dir.join(IGNORE_FILE_NAME);
    if !ignore_file.is_file() {
        return Ok(0);
    }
    let text = fs::read_to_string(&ignore_file).map_err(|e| BuildError::io(&ignore_file, e))?;
    let prefix = dir.to_string_lossy().replace('\\', "/");
    let mut pushed = 0;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        active.push(format!("{prefix}/{line}"));
        pushed += 1;
    }
    Ok(pushed)
}

/// Copies each file preserving its path relative to `src_root`. When a
/// rewrite hook is given the file bytes pass through it before writing.
/// Returns the destination paths in copy order.
pub fn copy_files<'a>(
    src_root: &Path,
    files: impl IntoIterator<Item = &'a PathBuf>,
    dst_root: &Path,
    rewrite: Option<&Rewrite<'_>>,
) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for file in files {
        let relative = file.strip_prefix(src_root).map_err(|_| {
            BuildError::internal(format!(
                "{} is not under source root {}",
                file.display(),
                src_root.display()
            ))
        })?;
        let destination = dst_root.join(relative);
        if let Some(parent) = destination.parent() {
            create_if_absent(parent)?;
        }
        if destination.exists() {
            debug!(
                "overwriting {} from {}",
                destination.display(),
                file.display()
            );
        }
        match rewrite {
            Some(rewrite) => {
                let bytes = fs::read(file).map_err(|e| BuildError::io(file, e))?;
                let rewritten = rewrite(&bytes, file);
                fs::write(&destination, rewritten).map_err(|e| BuildError::io(&destination, e))?;
            }
            None => {
                fs::copy(file, &destination).map_err(|e| BuildError::io(file, e))?;
            }
        }
        copied.push(destination);
    }
    Ok(copied)
}

/// Minimal glob matcher: `*` matches within a path segment, `**` crosses
/// segments, `?` matches a single non-separator character. Everything else
/// is literal. Both pattern and text use `/` separators.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn inner(p: &[u8], t: &[u8]) -> bool {
        match p.first() {
            None => t.is_empty(),
            Some(b'*') => {
                if p.get(1) == Some(&b'*') {
                    let rest = &p[2..];
                    (0..=t.len()).any(|i| inner(rest, &t[i..]))
                } else {
                    let rest = &p[1..];
                    let limit = t.iter().position(|&c| c == b'/').unwrap_or(t.len());
                    (0..=limit).any(|i| inner(rest, &t[i..]))
                }
            }
            Some(b'?') => !t.is_empty() && t[0] != b'/' && inner(&p[1..], &t[1..]),
            Some(&c) => t.first() == Some(&c) && inner(&p[1..], &t[1..]),
        }
    }
    inner(pattern.as_bytes(), text.as_bytes())
}
