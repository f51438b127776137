//! Package renaming across source text and class references.
//!
//! Files under a `find` prefix move to the `replace` prefix's path, and any
//! textual occurrence of the prefix (dot, slash or backslash form) inside
//! Java source, JavaScript or class files is substituted. When two `find`
//! prefixes overlap, the longest prefix wins.

use crate::cache::StepResult;
use crate::error::Result;
use crate::log::TaskLog;
use crate::paths;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub fn execute(
    input_roots: &[PathBuf],
    mappings: &BTreeMap<String, String>,
    output: &Path,
    log: &mut TaskLog,
) -> Result<StepResult> {
    if mappings.is_empty() {
        log.line("no shade mappings");
        return Ok(StepResult::Skipped);
    }

    paths::create_if_absent(output)?;
    let ordered = ordered_mappings(mappings);

    let mut copied_any = false;
    for root in input_roots {
        if paths::exists_dir(root).is_none() {
            continue;
        }
        copied_any |= copy_and_shade(root, &ordered, output, log)?;
    }

    if copied_any {
        Ok(StepResult::Success)
    } else {
        log.line("no input files");
        paths::remove_all(output)?;
        Ok(StepResult::Aborted)
    }
}

/// Longest `find` prefix first so overlapping prefixes resolve to the most
/// specific mapping.
fn ordered_mappings(mappings: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut ordered: Vec<(String, String)> = mappings
        .iter()
        .map(|(find, replace)| (find.clone(), replace.clone()))
        .collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    ordered
}

fn copy_and_shade(
    root: &Path,
    mappings: &[(String, String)],
    output: &Path,
    log: &mut TaskLog,
) -> Result<bool> {
    let files = paths::gather(root, &|_| true)?;
    if files.is_empty() {
        return Ok(false);
    }

    let mut remaining = files;
    for (find, replace) in mappings {
        let shaded_root = root.join(package_path(find));
        let shaded: Vec<PathBuf> = remaining
            .iter()
            .filter(|f| f.starts_with(&shaded_root))
            .cloned()
            .collect();
        if shaded.is_empty() {
            continue;
        }
        for file in &shaded {
            remaining.remove(file);
        }

        log.line(format!(
            "shading {find:?} -> {replace:?}, {} file(s)",
            shaded.len()
        ));
        let destination = if replace.is_empty() {
            output.to_path_buf()
        } else {
            output.join(package_path(replace))
        };
        let rewrite = |bytes: &[u8], path: &Path| shade_bytes(bytes, path, mappings);
        paths::copy_files(&shaded_root, shaded.iter(), &destination, Some(&rewrite))?;
    }

    log.line(format!("{} other file(s) copied verbatim", remaining.len()));
    paths::copy_files(root, remaining.iter(), output, None)?;
    Ok(true)
}

fn package_path(prefix: &str) -> String {
    prefix.replace('.', "/")
}

/// Applies every mapping's substitutions to files whose extension marks them
/// as carrying package references; everything else copies untouched.
fn shade_bytes(bytes: &[u8], path: &Path, mappings: &[(String, String)]) -> Vec<u8> {
    if !(paths::is_java_file(path) || paths::is_javascript_file(path) || paths::is_class_file(path))
    {
        return bytes.to_vec();
    }
    let mut current = bytes.to_vec();
    for (find, replace) in mappings {
        for (needle, replacement) in substitutions(find, replace) {
            current = replace_all(&current, needle.as_bytes(), replacement.as_bytes());
        }
    }
    current
}

/// Dot, slash and backslash forms of one mapping.
fn substitutions(find: &str, replace: &str) -> Vec<(String, String)> {
    vec![
        (find.to_string(), replace.to_string()),
        (find.replace('.', "/"), replace.replace('.', "/")),
        (find.replace('.', "\\"), replace.replace('.', "\\")),
    ]
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(replacement);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}
