//! Package discovery: a pure function of the project tree at build time.
//!
//! A directory is an importable package iff it and every ancestor up to the
//! scan root contains a marker file and every path component is a valid
//! identifier. The result is sorted, so it does not depend on filesystem
//! iteration order.

use glob::Pattern;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::descriptor::{FindSpec, PackagesSpec};
use crate::error::Error;
use crate::runtime::Runtime;

/// Marker file that makes a directory an importable package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Resolve the package list of a descriptor: either validate the explicit
/// declaration or scan the tree.
#[tracing::instrument(skip(runtime, project_dir, spec))]
pub fn resolve_packages<R: Runtime>(
    runtime: &R,
    project_dir: &Path,
    spec: &PackagesSpec,
) -> Result<Vec<String>, Error> {
    match spec {
        PackagesSpec::Explicit(list) => validate_explicit(list),
        PackagesSpec::Find { find } => find_packages(runtime, project_dir, find),
    }
}

/// Scan the tree under `spec.where_` for importable packages.
///
/// Returns the sorted dotted names. Fails with [`Error::DiscoveryConflict`]
/// when two distinct names resolve to the same canonical directory (symlink
/// aliasing).
#[tracing::instrument(skip(runtime, project_dir, spec))]
pub fn find_packages<R: Runtime>(
    runtime: &R,
    project_dir: &Path,
    spec: &FindSpec,
) -> Result<Vec<String>, Error> {
    let root = scan_root(project_dir, &spec.where_);
    if !runtime.is_dir(&root) {
        return Ok(Vec::new());
    }

    let include = compile_patterns(&spec.include)?;
    let exclude = compile_patterns(&spec.exclude)?;

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    collect(runtime, &root, None, &mut found)?;
    found.retain(|(name, _)| selected(name, &include, &exclude));

    // Group by canonical directory to catch aliased entries.
    let mut by_canonical: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for (name, path) in &found {
        let canonical = runtime
            .canonicalize(path)
            .map_err(|err| Error::from_read(path, err))?;
        by_canonical.entry(canonical).or_default().push(name.clone());
    }
    let mut conflicts: Vec<String> = by_canonical
        .into_values()
        .filter(|names| names.len() > 1)
        .flatten()
        .collect();
    if !conflicts.is_empty() {
        conflicts.sort();
        return Err(Error::DiscoveryConflict { entries: conflicts });
    }

    let mut names: Vec<String> = found.into_iter().map(|(name, _)| name).collect();
    names.sort();
    Ok(names)
}

/// Filesystem directory of a dotted package name.
pub fn package_dir(project_dir: &Path, where_: &str, name: &str) -> PathBuf {
    let mut dir = scan_root(project_dir, where_);
    for part in name.split('.') {
        dir.push(part);
    }
    dir
}

fn scan_root(project_dir: &Path, where_: &str) -> PathBuf {
    let trimmed = where_.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        project_dir.to_path_buf()
    } else {
        project_dir.join(trimmed)
    }
}

fn collect<R: Runtime>(
    runtime: &R,
    dir: &Path,
    prefix: Option<&str>,
    found: &mut Vec<(String, PathBuf)>,
) -> Result<(), Error> {
    for entry in runtime
        .read_dir(dir)
        .map_err(|err| Error::from_read(dir, err))?
    {
        if !runtime.is_dir(&entry) {
            continue;
        }
        let Some(component) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_identifier(component) {
            continue;
        }
        if !runtime.is_file(&entry.join(PACKAGE_MARKER)) {
            continue;
        }
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{component}"),
            None => component.to_string(),
        };
        collect(runtime, &entry, Some(&name), found)?;
        found.push((name, entry));
    }
    Ok(())
}

fn validate_explicit(list: &[String]) -> Result<Vec<String>, Error> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for name in list {
        if name.is_empty() || name.split('.').any(|part| !is_identifier(part)) {
            return Err(Error::MetadataValidation {
                field: "packages",
                reason: format!("{name:?} is not a valid package path"),
            });
        }
        if !seen.insert(name.clone()) {
            duplicates.insert(name.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(Error::DiscoveryConflict {
            entries: duplicates.into_iter().collect(),
        });
    }
    Ok(seen.into_iter().collect())
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, Error> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|err| Error::MetadataValidation {
                field: "packages",
                reason: format!("bad pattern {pattern:?}: {err}"),
            })
        })
        .collect()
}

fn selected(name: &str, include: &[Pattern], exclude: &[Pattern]) -> bool {
    let included = include.is_empty() || include.iter().any(|p| p.matches(name));
    included && !exclude.iter().any(|p| p.matches(name))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
