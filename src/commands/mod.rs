//! Command layer: descriptor resolution and the build/check/show operations.
//!
//! Resolution is one synchronous pass per invocation: load the descriptor,
//! read the readme (at most once), discover packages, validate. A build then
//! assembles the archive entries and writes the artifact; on any failure no
//! artifact is produced.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::archive::{self, ArchiveFormat, Entry};
use crate::descriptor::{DESCRIPTOR_FILE, Descriptor, PackagesSpec, read_long_description};
use crate::discovery::{package_dir, resolve_packages};
use crate::error::Error;
use crate::metadata::PackageMetadata;
use crate::runtime::Runtime;

/// Outcome of descriptor resolution: the declaration, its raw source, and
/// the fully populated metadata.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub descriptor: Descriptor,
    pub descriptor_source: String,
    pub metadata: PackageMetadata,
}

/// Options for [`build`].
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Project directory; defaults to the current directory.
    pub project_dir: Option<PathBuf>,
    /// Output directory; defaults to `<project>/dist`.
    pub out_dir: Option<PathBuf>,
    pub format: ArchiveFormat,
}

/// Resolve the package descriptor of a project directory.
#[tracing::instrument(skip(runtime, project_dir))]
pub fn resolve<R: Runtime>(runtime: &R, project_dir: &Path) -> Result<ResolvedPackage, Error> {
    let (descriptor, descriptor_source) = Descriptor::load(runtime, project_dir)?;
    let long_description = read_long_description(runtime, project_dir, &descriptor.readme)?;
    let packages = resolve_packages(runtime, project_dir, &descriptor.packages)?;

    let metadata = PackageMetadata {
        name: descriptor.name.clone(),
        version: descriptor.version.clone(),
        author: descriptor.author.clone(),
        author_email: descriptor.author_email.clone(),
        description: descriptor.description.clone(),
        long_description,
        long_description_content_type: descriptor.long_description_content_type.clone(),
        packages,
        classifiers: descriptor.classifiers.clone(),
        requires_python: descriptor.requires_python.clone(),
    };
    metadata.validate()?;

    debug!(
        "Resolved {} {} with {} package(s)",
        metadata.name,
        metadata.version,
        metadata.packages.len()
    );
    Ok(ResolvedPackage {
        descriptor,
        descriptor_source,
        metadata,
    })
}

/// Build the distributable artifact and return its path.
#[tracing::instrument(skip(runtime, options))]
pub fn build<R: Runtime>(runtime: &R, options: BuildOptions) -> Result<PathBuf> {
    let project_dir = resolve_project_dir(runtime, options.project_dir)?;
    let resolved = resolve(runtime, &project_dir)?;
    let entries = collect_entries(runtime, &project_dir, &resolved)?;

    let out_dir = options
        .out_dir
        .unwrap_or_else(|| project_dir.join("dist"));
    runtime
        .create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let artifact_name = archive::artifact_name(options.format, &resolved.metadata.archive_stem());
    let artifact_path = out_dir.join(&artifact_name);
    let tmp_path = out_dir.join(format!("{artifact_name}.tmp"));

    // Write to a temporary name and rename, so a failed build leaves no
    // artifact behind.
    let result = {
        let mut out = runtime
            .create_file(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        archive::write_archive(options.format, &entries, &mut *out)
    };
    if let Err(err) = result {
        let _ = runtime.remove_file(&tmp_path);
        return Err(err.context(format!("Failed to write {}", artifact_path.display())));
    }
    runtime
        .rename(&tmp_path, &artifact_path)
        .with_context(|| format!("Failed to move artifact into place at {}", artifact_path.display()))?;

    info!("Built {}", artifact_path.display());
    Ok(artifact_path)
}

/// Resolve and validate the descriptor without writing an artifact.
#[tracing::instrument(skip(runtime, project_dir))]
pub fn check<R: Runtime>(runtime: &R, project_dir: Option<PathBuf>) -> Result<ResolvedPackage> {
    let project_dir = resolve_project_dir(runtime, project_dir)?;
    let resolved = resolve(runtime, &project_dir)?;
    Ok(resolved)
}

/// Resolve the descriptor and render the metadata as pretty JSON.
#[tracing::instrument(skip(runtime, project_dir))]
pub fn show<R: Runtime>(runtime: &R, project_dir: Option<PathBuf>) -> Result<String> {
    let project_dir = resolve_project_dir(runtime, project_dir)?;
    let resolved = resolve(runtime, &project_dir)?;
    serde_json::to_string_pretty(&resolved.metadata).context("Failed to serialize metadata")
}

fn resolve_project_dir<R: Runtime>(runtime: &R, project_dir: Option<PathBuf>) -> Result<PathBuf> {
    match project_dir {
        Some(dir) => Ok(dir),
        None => runtime
            .current_dir()
            .context("Failed to determine current directory"),
    }
}

/// Assemble the archive entries: PKG-INFO, the descriptor, the readme, and
/// every `.py` file of every package. Entries are sorted by path so the
/// artifact layout is deterministic.
fn collect_entries<R: Runtime>(
    runtime: &R,
    project_dir: &Path,
    resolved: &ResolvedPackage,
) -> Result<Vec<Entry>, Error> {
    let stem = resolved.metadata.archive_stem();
    let mut entries = vec![
        Entry::new(
            format!("{stem}/PKG-INFO"),
            resolved.metadata.to_pkg_info(),
        ),
        Entry::new(
            format!("{stem}/{DESCRIPTOR_FILE}"),
            resolved.descriptor_source.clone(),
        ),
        Entry::new(
            format!("{stem}/{}", resolved.descriptor.readme),
            resolved.metadata.long_description.clone(),
        ),
    ];

    let where_ = match &resolved.descriptor.packages {
        PackagesSpec::Find { find } => find.where_.as_str(),
        PackagesSpec::Explicit(_) => ".",
    };
    let prefix = rel_prefix(where_);
    for package in &resolved.metadata.packages {
        let dir = package_dir(project_dir, where_, package);
        if !runtime.is_dir(&dir) {
            return Err(Error::ResourceNotFound { path: dir });
        }
        let mut files = runtime
            .read_dir(&dir)
            .map_err(|err| Error::from_read(&dir, err))?;
        files.sort();

        let package_path = package.replace('.', "/");
        for file in files {
            if !runtime.is_file(&file) {
                continue;
            }
            let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".py") {
                continue;
            }
            let source = runtime
                .read_to_string(&file)
                .map_err(|err| Error::from_read(&file, err))?;
            entries.push(Entry::new(
                format!("{stem}/{prefix}{package_path}/{file_name}"),
                source,
            ));
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn rel_prefix(where_: &str) -> String {
    let trimmed = where_.trim_start_matches("./").trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    const DESCRIPTOR: &str = r#"{
        "name": "model-output-manager",
        "version": "0.0.1",
        "author": "Matthew Farrell",
        "author_email": "msf9@uw.edu",
        "description": "Manager for model output",
        "classifiers": [
            "Programming Language :: Python :: 3",
            "Operating System :: OS Independent"
        ],
        "requires_python": ">=3.6"
    }"#;

    fn write_project(dir: &Path) {
        fs::write(dir.join("pydist.json"), DESCRIPTOR).unwrap();
        fs::write(dir.join("README.md"), "# Model Output Manager\n").unwrap();
        let pkg = dir.join("model_output_manager");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("__init__.py"), "").unwrap();
        fs::write(pkg.join("core.py"), "def run():\n    pass\n").unwrap();
    }

    #[test_log::test]
    fn test_build_writes_artifact() {
        let dir = tempdir().unwrap();
        write_project(dir.path());

        let artifact = build(
            &RealRuntime,
            BuildOptions {
                project_dir: Some(dir.path().to_path_buf()),
                ..BuildOptions::default()
            },
        )
        .unwrap();

        assert_eq!(
            artifact,
            dir.path().join("dist/model-output-manager-0.0.1.tar.gz")
        );
        assert!(artifact.is_file());
        // No temporary leftovers
        let dist: Vec<_> = fs::read_dir(dir.path().join("dist")).unwrap().collect();
        assert_eq!(dist.len(), 1);
    }

    #[test]
    fn test_build_missing_readme_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        write_project(dir.path());
        fs::remove_file(dir.path().join("README.md")).unwrap();

        let err = build(
            &RealRuntime,
            BuildOptions {
                project_dir: Some(dir.path().to_path_buf()),
                ..BuildOptions::default()
            },
        )
        .unwrap_err();

        assert!(err.to_string().contains("resource not found"));
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_build_twice_is_byte_identical() {
        let dir = tempdir().unwrap();
        write_project(dir.path());
        let options = || BuildOptions {
            project_dir: Some(dir.path().to_path_buf()),
            ..BuildOptions::default()
        };

        let first = build(&RealRuntime, options()).unwrap();
        let first_bytes = fs::read(&first).unwrap();
        let second = build(&RealRuntime, options()).unwrap();
        let second_bytes = fs::read(&second).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_resolve_populates_metadata() {
        let dir = tempdir().unwrap();
        write_project(dir.path());

        let resolved = resolve(&RealRuntime, dir.path()).unwrap();
        assert_eq!(resolved.metadata.name, "model-output-manager");
        assert_eq!(resolved.metadata.version, "0.0.1");
        assert_eq!(resolved.metadata.packages, vec!["model_output_manager"]);
        assert_eq!(
            resolved.metadata.long_description,
            "# Model Output Manager\n"
        );
        assert_eq!(resolved.metadata.requires_python.as_deref(), Some(">=3.6"));
        assert_eq!(resolved.descriptor_source, DESCRIPTOR);
    }

    #[test]
    fn test_show_renders_json() {
        let dir = tempdir().unwrap();
        write_project(dir.path());

        let json = show(&RealRuntime, Some(dir.path().to_path_buf())).unwrap();
        let metadata: PackageMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata.name, "model-output-manager");
        assert_eq!(metadata.packages, vec!["model_output_manager"]);
    }

    #[test]
    fn test_check_missing_descriptor() {
        let dir = tempdir().unwrap();
        let err = check(&RealRuntime, Some(dir.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("resource not found"));
    }

    #[test]
    fn test_check_defaults_to_current_dir() {
        let mut runtime = MockRuntime::new();
        crate::test_utils::configure_mock_runtime_basics(&mut runtime);
        runtime
            .expect_read_to_string()
            .returning(|_| Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing")));

        let err = check(&runtime, None).unwrap_err();
        let expected = crate::test_utils::test_project_dir().join("pydist.json");
        assert!(err.to_string().contains(&expected.display().to_string()));
    }

    #[test]
    fn test_readme_read_at_most_once_when_discovery_conflicts() {
        let mut runtime = MockRuntime::new();
        let project_dir = crate::test_utils::test_project_dir();

        runtime
            .expect_read_to_string()
            .with(eq(project_dir.join("pydist.json")))
            .times(1)
            .returning(|_| Ok(r#"{ "name": "thing", "version": "1.0" }"#.to_string()));
        runtime
            .expect_read_to_string()
            .with(eq(project_dir.join("README.md")))
            .times(1)
            .returning(|_| Ok("readme".to_string()));

        // Two aliased package directories
        runtime.expect_is_dir().returning(|_| true);
        runtime
            .expect_read_dir()
            .with(eq(project_dir.clone()))
            .returning(|p| Ok(vec![p.join("real"), p.join("alias")]));
        runtime
            .expect_read_dir()
            .with(eq(project_dir.join("real")))
            .returning(|_| Ok(vec![]));
        runtime
            .expect_read_dir()
            .with(eq(project_dir.join("alias")))
            .returning(|_| Ok(vec![]));
        runtime.expect_is_file().returning(|_| true);
        let real = project_dir.join("real");
        runtime
            .expect_canonicalize()
            .returning(move |_| Ok(real.clone()));

        let err = resolve(&runtime, &project_dir).unwrap_err();
        assert!(matches!(err, Error::DiscoveryConflict { .. }));
        runtime.checkpoint();
    }

    #[test]
    fn test_explicit_package_dir_must_exist() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("pydist.json"),
            r#"{ "name": "thing", "version": "1.0", "packages": ["ghost"] }"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "readme").unwrap();

        let err = build(
            &RealRuntime,
            BuildOptions {
                project_dir: Some(dir.path().to_path_buf()),
                ..BuildOptions::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("resource not found"));
    }

    #[test]
    fn test_rel_prefix() {
        assert_eq!(rel_prefix("."), "");
        assert_eq!(rel_prefix("./"), "");
        assert_eq!(rel_prefix("src"), "src/");
        assert_eq!(rel_prefix("./src/"), "src/");
    }
}
