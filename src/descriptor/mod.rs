//! The package descriptor: a static declaration in `pydist.json` at the
//! project root, consumed once per build.

mod readme;

use serde::Deserialize;
use std::path::Path;

pub use readme::read_long_description;

use crate::error::Error;
use crate::runtime::Runtime;

/// Descriptor file name, resolved relative to the project directory.
pub const DESCRIPTOR_FILE: &str = "pydist.json";

fn default_readme() -> String {
    "README.md".to_string()
}

fn default_content_type() -> String {
    "text/markdown".to_string()
}

/// The declared package metadata, before resolution.
///
/// `long_description` and the final package list are not part of the
/// declaration: the readme is read and packages are discovered at build time.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Readme path whose content becomes the long description, relative to
    /// the project directory.
    #[serde(default = "default_readme")]
    pub readme: String,
    #[serde(default = "default_content_type")]
    pub long_description_content_type: String,
    #[serde(default)]
    pub packages: PackagesSpec,
    #[serde(default)]
    pub classifiers: Vec<String>,
    #[serde(default)]
    pub requires_python: Option<String>,
}

/// How the package list is obtained: declared explicitly, or discovered by
/// scanning the project tree.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PackagesSpec {
    /// `"packages": ["a", "a.b"]`
    Explicit(Vec<String>),
    /// `"packages": { "find": { "where": ".", "exclude": ["tests*"] } }`
    Find { find: FindSpec },
}

impl Default for PackagesSpec {
    fn default() -> Self {
        PackagesSpec::Find {
            find: FindSpec::default(),
        }
    }
}

/// Discovery options for [`PackagesSpec::Find`].
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FindSpec {
    /// Directory to scan, relative to the project directory.
    #[serde(default = "default_where", rename = "where")]
    pub where_: String,
    /// Glob patterns matched against dotted names; empty means include all.
    #[serde(default)]
    pub include: Vec<String>,
    /// Glob patterns matched against dotted names; exclusion wins.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_where() -> String {
    ".".to_string()
}

impl Default for FindSpec {
    fn default() -> Self {
        FindSpec {
            where_: default_where(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl Descriptor {
    /// Parse descriptor JSON. `path` is only used in error messages.
    pub fn parse(source: &str, path: &Path) -> Result<Self, Error> {
        serde_json::from_str(source).map_err(|err| Error::MetadataValidation {
            field: "descriptor",
            reason: format!("{}: {err}", path.display()),
        })
    }

    /// Read and parse the descriptor of a project directory, returning the
    /// parsed declaration together with the raw source text.
    #[tracing::instrument(skip(runtime, project_dir))]
    pub fn load<R: Runtime>(runtime: &R, project_dir: &Path) -> Result<(Self, String), Error> {
        let path = project_dir.join(DESCRIPTOR_FILE);
        let source = runtime
            .read_to_string(&path)
            .map_err(|err| Error::from_read(&path, err))?;
        let descriptor = Descriptor::parse(&source, &path)?;
        Ok((descriptor, source))
    }
}
