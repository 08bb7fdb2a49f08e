//! Resolved package metadata and its manifest rendering.

mod specifier;
mod version;

use serde::{Deserialize, Serialize};

pub use specifier::{Op, Specifier, SpecifierSet};
pub use version::{PreRelease, Version};

use crate::error::Error;

/// Fully resolved metadata for one distributable package.
///
/// Constructed fresh on every build invocation, consumed by the archive
/// writer, never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub description: Option<String>,
    pub long_description: String,
    pub long_description_content_type: String,
    pub packages: Vec<String>,
    pub classifiers: Vec<String>,
    pub requires_python: Option<String>,
}

impl PackageMetadata {
    /// Validate the declared fields against the packaging version scheme.
    ///
    /// `version` and `requires_python` must parse; the strings themselves are
    /// never rewritten.
    pub fn validate(&self) -> Result<(), Error> {
        validate_name(&self.name)?;
        Version::parse(&self.version)?;
        if let Some(requires) = &self.requires_python {
            SpecifierSet::parse(requires)?;
        }
        Ok(())
    }

    /// The `<name>-<version>` stem used for artifact file names and the
    /// archive root directory.
    pub fn archive_stem(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Render the PKG-INFO manifest (Metadata-Version 2.1).
    ///
    /// Field order is fixed; fields with no value are omitted. Discovered
    /// packages are listed as `Provides` entries. The long description
    /// follows the header block verbatim.
    pub fn to_pkg_info(&self) -> String {
        let mut out = String::new();
        header(&mut out, "Metadata-Version", "2.1");
        header(&mut out, "Name", &self.name);
        header(&mut out, "Version", &self.version);
        if let Some(description) = &self.description {
            header(&mut out, "Summary", description);
        }
        if let Some(author) = &self.author {
            header(&mut out, "Author", author);
        }
        if let Some(email) = &self.author_email {
            header(&mut out, "Author-email", email);
        }
        for classifier in &self.classifiers {
            header(&mut out, "Classifier", classifier);
        }
        for package in &self.packages {
            header(&mut out, "Provides", package);
        }
        if let Some(requires) = &self.requires_python {
            header(&mut out, "Requires-Python", requires);
        }
        header(
            &mut out,
            "Description-Content-Type",
            &self.long_description_content_type,
        );
        out.push('\n');
        out.push_str(&self.long_description);
        out
    }
}

fn header(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

/// Distribution names: ASCII alphanumerics plus `.`, `_`, `-`, starting and
/// ending with an alphanumeric.
fn validate_name(name: &str) -> Result<(), Error> {
    let invalid = |reason: &str| Error::MetadataValidation {
        field: "name",
        reason: format!("{name:?}: {reason}"),
    };

    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid(
            "only ASCII letters, digits, '.', '_' and '-' are allowed",
        ));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric())
        || !name.ends_with(|c: char| c.is_ascii_alphanumeric())
    {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}
