//! Error taxonomy for descriptor resolution and artifact builds.
//!
//! Every error here is fatal to the build step: there is no retry and no
//! partial artifact. The CLI layer wraps these in `anyhow` for reporting.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while resolving a package descriptor.
#[derive(Debug, Error)]
pub enum Error {
    /// A declared input file (descriptor or readme) does not exist.
    #[error("resource not found: {}", path.display())]
    ResourceNotFound { path: PathBuf },

    /// The resource exists but could not be read in full.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Package discovery found entries that alias or duplicate each other.
    #[error("conflicting package entries: {}", entries.join(", "))]
    DiscoveryConflict { entries: Vec<String> },

    /// A metadata field is malformed.
    #[error("invalid {field}: {reason}")]
    MetadataValidation { field: &'static str, reason: String },
}

impl Error {
    /// Classify a failed read of `path`: a missing file is a
    /// [`Error::ResourceNotFound`], anything else a [`Error::Read`].
    pub fn from_read(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::ResourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
