//! Archive writers for distributable artifacts.
//!
//! Writers are deterministic: entries are written in the order given (the
//! build layer sorts them by path), with fixed timestamps and permissions, so
//! an unchanged tree rebuilds to a byte-identical artifact.

mod tar_gz;
mod zip;

use anyhow::{Result, anyhow};
use std::io::Write;

pub use tar_gz::TarGzWriter;
pub use self::zip::ZipWriter;

/// One file destined for the artifact, with its path inside the archive
/// ('/' separated) and full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub data: Vec<u8>,
}

impl Entry {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Entry {
            path: path.into(),
            data: data.into(),
        }
    }
}

/// Artifact format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ArchiveFormat {
    /// Source distribution, `.tar.gz`
    #[default]
    Sdist,
    /// `.zip` archive with the same layout
    Zip,
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveFormat::Sdist => write!(f, "sdist"),
            ArchiveFormat::Zip => write!(f, "zip"),
        }
    }
}

/// Trait for format-specific archive writers
pub trait ArchiveWriter: Send + Sync {
    /// Artifact file name for the given `<name>-<version>` stem
    fn artifact_name(&self, stem: &str) -> String;

    /// Write all entries into `out`
    fn write(&self, entries: &[Entry], out: &mut dyn Write) -> Result<()>;
}

/// Artifact file name for a stem in the given format.
pub fn artifact_name(format: ArchiveFormat, stem: &str) -> String {
    match format {
        ArchiveFormat::Sdist => TarGzWriter.artifact_name(stem),
        ArchiveFormat::Zip => ZipWriter.artifact_name(stem),
    }
}

/// Write entries in the given format, dispatching to the right writer.
pub fn write_archive(format: ArchiveFormat, entries: &[Entry], out: &mut dyn Write) -> Result<()> {
    if entries.is_empty() {
        return Err(anyhow!("refusing to write an empty archive"));
    }
    match format {
        ArchiveFormat::Sdist => TarGzWriter.write(entries, out),
        ArchiveFormat::Zip => ZipWriter.write(entries, out),
    }
}
