//! Readme resolution: the long description is the readme file read verbatim.

use std::path::Path;

use crate::error::Error;
use crate::runtime::Runtime;

/// Read the readme in full. The returned string becomes `long_description`
/// byte-for-byte; rendering is left to downstream tooling.
///
/// The read happens at most once per build and the handle is released on all
/// paths. A missing file is a [`Error::ResourceNotFound`] naming the path.
#[tracing::instrument(skip(runtime, project_dir))]
pub fn read_long_description<R: Runtime>(
    runtime: &R,
    project_dir: &Path,
    readme: &str,
) -> Result<String, Error> {
    let path = project_dir.join(readme);
    runtime
        .read_to_string(&path)
        .map_err(|err| Error::from_read(&path, err))
}
