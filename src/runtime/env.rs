//! Process environment operations.

use std::env;
use std::io;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn current_dir_impl(&self) -> io::Result<PathBuf> {
        env::current_dir()
    }
}
