//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over filesystem and process
//! environment access, enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `fs` - File system operations (read, write, directory)
//! - `env` - Process environment (current directory)

mod env;
mod fs;

use std::io;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // File system
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;

    /// Canonicalize a path by resolving all symlinks and returning the
    /// canonical absolute path.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn create_file(&self, path: &Path) -> io::Result<Box<dyn io::Write + Send>>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    // Environment
    fn current_dir(&self) -> io::Result<PathBuf>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.read_to_string_impl(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.is_file_impl(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.canonicalize_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.create_dir_all_impl(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<Box<dyn io::Write + Send>> {
        self.create_file_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.rename_impl(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.remove_file_impl(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        self.current_dir_impl()
    }
}
