//! The file system as the batch executor sees it.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::RenamerConfig;

/// The two file system operations a batch needs.
///
/// The executor checks `exists` on both ends itself before calling `rename`,
/// so implementations only report genuine failures from `rename`.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Clone, Debug)]
pub struct LocalFileSystem {
    /// Relative paths resolve against this directory instead of the process
    /// working directory.
    base_dir: Option<PathBuf>,
    long_paths: bool,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            long_paths: true,
        }
    }

    pub fn from_config(config: &RenamerConfig) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            long_paths: config.long_paths,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// The path handed to the OS for `path`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let path = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        if self.long_paths {
            extend_long_path(path)
        } else {
            path
        }
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        // A dangling symlink still occupies its name.
        std::fs::symlink_metadata(self.resolve(path)).is_ok()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(self.resolve(from), self.resolve(to))
    }
}

/// Longest path Win32 APIs accept without the verbatim prefix.
#[cfg(windows)]
const MAX_PATH: usize = 260;

#[cfg(windows)]
fn extend_long_path(path: PathBuf) -> PathBuf {
    use std::ffi::OsString;

    let raw = path.as_os_str();
    if !path.is_absolute() || raw.len() < MAX_PATH || raw.to_string_lossy().starts_with(r"\\?\") {
        return path;
    }
    let text = raw.to_string_lossy();
    let mut extended = OsString::new();
    match text.strip_prefix(r"\\") {
        // \\server\share\... becomes \\?\UNC\server\share\...
        Some(unc) => {
            extended.push(r"\\?\UNC\");
            extended.push(unc);
        }
        None => {
            extended.push(r"\\?\");
            extended.push(text.replace('/', r"\"));
        }
    }
    PathBuf::from(extended)
}

#[cfg(not(windows))]
fn extend_long_path(path: PathBuf) -> PathBuf {
    path
}
