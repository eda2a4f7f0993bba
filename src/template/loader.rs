//! Where template files come from.

use std::{fs, io};
use std::path::{Path, PathBuf};

use crate::namespace::KeyMap;

/// Reads template sources during file discovery.
///
/// Returning `Ok(None)` means "no such file" and lets discovery try the next
/// candidate path; an `Err` aborts discovery.
pub trait TemplateLoader {
    /// Read the source at `path`.
    fn read(&self, path: &Path) -> io::Result<Option<String>>;
}

/// Reads templates from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl TemplateLoader for FsLoader {
    fn read(&self, path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(source) => Ok(Some(source)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Serves templates from memory, keyed by the path discovery would open.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: KeyMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Add or replace a file.
    pub fn insert<P: Into<PathBuf>, S: Into<String>>(&mut self, path: P, source: S) {
        self.files.insert(path.into(), source.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_file<P: Into<PathBuf>, S: Into<String>>(mut self, path: P, source: S) -> Self {
        self.insert(path, source);
        self
    }
}

impl TemplateLoader for MemoryLoader {
    fn read(&self, path: &Path) -> io::Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }
}
