//! Directory access for route discovery.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceEntry {
    /// File or directory name.
    pub name: String,
    /// True for directories.
    pub is_dir: bool,
}

/// Read-only view of a directory tree.
pub trait RouteSource {
    /// Lists the entries of `dir`, in any order.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<SourceEntry>>;

    /// Reads a file as UTF-8.
    fn read_file(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl RouteSource for FsSource {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<SourceEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            entries.push(SourceEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// An in-memory tree.
///
/// ```rust
/// use signpost_codegen::{MemorySource, RouteSource};
/// use std::path::Path;
///
/// let source = MemorySource::new()
///     .with_file("app/users/[id]/route.rs", "pub async fn GET() {}")
///     .with_dir("app/empty");
///
/// let names: Vec<_> = source
///     .list_dir(Path::new("app"))
///     .unwrap()
///     .into_iter()
///     .map(|e| e.name)
///     .collect();
/// assert_eq!(names, ["empty", "users"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MemorySource {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and its parent directories.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dirs(parent);
        }
        self.files.insert(path.to_path_buf(), contents.into());
        self
    }

    /// Adds an empty directory and its parents.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.add_dirs(path.as_ref());
        self
    }

    fn add_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl RouteSource for MemorySource {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<SourceEntry>> {
        if !self.dirs.contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ));
        }

        let child_name = |path: &Path| {
            (path.parent() == Some(dir))
                .then(|| path.file_name())
                .flatten()
                .map(|name| name.to_string_lossy().into_owned())
        };

        let dirs = self.dirs.iter().filter_map(|path| {
            child_name(path).map(|name| SourceEntry { name, is_dir: true })
        });
        let files = self.files.keys().filter_map(|path| {
            child_name(path).map(|name| SourceEntry { name, is_dir: false })
        });

        let mut entries: Vec<_> = dirs.chain(files).collect();
        entries.sort();
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_listing() {
        let source = MemorySource::new()
            .with_file("app/route.rs", "")
            .with_file("app/a/b/route.rs", "");

        let entries = source.list_dir(Path::new("app")).unwrap();
        assert_eq!(
            entries,
            vec![
                SourceEntry {
                    name: "a".into(),
                    is_dir: true
                },
                SourceEntry {
                    name: "route.rs".into(),
                    is_dir: false
                },
            ]
        );
        assert!(source.list_dir(Path::new("nope")).is_err());
    }

    #[test]
    fn test_memory_read() {
        let source = MemorySource::new().with_file("app/route.rs", "pub fn GET() {}");
        assert_eq!(
            source.read_file(Path::new("app/route.rs")).unwrap(),
            "pub fn GET() {}"
        );
        assert_eq!(
            source.read_file(Path::new("app/x.rs")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_fs_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("users")).unwrap();
        fs::write(dir.path().join("route.rs"), "pub fn GET() {}").unwrap();

        let mut entries = FsSource.list_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "route.rs");
        assert!(!entries[0].is_dir);
        assert_eq!(entries[1].name, "users");
        assert!(entries[1].is_dir);
    }
}
