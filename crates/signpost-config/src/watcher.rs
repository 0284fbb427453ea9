//! File watching for development mode.
//!
//! [`FileWatcher`] wraps a `notify` watcher and forwards its events through a
//! `tokio` channel. Events are filtered by file name or extension and
//! debounced per path.
//!
//! # Example
//!
//! ```no_run
//! use signpost_config::FileWatcher;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), signpost_config::ConfigError> {
//! let mut watcher = FileWatcher::new()
//!     .with_debounce(Duration::from_millis(200))
//!     .watch_path("app")?
//!     .watch_file_names(&["route.rs"])
//!     .build()?;
//!
//! while let Some(event) = watcher.next().await {
//!     println!("{:?} {}", event.kind, event.path.display());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::ConfigError;

/// A filtered file change.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    /// Path to the changed file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: FileChangeKind,
    /// When the change was seen.
    pub timestamp: Instant,
}

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// File was created.
    Created,
    /// File was modified.
    Modified,
    /// File was deleted.
    Deleted,
}

impl FileChangeKind {
    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(_) => Some(Self::Modified),
            EventKind::Remove(_) => Some(Self::Deleted),
            EventKind::Access(_) | EventKind::Other | EventKind::Any => None,
        }
    }
}

/// Configuration for the file watcher.
#[derive(Debug, Clone)]
pub struct FileWatcherConfig {
    /// Paths to watch (files or directories).
    pub paths: Vec<PathBuf>,
    /// Minimum gap between two events for the same path.
    pub debounce: Duration,
    /// Whether to watch directories recursively.
    pub recursive: bool,
    /// File names to watch (empty = any name).
    pub file_names: HashSet<String>,
    /// File extensions to watch (empty = any extension).
    pub extensions: HashSet<String>,
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            debounce: Duration::from_millis(500),
            recursive: true,
            file_names: HashSet::new(),
            extensions: HashSet::new(),
        }
    }
}

impl FileWatcherConfig {
    fn accepts(&self, path: &Path) -> bool {
        if !self.file_names.is_empty() {
            let named = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.file_names.contains(n));
            if !named {
                return false;
            }
        }
        if !self.extensions.is_empty() {
            let extended = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.extensions.contains(e));
            if !extended {
                return false;
            }
        }
        true
    }
}

/// Builder for [`FileWatcher`].
#[derive(Debug, Default)]
pub struct FileWatcherBuilder {
    config: FileWatcherConfig,
}

impl FileWatcherBuilder {
    /// Create a new file watcher builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce duration. Default is 500ms.
    #[must_use]
    pub fn with_debounce(mut self, duration: Duration) -> Self {
        self.config.debounce = duration;
        self
    }

    /// Add a path to watch.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist.
    pub fn watch_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Path does not exist: {}", path.display()),
            )));
        }
        self.config.paths.push(path.to_path_buf());
        Ok(self)
    }

    /// Add a path to watch, ignoring it if it doesn't exist.
    #[must_use]
    pub fn watch_path_optional<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.config.paths.push(path.to_path_buf());
        }
        self
    }

    /// Set whether to watch directories recursively. Default is true.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Only report files with one of these exact names.
    #[must_use]
    pub fn watch_file_names(mut self, names: &[&str]) -> Self {
        self.config.file_names = names.iter().map(ToString::to_string).collect();
        self
    }

    /// Only report files with one of these extensions.
    #[must_use]
    pub fn watch_extensions(mut self, extensions: &[&str]) -> Self {
        self.config.extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }

    /// Build the file watcher.
    ///
    /// # Errors
    ///
    /// Returns an error if no paths are configured or if the watcher cannot
    /// be created.
    pub fn build(self) -> Result<FileWatcher, ConfigError> {
        if self.config.paths.is_empty() {
            return Err(ConfigError::invalid_config(
                "No paths configured for file watcher",
            ));
        }

        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => tracing::warn!(error = %e, "file watcher error"),
            }
        })
        .map_err(|e| ConfigError::invalid_config(format!("Failed to create file watcher: {e}")))?;

        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        for path in &self.config.paths {
            watcher.watch(path, mode).map_err(|e| {
                ConfigError::Io(std::io::Error::other(format!(
                    "Failed to watch path {}: {e}",
                    path.display()
                )))
            })?;
        }

        Ok(FileWatcher {
            _watcher: watcher,
            rx,
            config: self.config,
            last_event: None,
        })
    }
}

/// Filtered, debounced file change stream.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Event>,
    config: FileWatcherConfig,
    last_event: Option<(PathBuf, Instant)>,
}

impl FileWatcher {
    /// Create a new file watcher builder.
    #[must_use]
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> FileWatcherBuilder {
        FileWatcherBuilder::new()
    }

    /// Waits for the next accepted change.
    ///
    /// Returns `None` once the underlying watcher is gone.
    pub async fn next(&mut self) -> Option<FileChangeEvent> {
        while let Some(event) = self.rx.recv().await {
            if let Some(change) = self.process_event(&event) {
                return Some(change);
            }
        }
        None
    }

    /// Returns a pending accepted change without waiting.
    pub fn try_next(&mut self) -> Option<FileChangeEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if let Some(change) = self.process_event(&event) {
                return Some(change);
            }
        }
        None
    }

    fn process_event(&mut self, event: &Event) -> Option<FileChangeEvent> {
        let kind = FileChangeKind::from_event(&event.kind)?;
        let path = event
            .paths
            .iter()
            .find(|p| self.config.accepts(p))?
            .clone();

        let now = Instant::now();
        if let Some((last_path, last_time)) = &self.last_event {
            if last_path == &path && now.duration_since(*last_time) < self.config.debounce {
                return None;
            }
        }
        self.last_event = Some((path.clone(), now));

        Some(FileChangeEvent {
            path,
            kind,
            timestamp: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    fn detached(config: FileWatcherConfig) -> FileWatcher {
        let dir = TempDir::new().unwrap();
        let mut watcher = FileWatcherBuilder::new()
            .watch_path(dir.path())
            .unwrap()
            .build()
            .unwrap();
        watcher.config = config;
        watcher
    }

    #[test]
    fn test_change_kind_mapping() {
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Create(CreateKind::File)),
            Some(FileChangeKind::Created)
        );
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Modify(ModifyKind::Data(DataChange::Any))),
            Some(FileChangeKind::Modified)
        );
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Remove(RemoveKind::File)),
            Some(FileChangeKind::Deleted)
        );
        assert_eq!(FileChangeKind::from_event(&EventKind::Any), None);
    }

    #[test]
    fn test_default_config() {
        let config = FileWatcherConfig::default();
        assert!(config.paths.is_empty());
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert!(config.recursive);
        assert!(config.file_names.is_empty());
    }

    #[test]
    fn test_file_name_filter() {
        let config = FileWatcherConfig {
            file_names: ["route.rs".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert!(config.accepts(Path::new("app/users/route.rs")));
        assert!(!config.accepts(Path::new("app/users/mod.rs")));
    }

    #[test]
    fn test_extension_filter() {
        let config = FileWatcherConfig {
            extensions: ["toml".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert!(config.accepts(Path::new("signpost.toml")));
        assert!(!config.accepts(Path::new("README")));
    }

    #[test]
    fn test_debounce_same_path() {
        let mut watcher = detached(FileWatcherConfig {
            debounce: Duration::from_secs(60),
            ..Default::default()
        });

        let modify = || EventKind::Modify(ModifyKind::Data(DataChange::Any));
        assert!(watcher.process_event(&event(modify(), "a/route.rs")).is_some());
        assert!(watcher.process_event(&event(modify(), "a/route.rs")).is_none());
        assert!(watcher.process_event(&event(modify(), "b/route.rs")).is_some());
    }

    #[test]
    fn test_access_events_ignored() {
        let mut watcher = detached(FileWatcherConfig::default());
        let access = EventKind::Access(notify::event::AccessKind::Any);
        assert!(watcher.process_event(&event(access, "a/route.rs")).is_none());
    }

    #[test]
    fn test_watch_path_not_found() {
        let err = FileWatcherBuilder::new()
            .watch_path("/nonexistent/path")
            .unwrap_err();
        match err {
            ConfigError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_watch_path_optional_not_found() {
        let builder = FileWatcherBuilder::new().watch_path_optional("/nonexistent/path");
        assert!(builder.config.paths.is_empty());
    }

    #[test]
    fn test_build_no_paths() {
        let err = FileWatcherBuilder::new().build().err().unwrap();
        assert!(err.to_string().contains("No paths configured"));
    }

    #[tokio::test]
    async fn test_file_change_detection() {
        let dir = TempDir::new().unwrap();
        let route = dir.path().join("route.rs");
        fs::write(&route, "pub fn GET() {}").unwrap();
        let canonical = route.canonicalize().unwrap();

        let mut watcher = FileWatcher::new()
            .with_debounce(Duration::from_millis(50))
            .watch_path(dir.path())
            .unwrap()
            .watch_file_names(&["route.rs"])
            .build()
            .unwrap();

        sleep(Duration::from_millis(100)).await;
        fs::write(&route, "pub fn POST() {}").unwrap();

        // File system events can be unreliable in CI, so a timeout is tolerated.
        if let Ok(Some(event)) = timeout(Duration::from_secs(2), watcher.next()).await {
            let seen = event.path.canonicalize().unwrap_or(event.path);
            assert_eq!(seen, canonical);
        }
    }
}
