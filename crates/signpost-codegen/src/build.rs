//! One full discovery and generation pass over a project.

use signpost_config::CodegenSection;
use std::fs;
use std::path::{Path, PathBuf};

use crate::discover::discover;
use crate::error::CodegenError;
use crate::generate::{generate, GenerateOptions};
use crate::source::FsSource;

/// Name of the generated file, written into the app directory.
pub const CLIENT_FILE_NAME: &str = "signpost_client.rs";

/// Block appended to `.gitignore` when the entry is missing.
pub const GITIGNORE_BLOCK: &str = "\n\n# Added by signpost automatically\nsignpost_client.rs\n";

/// Settings for [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Project root holding `app/` or `src/app/`.
    pub root: PathBuf,
    /// Prefix for every generated URL.
    pub base_path: String,
    /// Fixed absolute origin for generated calls.
    pub base_url: Option<String>,
    /// Emit query and mutation wrappers.
    pub query_cache: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&CodegenSection::default())
    }
}

impl From<&CodegenSection> for BuildOptions {
    fn from(section: &CodegenSection) -> Self {
        Self {
            root: section.root.clone(),
            base_path: section.base_path.clone(),
            base_url: section.base_url.clone(),
            query_cache: section.query_cache,
        }
    }
}

impl BuildOptions {
    /// Options for the project at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets the URL prefix.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the fixed origin.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Enables the query and mutation wrappers.
    pub fn with_query_cache(mut self, enabled: bool) -> Self {
        self.query_cache = enabled;
        self
    }

    fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            base_url: self.base_url.clone(),
            query_cache: self.query_cache,
        }
    }
}

/// State of the ignore rule after a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitignoreStatus {
    /// The block was appended.
    Added,
    /// The entry was already there.
    AlreadyPresent,
    /// `.gitignore` is missing or could not be written.
    Unavailable,
}

/// What a build did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The client file was written.
    Generated {
        /// Path of the written file.
        file: PathBuf,
        /// Number of routes in it.
        routes: usize,
        /// Ignore rule state.
        gitignore: GitignoreStatus,
    },
    /// Neither `app/` nor `src/app/` exists.
    NoAppDir,
}

/// Returns `{root}/app`, else `{root}/src/app`, if either is a directory.
pub fn find_app_dir(root: &Path) -> Option<PathBuf> {
    [root.join("app"), root.join("src").join("app")]
        .into_iter()
        .find(|dir| dir.is_dir())
}

/// Discovers routes and writes the client file.
///
/// # Errors
///
/// Fails on an invalid base URL, an unreadable app directory, or a failed
/// write. A missing `.gitignore` is not an error.
pub fn build(options: &BuildOptions) -> Result<BuildOutcome, CodegenError> {
    let Some(app_dir) = find_app_dir(&options.root) else {
        tracing::info!(root = %options.root.display(), "Could not find app or src/app directory");
        return Ok(BuildOutcome::NoAppDir);
    };

    let discovery = discover(&FsSource, &app_dir, &options.base_path)?;
    let code = generate(&discovery.paths, &options.generate_options())?;

    let file = app_dir.join(CLIENT_FILE_NAME);
    fs::write(&file, code).map_err(|e| CodegenError::io(&file, e))?;
    let gitignore = ensure_gitignore(&options.root);

    tracing::info!(
        file = %file.display(),
        routes = discovery.paths.len(),
        "Generated signpost_client.rs"
    );

    Ok(BuildOutcome::Generated {
        file,
        routes: discovery.paths.len(),
        gitignore,
    })
}

/// Makes sure `{root}/.gitignore` lists the generated file.
pub fn ensure_gitignore(root: &Path) -> GitignoreStatus {
    let path = root.join(".gitignore");
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(error = %e, "Could not modify .gitignore. Maybe it doesn't exist?");
            return GitignoreStatus::Unavailable;
        }
    };

    if contents.contains(CLIENT_FILE_NAME) {
        return GitignoreStatus::AlreadyPresent;
    }

    match fs::write(&path, contents + GITIGNORE_BLOCK) {
        Ok(()) => GitignoreStatus::Added,
        Err(e) => {
            tracing::warn!(error = %e, "Could not modify .gitignore. Maybe it doesn't exist?");
            GitignoreStatus::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(app: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let route = dir.path().join(app).join("users").join("[id]");
        fs::create_dir_all(&route).unwrap();
        fs::write(route.join("route.rs"), "pub async fn GET() {}").unwrap();
        dir
    }

    #[test]
    fn test_find_app_dir() {
        let dir = project("src/app");
        assert_eq!(
            find_app_dir(dir.path()),
            Some(dir.path().join("src").join("app"))
        );

        fs::create_dir(dir.path().join("app")).unwrap();
        assert_eq!(find_app_dir(dir.path()), Some(dir.path().join("app")));
    }

    #[test]
    fn test_build_without_app_dir() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = build(&BuildOptions::new(dir.path())).unwrap();
        assert_eq!(outcome, BuildOutcome::NoAppDir);
    }

    #[test]
    fn test_build_writes_client_and_gitignore() {
        let dir = project("app");
        fs::write(dir.path().join(".gitignore"), "target/").unwrap();

        let options = BuildOptions::new(dir.path()).with_base_path("/api/");
        let outcome = build(&options).unwrap();

        let file = dir.path().join("app").join(CLIENT_FILE_NAME);
        assert_eq!(
            outcome,
            BuildOutcome::Generated {
                file: file.clone(),
                routes: 1,
                gitignore: GitignoreStatus::Added,
            }
        );

        let code = fs::read_to_string(file).unwrap();
        assert!(code.contains("\"/api/users/:id\""));

        let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(
            gitignore,
            "target/\n\n# Added by signpost automatically\nsignpost_client.rs\n"
        );
    }

    #[test]
    fn test_gitignore_entry_added_once() {
        let dir = project("app");
        fs::write(dir.path().join(".gitignore"), "").unwrap();

        let options = BuildOptions::new(dir.path());
        build(&options).unwrap();
        let outcome = build(&options).unwrap();

        assert!(matches!(
            outcome,
            BuildOutcome::Generated {
                gitignore: GitignoreStatus::AlreadyPresent,
                ..
            }
        ));
        let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(gitignore.matches(CLIENT_FILE_NAME).count(), 1);
    }

    #[test]
    fn test_missing_gitignore_is_not_fatal() {
        let dir = project("app");
        let outcome = build(&BuildOptions::new(dir.path())).unwrap();
        assert!(matches!(
            outcome,
            BuildOutcome::Generated {
                gitignore: GitignoreStatus::Unavailable,
                ..
            }
        ));
        assert!(!dir.path().join(".gitignore").exists());
    }

    #[test]
    fn test_invalid_base_url_is_fatal() {
        let dir = project("app");
        let options = BuildOptions::new(dir.path()).with_base_url("https://x.dev/");
        assert!(matches!(
            build(&options),
            Err(CodegenError::BaseUrlTrailingSlash)
        ));
        assert!(!dir.path().join("app").join(CLIENT_FILE_NAME).exists());
    }

    #[test]
    fn test_options_from_section() {
        let section = CodegenSection {
            root: PathBuf::from("web"),
            base_path: "/api".into(),
            base_url: Some("https://example.com".into()),
            query_cache: true,
        };
        let options = BuildOptions::from(&section);
        assert_eq!(options.root, PathBuf::from("web"));
        assert_eq!(options.base_url.as_deref(), Some("https://example.com"));
        assert!(options.query_cache);
    }
}
