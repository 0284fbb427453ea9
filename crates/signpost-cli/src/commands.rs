use anyhow::Context as _;
use signpost_codegen::{BuildOptions, BuildOutcome, GitignoreStatus};
use signpost_config::{ConfigLoader, SignpostConfig};
use std::path::Path;

use crate::BuildArgs;

pub fn build(args: &BuildArgs) -> anyhow::Result<()> {
    let options = prepare(args)?;

    match signpost_codegen::build(&options)? {
        BuildOutcome::Generated {
            file,
            routes,
            gitignore,
        } => {
            tracing::info!(file = %file.display(), routes, "client generated");
            if gitignore == GitignoreStatus::Unavailable {
                tracing::warn!("add signpost_client.rs to your .gitignore");
            }
        }
        BuildOutcome::NoAppDir => {
            tracing::warn!(root = %options.root.display(), "nothing generated");
        }
    }
    Ok(())
}

pub async fn dev(args: &BuildArgs) -> anyhow::Result<()> {
    let options = prepare(args)?;
    signpost_codegen::dev(options)
        .await
        .context("development mode stopped")
}

/// Loads configuration, starts logging and applies the flags.
fn prepare(args: &BuildArgs) -> anyhow::Result<BuildOptions> {
    let config_root = args.root.as_deref().unwrap_or_else(|| Path::new("."));
    let config = ConfigLoader::for_project(config_root)
        .and_then(ConfigLoader::load)
        .with_context(|| format!("failed to load configuration from {}", config_root.display()))?;

    signpost_telemetry::init_logging(&config.logging.to_log_config())
        .context("failed to initialise logging")?;

    Ok(apply_flags(&config, args))
}

fn apply_flags(config: &SignpostConfig, args: &BuildArgs) -> BuildOptions {
    let mut options = BuildOptions::from(&config.codegen);
    if let Some(root) = &args.root {
        options.root.clone_from(root);
    }
    if let Some(base_path) = &args.base_path {
        options.base_path.clone_from(base_path);
    }
    if let Some(base_url) = &args.base_url {
        options.base_url = Some(base_url.clone());
    }
    options.query_cache |= args.query_cache;
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_flags_override_config() {
        let mut config = SignpostConfig::default();
        config.codegen.base_path = "/v1".into();
        config.codegen.query_cache = true;

        let args = BuildArgs {
            root: Some(PathBuf::from("web")),
            base_path: Some("/api".into()),
            base_url: None,
            query_cache: false,
        };
        let options = apply_flags(&config, &args);

        assert_eq!(options.root, PathBuf::from("web"));
        assert_eq!(options.base_path, "/api");
        assert!(options.base_url.is_none());
        assert!(options.query_cache);
    }

    #[test]
    fn test_config_used_without_flags() {
        let config = ConfigLoader::new()
            .with_string(
                "[codegen]\nbase_path = \"/api\"\nbase_url = \"https://api.example.com\"\n",
                "toml",
            )
            .unwrap()
            .load()
            .unwrap();

        let options = apply_flags(&config, &BuildArgs::default());
        assert_eq!(options.root, PathBuf::from("."));
        assert_eq!(options.base_path, "/api");
        assert_eq!(options.base_url.as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn test_build_against_project() {
        let dir = tempfile::tempdir().unwrap();
        let route = dir.path().join("app").join("health");
        std::fs::create_dir_all(&route).unwrap();
        std::fs::write(route.join("route.rs"), "pub async fn GET() {}").unwrap();

        let config = SignpostConfig::default();
        let args = BuildArgs {
            root: Some(dir.path().to_path_buf()),
            ..BuildArgs::default()
        };
        let outcome = signpost_codegen::build(&apply_flags(&config, &args)).unwrap();
        assert!(matches!(outcome, BuildOutcome::Generated { routes: 1, .. }));
    }
}
