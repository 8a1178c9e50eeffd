use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, anyhow};
use clap::Parser;
use hostbridge::ViewportMetrics;
use url::Url;

use crate::resources::PackageResources;

#[derive(Parser, Debug, Default)]
#[command(name = "hostbridge-shell", about = "Boots a root execution context for a script")]
pub struct Cli {
    /// Script entry file, or a `package:` uri resolved against the package
    /// root.
    pub entry: Option<String>,

    /// Directory packages are resolved against. Defaults to the entry
    /// file's directory.
    #[arg(long)]
    pub package_root: Option<PathBuf>,

    /// Exit once the root context is set up.
    #[arg(long)]
    pub non_interactive: bool,
}

#[derive(Debug)]
pub struct ShellConfig {
    pub entry: PathBuf,
    pub url: Url,
    pub package_root: PathBuf,
    pub non_interactive: bool,
    pub viewport: ViewportMetrics,
}

impl ShellConfig {
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        Self::resolve_with(cli, |name| std::env::var(name).ok())
    }

    fn resolve_with(cli: Cli, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let entry = cli.entry.context("missing script entry file")?;
        let entry = if entry.starts_with("package:") {
            let root = cli
                .package_root
                .as_deref()
                .context("a package entry requires --package-root")?;
            PackageResources::new(root)
                .resolve(&entry)
                .with_context(|| format!("invalid package uri '{entry}'"))?
        } else {
            PathBuf::from(entry)
        };
        let entry = entry
            .canonicalize()
            .with_context(|| format!("failed to resolve entry file '{}'", entry.display()))?;
        let url = Url::from_file_path(&entry)
            .map_err(|()| anyhow!("entry file '{}' has no file url", entry.display()))?;

        let package_root = match cli.package_root {
            Some(root) => root,
            None => entry
                .parent()
                .map(Path::to_path_buf)
                .context("entry file has no parent directory")?,
        };

        let defaults = ViewportMetrics::default();
        let (physical_width, width_source) =
            env_or_default(&lookup, "HOSTBRIDGE_VIEWPORT_WIDTH", defaults.physical_width);
        let (physical_height, height_source) =
            env_or_default(&lookup, "HOSTBRIDGE_VIEWPORT_HEIGHT", defaults.physical_height);
        let (device_pixel_ratio, ratio_source) = env_or_default(
            &lookup,
            "HOSTBRIDGE_DEVICE_PIXEL_RATIO",
            defaults.device_pixel_ratio,
        );

        tracing::info!(
            entry = %entry.display(),
            package_root = %package_root.display(),
            physical_width,
            width_source,
            physical_height,
            height_source,
            device_pixel_ratio,
            ratio_source,
            "Resolved shell configuration"
        );

        Ok(Self {
            entry,
            url,
            package_root,
            non_interactive: cli.non_interactive,
            viewport: ViewportMetrics {
                physical_width,
                physical_height,
                device_pixel_ratio,
            },
        })
    }
}

fn env_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> (T, &'static str)
where
    T: FromStr + Copy,
    T::Err: std::fmt::Debug,
{
    lookup(name).map_or((default, "default"), |raw| match raw.parse::<T>() {
        Ok(parsed) => (parsed, "env"),
        Err(err) => {
            tracing::warn!(%raw, ?err, "Invalid {name}; falling back to default");
            (default, "default_invalid_env")
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cli_for(entry: &Path) -> Cli {
        Cli {
            entry: Some(entry.display().to_string()),
            ..Cli::default()
        }
    }

    #[test]
    fn defaults_apply_without_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entry = dir.path().join("main.dart");
        std::fs::write(&entry, "void main() {}").expect("write entry");

        let config = ShellConfig::resolve_with(cli_for(&entry), |_| None).expect("config");

        assert_eq!(config.viewport, ViewportMetrics::default());
        assert_eq!(config.url.scheme(), "file");
        assert!(config.url.path().ends_with("/main.dart"));
        assert_eq!(
            config.package_root,
            dir.path().canonicalize().expect("canonical dir")
        );
        assert!(!config.non_interactive);
    }

    #[test]
    fn environment_overrides_and_invalid_values_fall_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entry = dir.path().join("main.dart");
        std::fs::write(&entry, "").expect("write entry");
        let env = HashMap::from([
            ("HOSTBRIDGE_VIEWPORT_WIDTH", "1024"),
            ("HOSTBRIDGE_VIEWPORT_HEIGHT", "tall"),
            ("HOSTBRIDGE_DEVICE_PIXEL_RATIO", "2.5"),
        ]);

        let config = ShellConfig::resolve_with(cli_for(&entry), |name| {
            env.get(name).map(ToString::to_string)
        })
        .expect("config");

        assert_eq!(config.viewport.physical_width, 1024);
        assert_eq!(config.viewport.physical_height, 480);
        assert!((config.viewport.device_pixel_ratio - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_package_root_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entry = dir.path().join("main.dart");
        std::fs::write(&entry, "").expect("write entry");

        let cli = Cli {
            package_root: Some(PathBuf::from("/opt/packages")),
            non_interactive: true,
            ..cli_for(&entry)
        };
        let config = ShellConfig::resolve_with(cli, |_| None).expect("config");

        assert_eq!(config.package_root, PathBuf::from("/opt/packages"));
        assert!(config.non_interactive);
    }

    #[test]
    fn package_entry_resolves_against_package_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("app")).expect("create package");
        std::fs::write(dir.path().join("app").join("main.dart"), "").expect("write entry");

        let cli = Cli {
            entry: Some("package:app/main.dart".to_string()),
            package_root: Some(dir.path().to_path_buf()),
            non_interactive: false,
        };
        let config = ShellConfig::resolve_with(cli, |_| None).expect("config");

        assert!(config.url.path().ends_with("/app/main.dart"));
        assert_eq!(config.package_root, dir.path());

        let cli = Cli {
            entry: Some("package:app/main.dart".to_string()),
            ..Cli::default()
        };
        let err = ShellConfig::resolve_with(cli, |_| None).expect_err("no package root");
        assert_eq!(err.to_string(), "a package entry requires --package-root");
    }

    #[test]
    fn missing_entry_is_an_error() {
        let err = ShellConfig::resolve_with(Cli::default(), |_| None).expect_err("no entry");
        assert_eq!(err.to_string(), "missing script entry file");

        let err = ShellConfig::resolve_with(cli_for(Path::new("/does/not/exist.dart")), |_| None)
            .expect_err("missing file");
        assert!(err.to_string().contains("failed to resolve entry file"));
    }
}
