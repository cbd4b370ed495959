//! Turns the settings file and CLI overrides into a `PresenterConfig`.
//!
//! Functions:
//!
//! - `load_settings` reads `settings.toml`, falling back to defaults.
//! - `apply_overrides` folds the numeric and boolean flags into the settings and revalidates.
//! - `presenter_config` builds the presenter bootstrap parameters.
//! - `write_default_settings` backs `viewhost init`.

use anyhow::{bail, Context, Result};
use frameconfig::FrameConfig;
use presenter::PresenterConfig;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn load_settings(paths: &AppPaths) -> Result<FrameConfig> {
    FrameConfig::load(paths.config_dir()).with_context(|| {
        format!(
            "failed to load settings from {}",
            paths.settings_file().display()
        )
    })
}

pub fn apply_overrides(settings: &mut FrameConfig, args: &RunArgs) -> Result<()> {
    let graphics = &mut settings.graphics;
    if let Some(msaa) = args.msaa {
        graphics.msaa = msaa;
    }
    if let Some(anisotropy) = args.anisotropy {
        graphics.max_anisotropy = anisotropy;
    }
    if let Some(size) = args.size {
        graphics.width = size.width;
        graphics.height = size.height;
    }
    graphics.fullscreen |= args.fullscreen;
    settings.xr.enabled |= args.xr;

    settings
        .validate()
        .context("command-line overrides produced invalid settings")
}

pub fn presenter_config(settings: &FrameConfig, args: &RunArgs, paths: &AppPaths) -> PresenterConfig {
    let mut config = PresenterConfig::from_settings(settings);
    if let Some(backend) = args.backend {
        config.desired_backend = backend;
    }
    if let Some(runtime) = args.xr_runtime {
        config.xr.runtime = runtime;
    }
    config.app_name = args.app_name.clone().or_else(|| Some("viewhost".into()));
    config.config_path = Some(paths.config_dir().to_path_buf());
    config
}

pub fn write_default_settings(paths: &AppPaths, force: bool) -> Result<()> {
    let path = paths.settings_file();
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    FrameConfig::default()
        .save(paths.config_dir())
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SurfaceSize;
    use presenter::{BackendKind, XrRuntimeKind};
    use std::fs;
    use tempfile::TempDir;

    fn temp_paths(dir: &TempDir) -> AppPaths {
        AppPaths::discover(Some(dir.path())).unwrap()
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings(&temp_paths(&dir)).unwrap();
        assert_eq!(settings, FrameConfig::default());
    }

    #[test]
    fn broken_settings_mention_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("settings.toml"), "version = [").unwrap();
        let err = load_settings(&temp_paths(&dir)).unwrap_err();
        assert!(format!("{err:#}").contains("settings.toml"));
    }

    #[test]
    fn flags_override_file_values() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("settings.toml"),
            "version = 1\n[graphics]\nbackend = \"vulkan\"\nmsaa = 2\nwidth = 640\nheight = 480\n",
        )
        .unwrap();
        let paths = temp_paths(&dir);
        let mut settings = load_settings(&paths).unwrap();
        let args = RunArgs {
            backend: Some(BackendKind::Null),
            msaa: Some(4),
            size: Some(SurfaceSize {
                width: 800,
                height: 600,
            }),
            xr: true,
            xr_runtime: Some(XrRuntimeKind::Simulated),
            ..RunArgs::default()
        };
        apply_overrides(&mut settings, &args).unwrap();
        let config = presenter_config(&settings, &args, &paths);

        assert_eq!(config.desired_backend, BackendKind::Null);
        assert_eq!(config.msaa, 4);
        assert_eq!((config.window_width, config.window_height), (800, 600));
        assert!(config.start_xr);
        assert_eq!(config.xr.runtime, XrRuntimeKind::Simulated);
        assert_eq!(config.config_path.as_deref(), Some(dir.path()));
        assert_eq!(config.effective_app_name(), "viewhost");
    }

    #[test]
    fn file_backend_survives_without_flag() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("settings.toml"),
            "version = 1\n[graphics]\nbackend = \"vulkan\"\n",
        )
        .unwrap();
        let paths = temp_paths(&dir);
        let settings = load_settings(&paths).unwrap();
        let config = presenter_config(&settings, &RunArgs::default(), &paths);
        assert_eq!(config.desired_backend, BackendKind::Vulkan);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let mut settings = FrameConfig::default();
        let args = RunArgs {
            msaa: Some(3),
            ..RunArgs::default()
        };
        assert!(apply_overrides(&mut settings, &args).is_err());
    }

    #[test]
    fn init_refuses_to_clobber_without_force() {
        let dir = TempDir::new().unwrap();
        let paths = temp_paths(&dir);
        write_default_settings(&paths, false).unwrap();
        assert!(write_default_settings(&paths, false).is_err());
        write_default_settings(&paths, true).unwrap();
        assert_eq!(load_settings(&paths).unwrap(), FrameConfig::default());
    }
}
