//! Resolves the settings directory viewhost reads `settings.toml` from.
//!
//! Types:
//!
//! - `AppPaths` captures the resolved directory.
//!
//! Functions:
//!
//! - `AppPaths::discover` applies the precedence explicit flag > `VIEWHOST_CONFIG_DIR` >
//!   platform preferences directory, creating the directory when missing.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;
use frameconfig::SETTINGS_FILE;

pub const ENV_CONFIG_DIR: &str = "VIEWHOST_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "viewhost";
const APPLICATION: &str = "viewhost";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let config_dir = match explicit {
            Some(path) => path.to_path_buf(),
            None => match env_override(ENV_CONFIG_DIR) {
                Some(path) => path,
                None => ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
                    .ok_or_else(|| anyhow!("failed to determine user directories"))?
                    .preference_dir()
                    .to_path_buf(),
            },
        };
        ensure_directory(&config_dir)?;
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            format!(
                "failed to create viewhost settings directory at {}",
                path.display()
            )
        })?;
    }
    Ok(())
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn clear(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_is_created() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let config_dir = root.path().join("nested/config");
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, &config_dir);

        let paths = AppPaths::discover(None).unwrap();

        assert_eq!(paths.config_dir(), config_dir.as_path());
        assert!(config_dir.is_dir());
        assert_eq!(paths.settings_file(), config_dir.join("settings.toml"));
    }

    #[test]
    fn explicit_directory_beats_env() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let from_env = root.path().join("env");
        let explicit = root.path().join("flag");
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, &from_env);

        let paths = AppPaths::discover(Some(&explicit)).unwrap();

        assert_eq!(paths.config_dir(), explicit.as_path());
        assert!(!from_env.exists());
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let _guard = env_lock().lock().unwrap();
        let _config_guard = EnvGuard::clear(ENV_CONFIG_DIR);
        assert!(env_override(ENV_CONFIG_DIR).is_none());
        env::set_var(ENV_CONFIG_DIR, "");
        assert!(env_override(ENV_CONFIG_DIR).is_none());
    }
}
