//! Settings file model for the presenter: graphics backend preferences and XR
//! session options, stored as `settings.toml` in the application's settings
//! directory.
//!
//! Types:
//!
//! - `FrameConfig` is the root document (`version`, `[graphics]`, `[xr]`).
//! - `GraphicsSettings` and `XrSettings` hold the per-section values.
//! - `BackendSetting` and `XrRuntimeSetting` are the string-valued enums.
//!
//! Functions:
//!
//! - `FrameConfig::from_toml_str` / `FrameConfig::load` parse and validate.
//! - `FrameConfig::to_toml_string` writes the document back out.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "settings.toml";
pub const CURRENT_VERSION: u32 = 1;

const VALID_MSAA: [u32; 5] = [1, 2, 4, 8, 16];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialise(#[from] toml::ser::Error),
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendSetting {
    #[default]
    Auto,
    D3d12,
    Metal,
    Vulkan,
    #[serde(alias = "gl")]
    OpenGl,
    #[serde(alias = "gles")]
    OpenGlEs,
    WebGpu,
    Null,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XrRuntimeSetting {
    #[default]
    Auto,
    OpenXr,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub version: u32,
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub xr: XrSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default)]
    pub backend: BackendSetting,
    /// MSAA sample count; `0` means "use the default".
    #[serde(default)]
    pub msaa: u32,
    /// Maximum sampler anisotropy; `0` means "use the default".
    #[serde(default)]
    pub max_anisotropy: u16,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub runtime: XrRuntimeSetting,
    #[serde(default = "default_form_factor")]
    pub form_factor: String,
    #[serde(default = "default_view_configuration")]
    pub view_configuration: String,
    #[serde(default = "default_blend_mode")]
    pub blend_mode: String,
    #[serde(default = "default_app_space")]
    pub app_space: String,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_form_factor() -> String {
    "Hmd".into()
}

fn default_view_configuration() -> String {
    "Stereo".into()
}

fn default_blend_mode() -> String {
    "Opaque".into()
}

fn default_app_space() -> String {
    "Local".into()
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            backend: BackendSetting::Auto,
            msaa: 0,
            max_anisotropy: 0,
            fullscreen: false,
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for XrSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            runtime: XrRuntimeSetting::Auto,
            form_factor: default_form_factor(),
            view_configuration: default_view_configuration(),
            blend_mode: default_blend_mode(),
            app_space: default_app_space(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            graphics: GraphicsSettings::default(),
            xr: XrSettings::default(),
        }
    }
}

impl FrameConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FrameConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Loads `settings.toml` from `dir`, returning defaults when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let path = dir.join(SETTINGS_FILE);
        let contents = self.to_toml_string()?;
        fs::write(&path, contents).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CURRENT_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CURRENT_VERSION}",
                self.version
            )));
        }

        let graphics = &self.graphics;
        if graphics.msaa != 0 && !VALID_MSAA.contains(&graphics.msaa) {
            return Err(ConfigError::Invalid(format!(
                "graphics.msaa must be one of 1, 2, 4, 8, 16 (got {})",
                graphics.msaa
            )));
        }

        if graphics.max_anisotropy > 16 {
            return Err(ConfigError::Invalid(format!(
                "graphics.max_anisotropy must be between 1 and 16 (got {})",
                graphics.max_anisotropy
            )));
        }

        if graphics.width == 0 || graphics.height == 0 {
            return Err(ConfigError::Invalid(
                "graphics.width and graphics.height must be greater than zero".into(),
            ));
        }

        for (field, value) in [
            ("xr.form_factor", &self.xr.form_factor),
            ("xr.view_configuration", &self.xr.view_configuration),
            ("xr.blend_mode", &self.xr.blend_mode),
            ("xr.app_space", &self.xr.app_space),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_full_document() {
        let toml = r#"
version = 1

[graphics]
backend = "vulkan"
msaa = 4
max_anisotropy = 8
fullscreen = true
width = 1920
height = 1080

[xr]
enabled = true
runtime = "simulated"
form_factor = "hmd"
view_configuration = "stereo"
blend_mode = "additive"
app_space = "StageLeftRotated"
"#;

        let config = FrameConfig::from_toml_str(toml).expect("parse config");
        assert_eq!(config.graphics.backend, BackendSetting::Vulkan);
        assert_eq!(config.graphics.msaa, 4);
        assert_eq!(config.graphics.max_anisotropy, 8);
        assert!(config.graphics.fullscreen);
        assert_eq!((config.graphics.width, config.graphics.height), (1920, 1080));
        assert!(config.xr.enabled);
        assert_eq!(config.xr.runtime, XrRuntimeSetting::Simulated);
        assert_eq!(config.xr.blend_mode, "additive");
        assert_eq!(config.xr.app_space, "StageLeftRotated");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = FrameConfig::from_toml_str("version = 1").expect("parse config");
        assert_eq!(config, FrameConfig::default());
        assert_eq!(config.xr.form_factor, "Hmd");
        assert_eq!(config.xr.view_configuration, "Stereo");
        assert_eq!(config.xr.blend_mode, "Opaque");
        assert_eq!(config.xr.app_space, "Local");
    }

    #[test]
    fn backend_aliases_are_accepted() {
        let config = FrameConfig::from_toml_str(
            r#"
version = 1
[graphics]
backend = "gles"
"#,
        )
        .expect("parse config");
        assert_eq!(config.graphics.backend, BackendSetting::OpenGlEs);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = FrameConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("version 2")));
    }

    #[test]
    fn rejects_invalid_msaa() {
        let err = FrameConfig::from_toml_str(
            r#"
version = 1
[graphics]
msaa = 3
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("graphics.msaa")));
    }

    #[test]
    fn rejects_excessive_anisotropy() {
        let err = FrameConfig::from_toml_str(
            r#"
version = 1
[graphics]
max_anisotropy = 32
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("max_anisotropy")));
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = FrameConfig::from_toml_str(
            r#"
version = 1
[graphics]
backend = "glide"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_returns_defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let config = FrameConfig::load(dir.path()).unwrap();
        assert_eq!(config, FrameConfig::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = TempDir::new().unwrap();
        let mut config = FrameConfig::default();
        config.graphics.backend = BackendSetting::Null;
        config.xr.enabled = true;
        config.xr.app_space = "ViewFront".into();
        config.save(dir.path()).unwrap();

        let loaded = FrameConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
