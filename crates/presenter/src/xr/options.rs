//! Named XR session options and their parsed forms.
//!
//! Option strings are matched case-insensitively; anything unrecognised is a
//! configuration error rather than a silent default.

use std::f32::consts::FRAC_PI_3;

use frameconfig::{XrRuntimeSetting, XrSettings};
use glam::{Quat, Vec3};

use super::XrError;

pub const DEFAULT_XR_APP_NAME: &str = "OpenXR Program";

/// Which XR runtime provider to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XrRuntimeKind {
    /// The OpenXR loader when compiled in.
    #[default]
    Auto,
    OpenXr,
    /// Headless runtime that fabricates stereo views and swapchain images.
    Simulated,
}

impl From<XrRuntimeSetting> for XrRuntimeKind {
    fn from(setting: XrRuntimeSetting) -> Self {
        match setting {
            XrRuntimeSetting::Auto => XrRuntimeKind::Auto,
            XrRuntimeSetting::OpenXr => XrRuntimeKind::OpenXr,
            XrRuntimeSetting::Simulated => XrRuntimeKind::Simulated,
        }
    }
}

/// Raw option strings, parsed when the XR system is initialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrOptions {
    pub app_name: String,
    pub form_factor: String,
    pub view_configuration: String,
    pub environment_blend_mode: String,
    pub app_space: String,
    pub runtime: XrRuntimeKind,
}

impl Default for XrOptions {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_XR_APP_NAME.into(),
            form_factor: "Hmd".into(),
            view_configuration: "Stereo".into(),
            environment_blend_mode: "Opaque".into(),
            app_space: "Local".into(),
            runtime: XrRuntimeKind::Auto,
        }
    }
}

impl XrOptions {
    pub fn from_settings(settings: &XrSettings) -> Self {
        Self {
            form_factor: settings.form_factor.clone(),
            view_configuration: settings.view_configuration.clone(),
            environment_blend_mode: settings.blend_mode.clone(),
            app_space: settings.app_space.clone(),
            runtime: settings.runtime.into(),
            ..Self::default()
        }
    }
}

fn invalid(option: &'static str, value: &str) -> XrError {
    XrError::Config {
        option,
        value: value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFactor {
    HeadMounted,
    Handheld,
}

impl FormFactor {
    pub fn parse(value: &str) -> Result<Self, XrError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hmd" => Ok(FormFactor::HeadMounted),
            "handheld" => Ok(FormFactor::Handheld),
            _ => Err(invalid("form_factor", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewConfiguration {
    Mono,
    Stereo,
}

impl ViewConfiguration {
    pub fn parse(value: &str) -> Result<Self, XrError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mono" => Ok(ViewConfiguration::Mono),
            "stereo" => Ok(ViewConfiguration::Stereo),
            _ => Err(invalid("view_configuration", value)),
        }
    }

    pub fn view_count(self) -> usize {
        match self {
            ViewConfiguration::Mono => 1,
            ViewConfiguration::Stereo => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
    Additive,
    AlphaBlend,
}

impl BlendMode {
    pub fn parse(value: &str) -> Result<Self, XrError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "opaque" => Ok(BlendMode::Opaque),
            "additive" => Ok(BlendMode::Additive),
            "alphablend" => Ok(BlendMode::AlphaBlend),
            _ => Err(invalid("environment_blend_mode", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpaceKind {
    View,
    Local,
    Stage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub orientation: Quat,
    pub position: Vec3,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        orientation: Quat::IDENTITY,
        position: Vec3::ZERO,
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            orientation: Quat::IDENTITY,
            position: Vec3::new(x, y, z),
        }
    }

    pub fn rotate_ccw_about_y(radians: f32, position: Vec3) -> Self {
        Self {
            orientation: Quat::from_axis_angle(Vec3::Y, radians),
            position,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Application reference space: the base space plus an offset pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceSpace {
    pub kind: ReferenceSpaceKind,
    pub pose: Pose,
}

impl ReferenceSpace {
    /// Resolves one of the named presets (`View`, `ViewFront`, `Local`, `Stage`,
    /// `StageLeft`, `StageRight`, `StageLeftRotated`, `StageRightRotated`).
    pub fn preset(name: &str) -> Result<Self, XrError> {
        let (kind, pose) = match name.trim().to_ascii_lowercase().as_str() {
            "view" => (ReferenceSpaceKind::View, Pose::IDENTITY),
            "viewfront" => (ReferenceSpaceKind::View, Pose::translation(0.0, 0.0, -2.0)),
            "local" => (ReferenceSpaceKind::Local, Pose::IDENTITY),
            "stage" => (ReferenceSpaceKind::Stage, Pose::IDENTITY),
            "stageleft" => (
                ReferenceSpaceKind::Stage,
                Pose::rotate_ccw_about_y(0.0, Vec3::new(-2.0, 0.0, -2.0)),
            ),
            "stageright" => (
                ReferenceSpaceKind::Stage,
                Pose::rotate_ccw_about_y(0.0, Vec3::new(2.0, 0.0, -2.0)),
            ),
            "stageleftrotated" => (
                ReferenceSpaceKind::Stage,
                Pose::rotate_ccw_about_y(FRAC_PI_3, Vec3::new(-2.0, 0.5, -2.0)),
            ),
            "stagerightrotated" => (
                ReferenceSpaceKind::Stage,
                Pose::rotate_ccw_about_y(-FRAC_PI_3, Vec3::new(2.0, 0.5, -2.0)),
            ),
            _ => return Err(invalid("app_space", name)),
        };
        Ok(Self { kind, pose })
    }
}

/// Everything `initialize_system` needs, parsed in one step so a bad string
/// fails before any runtime call is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedXrOptions {
    pub form_factor: FormFactor,
    pub view_configuration: ViewConfiguration,
    pub blend_mode: BlendMode,
    pub app_space: ReferenceSpace,
}

impl ParsedXrOptions {
    pub fn parse(options: &XrOptions) -> Result<Self, XrError> {
        Ok(Self {
            form_factor: FormFactor::parse(&options.form_factor)?,
            view_configuration: ViewConfiguration::parse(&options.view_configuration)?,
            blend_mode: BlendMode::parse(&options.environment_blend_mode)?,
            app_space: ReferenceSpace::preset(&options.app_space)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enums_case_insensitively() {
        assert_eq!(FormFactor::parse("HMD").unwrap(), FormFactor::HeadMounted);
        assert_eq!(FormFactor::parse("handHeld").unwrap(), FormFactor::Handheld);
        assert_eq!(
            ViewConfiguration::parse("stereo").unwrap(),
            ViewConfiguration::Stereo
        );
        assert_eq!(ViewConfiguration::parse("MONO").unwrap().view_count(), 1);
        assert_eq!(BlendMode::parse("alphablend").unwrap(), BlendMode::AlphaBlend);
        assert_eq!(BlendMode::parse("Additive").unwrap(), BlendMode::Additive);
    }

    #[test]
    fn unknown_strings_are_config_errors() {
        let err = FormFactor::parse("glasses").unwrap_err();
        assert!(
            matches!(err, XrError::Config { option: "form_factor", ref value } if value == "glasses")
        );
        assert!(ViewConfiguration::parse("quad").is_err());
        assert!(BlendMode::parse("multiply").is_err());
        assert!(ReferenceSpace::preset("Ceiling").is_err());
    }

    #[test]
    fn view_front_is_offset_two_units() {
        let space = ReferenceSpace::preset("viewfront").unwrap();
        assert_eq!(space.kind, ReferenceSpaceKind::View);
        assert_eq!(space.pose.orientation, Quat::IDENTITY);
        assert_eq!(space.pose.position, Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn stage_presets_place_the_origin() {
        let left = ReferenceSpace::preset("StageLeft").unwrap();
        assert_eq!(left.kind, ReferenceSpaceKind::Stage);
        assert_eq!(left.pose.position, Vec3::new(-2.0, 0.0, -2.0));
        assert!(left.pose.orientation.abs_diff_eq(Quat::IDENTITY, 1e-6));

        let right = ReferenceSpace::preset("StageRight").unwrap();
        assert_eq!(right.pose.position, Vec3::new(2.0, 0.0, -2.0));
    }

    #[test]
    fn rotated_stage_presets_turn_about_up_axis() {
        let left = ReferenceSpace::preset("StageLeftRotated").unwrap();
        let right = ReferenceSpace::preset("StageRightRotated").unwrap();
        assert_eq!(left.pose.position, Vec3::new(-2.0, 0.5, -2.0));
        assert_eq!(right.pose.position, Vec3::new(2.0, 0.5, -2.0));

        let (axis, angle) = left.pose.orientation.to_axis_angle();
        assert!(axis.abs_diff_eq(Vec3::Y, 1e-5));
        assert!((angle - FRAC_PI_3).abs() < 1e-5);

        let forward = right.pose.orientation * Vec3::NEG_Z;
        let expected = Quat::from_rotation_y(-FRAC_PI_3) * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn defaults_parse_cleanly() {
        let parsed = ParsedXrOptions::parse(&XrOptions::default()).unwrap();
        assert_eq!(parsed.form_factor, FormFactor::HeadMounted);
        assert_eq!(parsed.view_configuration, ViewConfiguration::Stereo);
        assert_eq!(parsed.blend_mode, BlendMode::Opaque);
        assert_eq!(parsed.app_space.kind, ReferenceSpaceKind::Local);
    }
}
