//! XR side of the presenter: option parsing, the runtime capability traits,
//! the staged session manager, and the swapchain bridge that feeds runtime
//! images to the render-view orchestrator.

mod error;
mod options;
mod runtime;
mod session;
mod simulated;
mod swapchain;

#[cfg(feature = "openxr")]
mod openxr_runtime;

pub use error::XrError;
pub use options::{
    BlendMode, FormFactor, ParsedXrOptions, Pose, ReferenceSpace, ReferenceSpaceKind,
    ViewConfiguration, XrOptions, XrRuntimeKind, DEFAULT_XR_APP_NAME,
};
pub use runtime::{
    ApiLayer, ConfigView, Fov, FrameTiming, InstanceProperties, LocatedViews, ProjectionView,
    RuntimeEvent, RuntimeExtension, SessionState, ViewConfigurationReport, XrRuntime,
    XrSwapchain, XrSwapchainDesc, XrSwapchainId, XrView,
};
pub use session::{SharedXrSession, XrEvent, XrSessionManager, XrStage, STEREO_VIEW_COUNT};
pub use simulated::{SimulatedConfig, SimulatedControl, SimulatedRuntime};
pub use swapchain::{select_swapchain_format, XrSwapchainBridge, PREFERRED_XR_FORMATS};

#[cfg(feature = "openxr")]
pub use openxr_runtime::OpenXrRuntime;

/// Instantiates the runtime provider named by `kind`.
pub fn create_runtime(kind: XrRuntimeKind) -> Result<Box<dyn XrRuntime>, XrError> {
    match kind {
        XrRuntimeKind::Simulated => Ok(Box::new(SimulatedRuntime::new())),
        XrRuntimeKind::Auto | XrRuntimeKind::OpenXr => load_openxr(),
    }
}

#[cfg(feature = "openxr")]
fn load_openxr() -> Result<Box<dyn XrRuntime>, XrError> {
    Ok(Box::new(OpenXrRuntime::load()?))
}

#[cfg(not(feature = "openxr"))]
fn load_openxr() -> Result<Box<dyn XrRuntime>, XrError> {
    Err(XrError::Unavailable(
        "presenter was built without the `openxr` feature".into(),
    ))
}
