use crate::gpu::RenderViewType;
use crate::types::BackendKind;
use crate::xr::XrError;

#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    #[error("no {backend} adapter available")]
    NoAdapter { backend: BackendKind },
    #[error("failed to create {backend} device: {source}")]
    RequestDevice {
        backend: BackendKind,
        #[source]
        source: wgpu::RequestDeviceError,
    },
    #[error("backend {0} is not supported on this platform")]
    UnsupportedBackend(BackendKind),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("swapchain error: {0}")]
    Swapchain(String),
    #[error("window error: {0}")]
    Window(String),
    #[error("backend {0} has no XR graphics binding")]
    XrUnsupported(BackendKind),
    #[error("render view {0:?} already exists")]
    DuplicateRenderView(RenderViewType),
    #[error("render view index {index} out of range ({count} views)")]
    InvalidView { index: usize, count: usize },
    #[error("frame order violation: {0}")]
    FrameOrder(&'static str),
    #[error("settings directory unavailable: {0}")]
    Settings(String),
    #[error("no graphics backend could be initialized (tried {tried:?})")]
    NoBackendAvailable { tried: Vec<BackendKind> },
    #[error(transparent)]
    Xr(#[from] XrError),
}

impl GfxError {
    /// Errors the application is expected to abort on rather than retry.
    pub fn is_fatal(&self) -> bool {
        match self {
            GfxError::NoBackendAvailable { .. } | GfxError::FrameOrder(_) => true,
            GfxError::Xr(err) => !matches!(err, XrError::Unavailable(_)),
            _ => false,
        }
    }
}
