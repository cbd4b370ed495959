use super::session::XrStage;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum XrError {
    /// A runtime call returned a failure code; `result` is its symbolic name.
    #[error("{call} failed: {result}")]
    Call { call: &'static str, result: String },
    #[error("XR runtime unavailable: {0}")]
    Unavailable(String),
    #[error("invalid XR option {option} = '{value}'")]
    Config { option: &'static str, value: String },
    #[error("{what} '{value}' is not supported by the XR runtime")]
    Unsupported { what: &'static str, value: String },
    #[error("{call} called out of order: requires {expected:?}, session is {actual:?}")]
    Stage {
        call: &'static str,
        expected: XrStage,
        actual: XrStage,
    },
    #[error("XR view tracking lost (position valid: {position}, orientation valid: {orientation})")]
    TrackingLost { position: bool, orientation: bool },
    #[error("expected {expected} XR views, runtime reported {actual}")]
    ViewCountMismatch { expected: usize, actual: usize },
    #[error("no supported XR swapchain format among {available:?}")]
    NoSupportedFormat { available: Vec<wgpu::TextureFormat> },
    #[error("unbalanced XR swapchain call: {0}")]
    Unbalanced(&'static str),
    #[error("graphics binding rejected by the XR runtime: {0}")]
    Binding(String),
}

impl XrError {
    pub(crate) fn call(call: &'static str, result: impl std::fmt::Display) -> Self {
        XrError::Call {
            call,
            result: result.to_string(),
        }
    }
}
