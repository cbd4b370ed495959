//! Backend enumeration and the fallback loop that picks the first one that
//! initialises.

use crate::error::GfxError;
use crate::types::BackendKind;
use crate::xr::RuntimeExtension;

pub const XR_VULKAN_EXTENSION: &str = "XR_KHR_vulkan_enable2";
pub const XR_D3D12_EXTENSION: &str = "XR_KHR_D3D12_enable";
pub const XR_OPENGL_EXTENSION: &str = "XR_KHR_opengl_enable";
pub const XR_OPENGLES_EXTENSION: &str = "XR_KHR_opengl_es_enable";

/// Backends compiled for this target, most preferred first. D3D12 is never
/// chosen automatically; request it explicitly.
pub fn available_backends() -> Vec<BackendKind> {
    let mut backends = Vec::new();
    if cfg!(target_arch = "wasm32") {
        backends.push(BackendKind::WebGPU);
        backends.push(BackendKind::OpenGLES);
    } else if cfg!(any(target_os = "macos", target_os = "ios")) {
        backends.push(BackendKind::Metal);
    } else if cfg!(target_os = "android") {
        backends.push(BackendKind::Vulkan);
        backends.push(BackendKind::OpenGLES);
    } else {
        backends.push(BackendKind::Vulkan);
        backends.push(BackendKind::OpenGL);
    }
    backends.push(BackendKind::Null);
    backends
}

/// Order in which backends are attempted: the desired one first (unless
/// `Auto`), then the rest of `available` without repeats.
pub fn attempt_order(desired: BackendKind, available: &[BackendKind]) -> Vec<BackendKind> {
    let mut order = Vec::with_capacity(available.len() + 1);
    if desired != BackendKind::Auto {
        order.push(desired);
    }
    for kind in available {
        if *kind != BackendKind::Auto && !order.contains(kind) {
            order.push(*kind);
        }
    }
    order
}

/// Runs `attempt` for each backend in [`attempt_order`] until one succeeds.
/// A fatal error ends the search immediately.
pub fn select_backend<T>(
    desired: BackendKind,
    available: &[BackendKind],
    mut attempt: impl FnMut(BackendKind) -> Result<T, GfxError>,
) -> Result<(BackendKind, T), GfxError> {
    let mut tried = Vec::new();
    for kind in attempt_order(desired, available) {
        tracing::info!(backend = %kind, "trying graphics backend");
        match attempt(kind) {
            Ok(value) => return Ok((kind, value)),
            Err(err) if err.is_fatal() => {
                tracing::error!(backend = %kind, error = %err, "fatal error during backend initialization");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(backend = %kind, error = %err, "graphics backend failed to initialize");
                tried.push(kind);
            }
        }
    }
    tracing::error!(?tried, "no graphics backend available");
    Err(GfxError::NoBackendAvailable { tried })
}

/// XR instance extensions the graphics binding for `kind` needs. `Auto`
/// asks for every binding extension; filter with [`supported_extensions`].
pub fn xr_extensions_for(kind: BackendKind) -> Vec<&'static str> {
    match kind {
        BackendKind::Vulkan => vec![XR_VULKAN_EXTENSION],
        BackendKind::D3D12 => vec![XR_D3D12_EXTENSION],
        BackendKind::OpenGL => vec![XR_OPENGL_EXTENSION],
        BackendKind::OpenGLES => vec![XR_OPENGLES_EXTENSION],
        BackendKind::Auto => vec![
            XR_VULKAN_EXTENSION,
            XR_D3D12_EXTENSION,
            XR_OPENGL_EXTENSION,
            XR_OPENGLES_EXTENSION,
        ],
        BackendKind::Metal | BackendKind::WebGPU | BackendKind::Null => Vec::new(),
    }
}

/// The subset of `wanted` the runtime advertises.
pub fn supported_extensions(
    wanted: &[&'static str],
    available: &[RuntimeExtension],
) -> Vec<&'static str> {
    wanted
        .iter()
        .copied()
        .filter(|name| available.iter().any(|ext| ext.name == *name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_backends_end_with_null_and_skip_d3d12() {
        let backends = available_backends();
        assert_eq!(backends.last(), Some(&BackendKind::Null));
        assert!(!backends.contains(&BackendKind::D3D12));
        assert!(!backends.contains(&BackendKind::Auto));
    }

    #[test]
    fn desired_backend_goes_first_once() {
        let available = [BackendKind::Vulkan, BackendKind::OpenGL, BackendKind::Null];
        assert_eq!(
            attempt_order(BackendKind::OpenGL, &available),
            vec![BackendKind::OpenGL, BackendKind::Vulkan, BackendKind::Null]
        );
        assert_eq!(attempt_order(BackendKind::Auto, &available), available.to_vec());
        assert_eq!(
            attempt_order(BackendKind::D3D12, &available)[0],
            BackendKind::D3D12
        );
    }

    #[test]
    fn first_success_wins() {
        let available = [BackendKind::Vulkan, BackendKind::OpenGL, BackendKind::Null];
        let mut attempts = Vec::new();
        let (kind, value) = select_backend(BackendKind::Auto, &available, |kind| {
            attempts.push(kind);
            if kind == BackendKind::Null {
                Ok(7)
            } else {
                Err(GfxError::NoAdapter { backend: kind })
            }
        })
        .unwrap();
        assert_eq!(kind, BackendKind::Null);
        assert_eq!(value, 7);
        assert_eq!(attempts, available.to_vec());
    }

    #[test]
    fn exhausting_candidates_lists_every_attempt() {
        let err = select_backend::<()>(
            BackendKind::Metal,
            &[BackendKind::Null],
            |kind| Err(GfxError::UnsupportedBackend(kind)),
        )
        .unwrap_err();
        match err {
            GfxError::NoBackendAvailable { tried } => {
                assert_eq!(tried, vec![BackendKind::Metal, BackendKind::Null])
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn fatal_errors_stop_the_search() {
        let mut attempts = 0;
        let err = select_backend::<()>(
            BackendKind::Auto,
            &[BackendKind::Vulkan, BackendKind::Null],
            |_| {
                attempts += 1;
                Err(GfxError::Xr(crate::xr::XrError::TrackingLost {
                    position: false,
                    orientation: false,
                }))
            },
        )
        .unwrap_err();
        assert_eq!(attempts, 1);
        assert!(matches!(err, GfxError::Xr(_)));
    }

    #[test]
    fn xr_extensions_follow_backend() {
        assert_eq!(xr_extensions_for(BackendKind::Vulkan), vec![XR_VULKAN_EXTENSION]);
        assert!(xr_extensions_for(BackendKind::Null).is_empty());
        let available = [RuntimeExtension {
            name: XR_OPENGL_EXTENSION.into(),
            version: 1,
        }];
        assert_eq!(
            supported_extensions(&xr_extensions_for(BackendKind::Auto), &available),
            vec![XR_OPENGL_EXTENSION]
        );
    }
}
