//! Adapts the XR runtime's acquire/wait/release image protocol to the
//! presenter's swapchain contract.

use crate::binding::{NextTexture, SwapchainConfig, SwapchainImpl};
use crate::error::GfxError;
use crate::gpu::GpuDevice;

use super::runtime::{XrSwapchain, XrSwapchainDesc};
use super::session::{SharedXrSession, STEREO_VIEW_COUNT};
use super::XrError;

/// Swapchain formats in order of preference.
pub const PREFERRED_XR_FORMATS: [wgpu::TextureFormat; 4] = [
    wgpu::TextureFormat::Bgra8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
];

/// First entry of [`PREFERRED_XR_FORMATS`] the runtime supports.
pub fn select_swapchain_format(available: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    PREFERRED_XR_FORMATS
        .iter()
        .copied()
        .find(|format| available.contains(format))
}

/// One instance serves both eye views; the session's active eye picks the slot.
pub struct XrSwapchainBridge {
    session: SharedXrSession,
    eyes: [Option<Box<dyn XrSwapchain>>; STEREO_VIEW_COUNT],
    acquired: Option<usize>,
}

impl XrSwapchainBridge {
    pub fn new(session: SharedXrSession) -> Self {
        Self {
            session,
            eyes: [None, None],
            acquired: None,
        }
    }

    fn active_eye(&self) -> Result<usize, GfxError> {
        let eye = self.session.borrow().active_view();
        if eye < STEREO_VIEW_COUNT {
            Ok(eye)
        } else {
            Err(GfxError::Swapchain(format!("XR eye index {eye} out of range")))
        }
    }

    fn resolve_format(&self) -> Result<wgpu::TextureFormat, XrError> {
        let available = self.session.borrow().swapchain_formats()?;
        select_swapchain_format(&available).ok_or(XrError::NoSupportedFormat { available })
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired.is_some()
    }
}

impl SwapchainImpl for XrSwapchainBridge {
    fn label(&self) -> &'static str {
        "xr"
    }

    fn configure(&mut self, device: &GpuDevice, config: &SwapchainConfig) -> Result<(), GfxError> {
        let eye = self.active_eye()?;
        if self.acquired == Some(eye) {
            return Err(XrError::Unbalanced("reconfigure while an image is acquired").into());
        }

        let format = self.resolve_format()?;
        if format != config.format {
            tracing::warn!(
                requested = ?config.format,
                selected = ?format,
                "XR runtime format differs from requested swapchain format"
            );
        }

        let mut session = self.session.borrow_mut();
        let desc = XrSwapchainDesc {
            format,
            width: config.width,
            height: config.height,
            // Eyes receive a resolved copy of the frame buffer.
            sample_count: 1,
        };
        let swapchain = session.create_swapchain(device, &desc)?;
        session.register_eye_swapchain(eye, swapchain.id(), config.width, config.height);
        self.eyes[eye] = Some(swapchain);
        Ok(())
    }

    fn next_texture(&mut self) -> Result<NextTexture, GfxError> {
        if self.acquired.is_some() {
            return Err(XrError::Unbalanced("acquire without a matching release").into());
        }
        let eye = self.active_eye()?;
        let Some(swapchain) = self.eyes[eye].as_mut() else {
            return Ok(NextTexture::OutOfDate);
        };

        let index = swapchain.acquire_image()?;
        swapchain.wait_image(None)?;
        let image = swapchain
            .images()
            .get(index as usize)
            .cloned()
            .ok_or_else(|| {
                GfxError::Swapchain(format!("XR runtime returned image index {index} out of range"))
            })?;
        self.acquired = Some(eye);
        Ok(NextTexture::Ready(image))
    }

    fn present(&mut self) -> Result<(), GfxError> {
        let eye = self
            .acquired
            .take()
            .ok_or(XrError::Unbalanced("release without a prior acquire"))?;
        if let Some(swapchain) = self.eyes[eye].as_mut() {
            swapchain.release_image()?;
        }
        self.session.borrow_mut().mark_eye_rendered(eye);
        Ok(())
    }

    fn preferred_format(&mut self) -> Result<wgpu::TextureFormat, GfxError> {
        Ok(self.resolve_format()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::binding::GraphicsBinding;
    use crate::types::BackendKind;
    use crate::xr::{
        SimulatedConfig, SimulatedControl, SimulatedRuntime, XrOptions, XrSessionManager,
    };
    use wgpu::TextureFormat;

    #[test]
    fn format_preference_order_wins_over_runtime_order() {
        let available = [
            TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Rgba8Unorm,
        ];
        assert_eq!(
            select_swapchain_format(&available),
            Some(TextureFormat::Rgba8Unorm)
        );
        assert_eq!(
            select_swapchain_format(&[TextureFormat::Rgba8UnormSrgb, TextureFormat::Bgra8Unorm]),
            Some(TextureFormat::Bgra8Unorm)
        );
        assert_eq!(
            select_swapchain_format(&[TextureFormat::Rgba8UnormSrgb]),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
    }

    #[test]
    fn no_overlap_selects_nothing() {
        assert_eq!(
            select_swapchain_format(&[TextureFormat::Rgba16Float, TextureFormat::Rgb10a2Unorm]),
            None
        );
        assert_eq!(select_swapchain_format(&[]), None);
    }

    fn bridge_with(config: SimulatedConfig) -> (XrSwapchainBridge, SharedXrSession, SimulatedControl) {
        let runtime = SimulatedRuntime::with_config(config);
        let control = runtime.control();
        let mut manager = XrSessionManager::new(XrOptions::default(), Box::new(runtime));
        manager.create_instance(&[]).unwrap();
        manager.initialize_system().unwrap();
        manager
            .initialize_session(&GraphicsBinding::Opaque(BackendKind::Null))
            .unwrap();
        let session = manager.into_shared();
        (XrSwapchainBridge::new(Rc::clone(&session)), session, control)
    }

    fn swapchain_config(bridge: &mut XrSwapchainBridge) -> SwapchainConfig {
        SwapchainConfig {
            format: bridge.preferred_format().unwrap(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            width: 64,
            height: 48,
            present_mode: wgpu::PresentMode::Fifo,
        }
    }

    #[test]
    fn acquire_and_release_stay_balanced() {
        let (mut bridge, _session, control) = bridge_with(SimulatedConfig::default());
        let config = swapchain_config(&mut bridge);
        bridge.configure(&GpuDevice::Null, &config).unwrap();

        assert!(matches!(bridge.next_texture().unwrap(), NextTexture::Ready(_)));
        let err = bridge.next_texture().err().unwrap();
        assert!(matches!(err, GfxError::Xr(XrError::Unbalanced(_))));

        bridge.present().unwrap();
        let err = bridge.present().err().unwrap();
        assert!(matches!(err, GfxError::Xr(XrError::Unbalanced(_))));

        assert_eq!(control.acquires(), 1);
        assert_eq!(control.waits(), 1);
        assert_eq!(control.releases(), 1);
    }

    #[test]
    fn eye_swapchains_are_single_sampled() {
        let (mut bridge, _session, control) = bridge_with(SimulatedConfig {
            recommended_samples: 4,
            ..SimulatedConfig::default()
        });
        let config = swapchain_config(&mut bridge);
        bridge.configure(&GpuDevice::Null, &config).unwrap();

        let desc = control.last_swapchain().unwrap();
        assert_eq!(desc.sample_count, 1);
        assert_eq!((desc.width, desc.height), (64, 48));
    }

    #[test]
    fn present_without_acquire_fails() {
        let (mut bridge, _session, _control) = bridge_with(SimulatedConfig::default());
        assert!(bridge.present().is_err());
    }

    #[test]
    fn unconfigured_eye_reports_out_of_date() {
        let (mut bridge, session, _control) = bridge_with(SimulatedConfig::default());
        let config = swapchain_config(&mut bridge);
        bridge.configure(&GpuDevice::Null, &config).unwrap();

        session.borrow_mut().set_active_view(1);
        assert!(matches!(bridge.next_texture().unwrap(), NextTexture::OutOfDate));
        bridge.configure(&GpuDevice::Null, &config).unwrap();
        assert!(matches!(bridge.next_texture().unwrap(), NextTexture::Ready(_)));
        bridge.present().unwrap();
    }

    #[test]
    fn each_eye_gets_its_own_swapchain() {
        let (mut bridge, session, control) = bridge_with(SimulatedConfig::default());
        let config = swapchain_config(&mut bridge);
        for eye in 0..STEREO_VIEW_COUNT {
            session.borrow_mut().set_active_view(eye);
            bridge.configure(&GpuDevice::Null, &config).unwrap();
        }
        assert_eq!(control.swapchains_created(), 2);
    }

    #[test]
    fn preferred_format_fails_without_overlap() {
        let (mut bridge, _session, _control) = bridge_with(SimulatedConfig {
            swapchain_formats: vec![TextureFormat::Rgba16Float],
            ..SimulatedConfig::default()
        });
        let err = bridge.preferred_format().err().unwrap();
        assert!(matches!(
            err,
            GfxError::Xr(XrError::NoSupportedFormat { .. })
        ));
    }
}
