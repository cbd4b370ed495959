//! Frame driver: bootstraps the window, XR session and GPU, then forwards
//! the per-frame calls to them in the right order.
//!
//! A typical loop:
//!
//! ```text
//! loop {
//!     presenter.update()?;
//!     presenter.begin_frame()?;
//!     while presenter.has_render_view() {
//!         presenter.begin_render_view()?;
//!         presenter.end_render_view()?;
//!     }
//!     presenter.end_frame()?;
//! }
//! ```

use std::path::{Path, PathBuf};
use std::rc::Rc;

use directories_next::ProjectDirs;

use crate::backend::{available_backends, select_backend, supported_extensions, xr_extensions_for};
use crate::error::GfxError;
use crate::gpu::{Gpu, GpuSettings};
use crate::hooks::FrameHooks;
use crate::logging::install_log_callback;
use crate::types::{BackendKind, PresenterConfig, PresenterInfo, WindowSize};
use crate::window::{WindowEvent, WindowProvider, WindowRequest};
use crate::xr::{create_runtime, SharedXrSession, XrEvent, XrRuntime, XrSessionManager};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresenterEvent {
    Resized(WindowSize),
    CloseRequested,
    Focused(bool),
    Occluded(bool),
    Xr(XrEvent),
}

pub struct Presenter {
    gpu: Gpu,
    xr: Option<SharedXrSession>,
    hooks: Box<dyn FrameHooks>,
    window: Box<dyn WindowProvider>,
    info: PresenterInfo,
    available: Vec<BackendKind>,
}

impl Presenter {
    /// Brings up everything `config` asks for. XR uses the runtime named in
    /// `config.xr.runtime`.
    pub fn initialize(
        config: PresenterConfig,
        window: Box<dyn WindowProvider>,
        hooks: Box<dyn FrameHooks>,
    ) -> Result<(Self, PresenterInfo), GfxError> {
        Self::initialize_with_runtime(config, window, hooks, None)
    }

    /// As [`Presenter::initialize`], with an explicit XR runtime provider.
    pub fn initialize_with_runtime(
        mut config: PresenterConfig,
        mut window: Box<dyn WindowProvider>,
        hooks: Box<dyn FrameHooks>,
        runtime: Option<Box<dyn XrRuntime>>,
    ) -> Result<(Self, PresenterInfo), GfxError> {
        if let Some(callback) = config.log_callback.clone() {
            install_log_callback(callback);
        }

        let app_name = config.effective_app_name().to_string();
        let config_path = resolve_config_path(config.config_path.as_deref(), &app_name)?;
        let settings = GpuSettings {
            msaa: config.effective_msaa(),
            texture_anisotropy: config.effective_anisotropy(),
        };
        tracing::info!(
            app = %app_name,
            config_path = %config_path.display(),
            backend = %config.desired_backend,
            msaa = settings.msaa,
            anisotropy = settings.texture_anisotropy,
            xr = config.start_xr,
            "initializing presenter"
        );

        let xr = if config.start_xr {
            start_xr(&config, runtime)?
        } else {
            None
        };

        let available = available_backends();
        let request = WindowRequest {
            title: app_name,
            width: config.window_width,
            height: config.window_height,
            fullscreen: config.start_fullscreen,
            icon: config.icon.clone(),
        };
        let (backend, gpu) = select_backend(config.desired_backend, &available, |kind| {
            window.create_window(kind, &request)?;
            let attempt = Gpu::initialize(
                kind,
                window.raw_handles(),
                window.size(),
                &settings,
                xr.as_ref().map(Rc::clone),
            );
            if attempt.is_err() {
                window.destroy_window();
            }
            attempt
        })
        .inspect_err(|err| {
            tracing::error!(fatal = true, error = %err, "presenter initialization failed");
        })?;

        window.show_window();
        let window_size = window.size();
        if let Some(ui_init) = config.ui_init_callback.take() {
            ui_init(&window_size);
        }

        let info = PresenterInfo {
            backend,
            config_path,
            window_size,
        };
        tracing::info!(
            %backend,
            width = window_size.fb_width,
            height = window_size.fb_height,
            xr = xr.is_some(),
            "presenter ready"
        );
        Ok((
            Self {
                gpu,
                xr,
                hooks,
                window,
                info: info.clone(),
                available,
            },
            info,
        ))
    }

    /// Drains window and XR events, resizing the window view as needed, and
    /// starts the UI frame.
    pub fn update(&mut self) -> Result<Vec<PresenterEvent>, GfxError> {
        let mut events = Vec::new();
        for event in self.window.poll_events() {
            events.push(match event {
                WindowEvent::Resized(size) => {
                    self.gpu.resize_window(&size)?;
                    self.info.window_size = size;
                    PresenterEvent::Resized(size)
                }
                WindowEvent::CloseRequested => PresenterEvent::CloseRequested,
                WindowEvent::Focused(focused) => PresenterEvent::Focused(focused),
                WindowEvent::Occluded(occluded) => PresenterEvent::Occluded(occluded),
            });
        }

        if let Some(session) = &self.xr {
            let xr_events = session.borrow_mut().poll_events()?;
            events.extend(xr_events.into_iter().map(PresenterEvent::Xr));
        }

        self.hooks.ui_new_frame(&self.window.size());
        Ok(events)
    }

    pub fn begin_frame(&mut self) -> Result<(), GfxError> {
        if let Some(session) = &self.xr {
            session.borrow_mut().begin_frame()?;
        }
        if let Err(err) = self.gpu.begin_frame() {
            self.discard_xr_frame();
            return Err(err);
        }
        Ok(())
    }

    pub fn end_frame(&mut self) -> Result<(), GfxError> {
        if let Err(err) = self.gpu.end_frame() {
            self.discard_xr_frame();
            return Err(err);
        }
        if let Some(session) = &self.xr {
            session.borrow_mut().end_frame()?;
        }
        Ok(())
    }

    /// Ends the XR frame left open by a failed GPU frame call.
    fn discard_xr_frame(&mut self) {
        if let Some(session) = &self.xr {
            if let Err(err) = session.borrow_mut().discard_frame() {
                tracing::warn!(error = %err, "failed to discard XR frame");
            }
        }
    }

    pub fn has_render_view(&self) -> bool {
        self.gpu.has_render_view()
    }

    pub fn begin_render_view(&mut self) -> Result<bool, GfxError> {
        self.gpu.begin_render_view(self.hooks.as_mut())
    }

    pub fn end_render_view(&mut self) -> Result<(), GfxError> {
        self.gpu.end_render_view(self.hooks.as_mut())
    }

    pub fn backend(&self) -> BackendKind {
        self.info.backend
    }

    pub fn available_backends(&self) -> &[BackendKind] {
        &self.available
    }

    pub fn info(&self) -> &PresenterInfo {
        &self.info
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut Gpu {
        &mut self.gpu
    }

    pub fn xr_session(&self) -> Option<&SharedXrSession> {
        self.xr.as_ref()
    }

    pub fn xr_running(&self) -> bool {
        self.xr
            .as_ref()
            .is_some_and(|session| session.borrow().is_running())
    }

    pub fn shutdown(self) {
        let Presenter {
            gpu,
            xr,
            hooks,
            mut window,
            info,
            ..
        } = self;
        gpu.shutdown();
        drop(xr);
        drop(hooks);
        window.destroy_window();
        tracing::info!(backend = %info.backend, "presenter shut down");
    }
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("info", &self.info)
            .field("gpu", &self.gpu)
            .field("xr", &self.xr)
            .finish()
    }
}

/// Settings directory: `explicit` when given, else the platform preferences
/// directory for `app_name`.
pub fn resolve_config_path(explicit: Option<&Path>, app_name: &str) -> Result<PathBuf, GfxError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    ProjectDirs::from("", "", app_name)
        .map(|dirs| dirs.preference_dir().to_path_buf())
        .ok_or_else(|| {
            GfxError::Settings(format!("no preferences directory for application '{app_name}'"))
        })
}

/// Creates the XR instance and system. A runtime that cannot be loaded or
/// instantiated disables XR; later failures are errors.
fn start_xr(
    config: &PresenterConfig,
    runtime: Option<Box<dyn XrRuntime>>,
) -> Result<Option<SharedXrSession>, GfxError> {
    let runtime = match runtime {
        Some(runtime) => runtime,
        None => match create_runtime(config.xr.runtime) {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::warn!(error = %err, "XR runtime unavailable; continuing without XR");
                return Ok(None);
            }
        },
    };

    let mut manager = XrSessionManager::new(config.xr.clone(), runtime);
    let wanted = xr_extensions_for(config.desired_backend);
    let extensions = match manager.runtime_extensions() {
        Ok(available) => supported_extensions(&wanted, &available),
        Err(err) => {
            tracing::warn!(error = %err, "failed to enumerate XR extensions");
            Vec::new()
        }
    };

    if let Err(err) = manager.create_instance(&extensions) {
        tracing::warn!(
            runtime = manager.runtime_name(),
            error = %err,
            "failed to create XR instance; continuing without XR"
        );
        return Ok(None);
    }
    manager.initialize_system()?;
    Ok(Some(manager.into_shared()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_config_path(Some(dir.path()), "ignored").unwrap();
        assert_eq!(path, dir.path());
    }

    #[test]
    fn default_config_path_mentions_app() {
        if let Ok(path) = resolve_config_path(None, "PresenterTest") {
            assert!(path.to_string_lossy().contains("PresenterTest"));
        }
    }
}
