//! Window system seam.
//!
//! The presenter only needs a handful of operations from the platform window:
//! create it for a backend, show it, report its size, hand out raw handles
//! for surface creation, and deliver events. [`WindowProvider`] captures
//! those; [`WinitWindow`] implements it on desktop platforms and
//! [`HeadlessWindow`] implements it without any window at all.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::error::GfxError;
use crate::types::{BackendKind, WindowIcon, WindowSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHandles {
    pub display: RawDisplayHandle,
    pub window: RawWindowHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    Resized(WindowSize),
    CloseRequested,
    Focused(bool),
    Occluded(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub icon: Option<WindowIcon>,
}

pub trait WindowProvider {
    /// Creates the (hidden) window for `backend`. May be called again after
    /// `destroy_window` when the backend loop moves on to the next candidate.
    fn create_window(&mut self, backend: BackendKind, request: &WindowRequest)
        -> Result<(), GfxError>;

    fn destroy_window(&mut self);

    fn show_window(&mut self);

    fn size(&self) -> WindowSize;

    /// `None` when there is nothing to present to.
    fn raw_handles(&self) -> Option<RawHandles>;

    fn poll_events(&mut self) -> Vec<WindowEvent>;
}

#[derive(Debug)]
struct HeadlessState {
    size: WindowSize,
    refused: Vec<BackendKind>,
    created: Vec<BackendKind>,
    current: Option<BackendKind>,
    visible: bool,
    events: VecDeque<WindowEvent>,
}

/// A window that never appears on screen. Clones share state, so a test can
/// keep one handle to inject events after passing the other to the presenter.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                size: WindowSize::new(width, height, 1.0),
                refused: Vec::new(),
                created: Vec::new(),
                current: None,
                visible: false,
                events: VecDeque::new(),
            })),
        }
    }

    /// Makes `create_window` fail for `backend`.
    pub fn refuse(self, backend: BackendKind) -> Self {
        self.state.borrow_mut().refused.push(backend);
        self
    }

    /// Queues a resize delivered by the next `poll_events`.
    pub fn resize(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        let size = WindowSize::new(width, height, state.size.scale);
        state.size = size;
        state.events.push_back(WindowEvent::Resized(size));
    }

    pub fn push_event(&self, event: WindowEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    /// Backends a window was successfully created for, in order.
    pub fn created_for(&self) -> Vec<BackendKind> {
        self.state.borrow().created.clone()
    }

    pub fn current_backend(&self) -> Option<BackendKind> {
        self.state.borrow().current
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }
}

impl WindowProvider for HeadlessWindow {
    fn create_window(
        &mut self,
        backend: BackendKind,
        request: &WindowRequest,
    ) -> Result<(), GfxError> {
        let mut state = self.state.borrow_mut();
        if state.refused.contains(&backend) {
            return Err(GfxError::Window(format!(
                "headless window refuses backend {backend}"
            )));
        }
        if request.width > 0 && request.height > 0 && state.created.is_empty() {
            state.size = WindowSize::new(request.width, request.height, state.size.scale);
        }
        state.created.push(backend);
        state.current = Some(backend);
        Ok(())
    }

    fn destroy_window(&mut self) {
        let mut state = self.state.borrow_mut();
        state.current = None;
        state.visible = false;
    }

    fn show_window(&mut self) {
        self.state.borrow_mut().visible = true;
    }

    fn size(&self) -> WindowSize {
        self.state.borrow().size
    }

    fn raw_handles(&self) -> Option<RawHandles> {
        None
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.state.borrow_mut().events.drain(..).collect()
    }
}

#[cfg(not(any(target_arch = "wasm32", target_os = "ios")))]
pub use desktop::WinitWindow;

#[cfg(not(any(target_arch = "wasm32", target_os = "ios")))]
mod desktop {
    use std::time::Duration;

    use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
    use winit::dpi::PhysicalSize;
    use winit::event::{Event, WindowEvent as WinitEvent};
    use winit::event_loop::EventLoop;
    use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
    use winit::window::{Fullscreen, Icon, Window, WindowBuilder};

    use super::{RawHandles, WindowEvent, WindowProvider, WindowRequest};
    use crate::error::GfxError;
    use crate::types::{BackendKind, WindowSize};

    /// Desktop window driven by a pumped `winit` event loop. The loop is
    /// created once and reused for every window the backend loop asks for.
    #[derive(Default)]
    pub struct WinitWindow {
        // Dropped before the event loop that owns it.
        window: Option<Window>,
        event_loop: Option<EventLoop<()>>,
        exited: bool,
    }

    impl WinitWindow {
        pub fn new() -> Self {
            Self::default()
        }

        fn event_loop(&mut self) -> Result<&EventLoop<()>, GfxError> {
            if self.event_loop.is_none() {
                let event_loop = EventLoop::new()
                    .map_err(|err| GfxError::Window(format!("failed to create event loop: {err}")))?;
                self.event_loop = Some(event_loop);
            }
            self.event_loop
                .as_ref()
                .ok_or_else(|| GfxError::Window("event loop unavailable".into()))
        }

        fn window_size(window: &Window) -> WindowSize {
            let size = window.inner_size();
            WindowSize::new(size.width, size.height, window.scale_factor() as f32)
        }
    }

    impl WindowProvider for WinitWindow {
        fn create_window(
            &mut self,
            backend: BackendKind,
            request: &WindowRequest,
        ) -> Result<(), GfxError> {
            let mut builder = WindowBuilder::new()
                .with_title(request.title.as_str())
                .with_inner_size(PhysicalSize::new(request.width.max(1), request.height.max(1)))
                .with_visible(false);
            if request.fullscreen {
                builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
            }
            if let Some(icon) = &request.icon {
                match Icon::from_rgba(icon.rgba.clone(), icon.width, icon.height) {
                    Ok(icon) => builder = builder.with_window_icon(Some(icon)),
                    Err(err) => tracing::warn!(%err, "ignoring invalid window icon"),
                }
            }

            let event_loop = self.event_loop()?;
            let window = builder.build(event_loop).map_err(|err| {
                GfxError::Window(format!("failed to create window for {backend}: {err}"))
            })?;
            tracing::debug!(
                %backend,
                title = %request.title,
                fullscreen = request.fullscreen,
                "window created"
            );
            self.window = Some(window);
            Ok(())
        }

        fn destroy_window(&mut self) {
            if self.window.take().is_some() {
                tracing::debug!("window destroyed");
            }
        }

        fn show_window(&mut self) {
            if let Some(window) = &self.window {
                window.set_visible(true);
            }
        }

        fn size(&self) -> WindowSize {
            self.window
                .as_ref()
                .map(Self::window_size)
                .unwrap_or_else(|| WindowSize::new(0, 0, 1.0))
        }

        fn raw_handles(&self) -> Option<RawHandles> {
            let window = self.window.as_ref()?;
            let display = window.display_handle().ok()?.as_raw();
            let handle = window.window_handle().ok()?.as_raw();
            Some(RawHandles {
                display,
                window: handle,
            })
        }

        fn poll_events(&mut self) -> Vec<WindowEvent> {
            let mut events = Vec::new();
            if self.exited {
                events.push(WindowEvent::CloseRequested);
                return events;
            }
            let (Some(event_loop), Some(window)) = (self.event_loop.as_mut(), self.window.as_ref())
            else {
                return events;
            };
            let window_id = window.id();
            let scale = window.scale_factor() as f32;

            let status = event_loop.pump_events(Some(Duration::ZERO), |event, _target| {
                if let Event::WindowEvent { window_id: id, event } = event {
                    if id != window_id {
                        return;
                    }
                    match event {
                        WinitEvent::CloseRequested | WinitEvent::Destroyed => {
                            events.push(WindowEvent::CloseRequested)
                        }
                        WinitEvent::Resized(size) => events.push(WindowEvent::Resized(
                            WindowSize::new(size.width, size.height, scale),
                        )),
                        WinitEvent::Focused(focused) => events.push(WindowEvent::Focused(focused)),
                        WinitEvent::Occluded(occluded) => {
                            events.push(WindowEvent::Occluded(occluded))
                        }
                        _ => {}
                    }
                }
            });
            if let PumpStatus::Exit(code) = status {
                tracing::debug!(code, "event loop exited");
                self.exited = true;
                events.push(WindowEvent::CloseRequested);
            }
            events
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> WindowRequest {
        WindowRequest {
            title: "test".into(),
            width: 640,
            height: 480,
            fullscreen: false,
            icon: None,
        }
    }

    #[test]
    fn refused_backends_fail_creation() {
        let mut window = HeadlessWindow::new(100, 100).refuse(BackendKind::Vulkan);
        assert!(window.create_window(BackendKind::Vulkan, &request()).is_err());
        window.create_window(BackendKind::Null, &request()).unwrap();
        assert_eq!(window.created_for(), vec![BackendKind::Null]);
        assert_eq!(window.size().fb_width, 640);
        assert!(window.raw_handles().is_none());
    }

    #[test]
    fn injected_events_drain_once() {
        let handle = HeadlessWindow::new(100, 100);
        let mut window = handle.clone();
        handle.resize(300, 200);
        handle.push_event(WindowEvent::CloseRequested);
        let events = window.poll_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], WindowEvent::Resized(size) if size.fb_width == 300));
        assert!(window.poll_events().is_empty());
        assert_eq!(window.size().fb_height, 200);
    }

    #[test]
    fn show_and_destroy_track_visibility() {
        let handle = HeadlessWindow::new(10, 10);
        let mut window = handle.clone();
        window.create_window(BackendKind::Null, &request()).unwrap();
        window.show_window();
        assert!(handle.is_visible());
        window.destroy_window();
        assert!(!handle.is_visible());
        assert_eq!(handle.current_backend(), None);
    }
}
