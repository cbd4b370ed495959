//! Graphics and XR bootstrap plus frame presentation.
//!
//! The crate picks a GPU backend, creates one render view per output (a
//! desktop window, and the two eyes of a head-mounted display when XR is on),
//! and drives a per-frame cycle over them:
//!
//! ```text
//!  Presenter ── update ── begin_frame ── { begin_render_view ── end_render_view }* ── end_frame
//!      │                                          │                    │
//!      ▼                                          ▼                    ▼
//!  XrSessionManager ◀──────────────────────── Gpu (RenderViews) ── SwapchainImpl
//!                                                                 (surface / headless / XR)
//! ```
//!
//! Modules:
//!
//! - `backend` orders and tries backends until one initialises.
//! - `binding` glues the device to window surfaces, offscreen images and XR swapchains.
//! - `gpu` owns the device, the render views and the copy pass.
//! - `xr` holds the runtime traits, the session manager and the simulated runtime.
//! - `driver` is the [`Presenter`] tying the pieces together.
//! - `window` and `hooks` are the seams to the window system and the application.
//! - `logging` forwards `tracing` events to an application callback.

pub mod backend;
pub mod binding;
pub mod driver;
pub mod error;
pub mod gpu;
pub mod hooks;
pub mod logging;
pub mod types;
pub mod window;
pub mod xr;

pub use backend::{available_backends, select_backend, xr_extensions_for};
pub use binding::{BackendBinding, BindingFlavor, GraphicsBinding, SwapchainImpl};
pub use driver::{Presenter, PresenterEvent};
pub use error::GfxError;
pub use gpu::{Gpu, GpuSettings, GraphicsConfig, RenderViewType};
pub use hooks::{FrameHooks, NoopHooks, OverlayContext, RenderContext};
pub use logging::{install_log_callback, CallbackLayer};
pub use types::{
    BackendKind, LogCallback, LogLevel, PresenterConfig, PresenterInfo, UiInitCallback,
    WindowIcon, WindowSize,
};
pub use window::{HeadlessWindow, WindowEvent, WindowProvider};
#[cfg(not(any(target_arch = "wasm32", target_os = "ios")))]
pub use window::WinitWindow;
pub use xr::{XrError, XrOptions, XrRuntimeKind};
