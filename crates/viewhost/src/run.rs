//! Drives the presenter: bootstraps it from settings and flags, then runs the
//! update / frame / view loop until the window closes, the XR runtime exits,
//! or the frame limit is reached.
//!
//! Types:
//!
//! - `DemoHooks` opens the main pass for each view and counts what it drew.
//!
//! Functions:
//!
//! - `run` drives the main execution path.
//! - `initialise_tracing` configures logging.
//! - `draw_frame` walks every render view once.

use anyhow::{Context, Result};
use presenter::xr::XrEvent;
use presenter::{
    FrameHooks, GfxError, HeadlessWindow, Presenter, PresenterEvent, RenderContext, RenderViewType,
    WindowProvider, WindowSize, WinitWindow,
};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{apply_overrides, load_settings, presenter_config};
use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Frame limit for `--headless` runs without `--frames`.
const HEADLESS_FRAMES: u64 = 120;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover(args.config.as_deref())?;
    let mut settings = load_settings(&paths)?;
    apply_overrides(&mut settings, &args)?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        backend = ?settings.graphics.backend,
        xr = settings.xr.enabled,
        "resolved viewhost settings"
    );

    let mut config = presenter_config(&settings, &args, &paths);
    config.ui_init_callback = Some(Box::new(|size: &WindowSize| {
        tracing::debug!(
            width = size.fb_width,
            height = size.fb_height,
            scale = size.scale,
            "UI initialised"
        );
    }));

    let window: Box<dyn WindowProvider> = if args.headless {
        Box::new(HeadlessWindow::new(
            settings.graphics.width,
            settings.graphics.height,
        ))
    } else {
        Box::new(WinitWindow::new())
    };

    let (mut presenter, info) = Presenter::initialize(config, window, Box::new(DemoHooks::default()))
        .context("failed to initialise presenter")?;
    tracing::info!(
        backend = %info.backend,
        width = info.window_size.fb_width,
        height = info.window_size.fb_height,
        xr = presenter.xr_session().is_some(),
        "viewhost running"
    );

    let limit = args
        .frames
        .or_else(|| args.headless.then_some(HEADLESS_FRAMES));
    let outcome = frame_loop(&mut presenter, limit);
    presenter.shutdown();
    let frames = outcome?;
    tracing::info!(frames, "viewhost finished");
    Ok(())
}

fn frame_loop(presenter: &mut Presenter, limit: Option<u64>) -> Result<u64> {
    let mut frames = 0;
    while limit.map_or(true, |limit| frames < limit) {
        let events = presenter.update().context("failed to poll events")?;
        if events.iter().any(ends_run) {
            tracing::info!(frames, "exit requested");
            break;
        }
        draw_frame(presenter).with_context(|| format!("frame {frames} failed"))?;
        frames += 1;
    }
    Ok(frames)
}

fn ends_run(event: &PresenterEvent) -> bool {
    matches!(
        event,
        PresenterEvent::CloseRequested | PresenterEvent::Xr(XrEvent::Exiting)
    )
}

fn draw_frame(presenter: &mut Presenter) -> Result<(), GfxError> {
    presenter.begin_frame()?;
    while presenter.has_render_view() {
        presenter.begin_render_view()?;
        presenter.end_render_view()?;
    }
    presenter.end_frame()
}

pub fn initialise_tracing() {
    let default_filter = "info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[derive(Debug, Default)]
struct DemoHooks {
    views_drawn: u64,
    views_skipped: u64,
}

impl FrameHooks for DemoHooks {
    fn abort_view(&mut self, view_type: RenderViewType) {
        self.views_skipped += 1;
        tracing::trace!(?view_type, skipped = self.views_skipped, "view skipped");
    }

    fn render_content(&mut self, ctx: &mut RenderContext<'_>) {
        self.views_drawn += 1;
        ctx.push_debug_group("viewhost content");
        drop(ctx.begin_main_pass());
        ctx.pop_debug_group();
        tracing::trace!(
            view_type = ?ctx.view_type,
            width = ctx.config.width,
            height = ctx.config.height,
            eye = ctx.eye.is_some(),
            drawn = self.views_drawn,
            "view drawn"
        );
    }
}
