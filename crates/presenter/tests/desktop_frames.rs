use std::cell::RefCell;
use std::rc::Rc;

use presenter::{
    available_backends, BackendKind, FrameHooks, GfxError, HeadlessWindow, NoopHooks,
    OverlayContext, Presenter, PresenterConfig, PresenterEvent, RenderContext, RenderViewType,
    WindowEvent, WindowSize,
};
use tempfile::TempDir;

type Calls = Rc<RefCell<Vec<String>>>;

struct RecordingHooks {
    calls: Calls,
}

impl FrameHooks for RecordingHooks {
    fn ui_new_frame(&mut self, size: &WindowSize) {
        self.calls
            .borrow_mut()
            .push(format!("ui {}x{}", size.fb_width, size.fb_height));
    }

    fn begin_view(&mut self, view_type: RenderViewType) {
        self.calls.borrow_mut().push(format!("begin {view_type:?}"));
    }

    fn abort_view(&mut self, view_type: RenderViewType) {
        self.calls.borrow_mut().push(format!("abort {view_type:?}"));
    }

    fn render_content(&mut self, ctx: &mut RenderContext<'_>) {
        self.calls
            .borrow_mut()
            .push(format!("content {:?}", ctx.view_type));
    }

    fn render_overlay(&mut self, ctx: &mut OverlayContext<'_>) {
        self.calls
            .borrow_mut()
            .push(format!("overlay {:?}", ctx.view_type));
    }
}

fn null_config(dir: &TempDir) -> PresenterConfig {
    PresenterConfig {
        app_name: Some("DesktopFrames".into()),
        config_path: Some(dir.path().to_path_buf()),
        desired_backend: BackendKind::Null,
        window_width: 320,
        window_height: 200,
        ..PresenterConfig::default()
    }
}

fn recording_presenter(dir: &TempDir, window: HeadlessWindow) -> (Presenter, Calls) {
    let calls = Calls::default();
    let hooks = RecordingHooks {
        calls: Rc::clone(&calls),
    };
    let (presenter, _info) =
        Presenter::initialize(null_config(dir), Box::new(window), Box::new(hooks)).unwrap();
    (presenter, calls)
}

/// Runs one full frame, returning how many views were drawn.
fn run_frame(presenter: &mut Presenter) -> Result<usize, GfxError> {
    presenter.begin_frame()?;
    let mut drawn = 0;
    while presenter.has_render_view() {
        if presenter.begin_render_view()? {
            drawn += 1;
        }
        presenter.end_render_view()?;
    }
    presenter.end_frame()?;
    Ok(drawn)
}

#[test]
fn null_backend_runs_frames_headless() {
    let dir = TempDir::new().unwrap();
    let window = HeadlessWindow::new(1, 1);
    let (mut presenter, calls) = recording_presenter(&dir, window.clone());

    assert_eq!(presenter.backend(), BackendKind::Null);
    assert_eq!(presenter.info().config_path, dir.path());
    assert!(window.is_visible());
    assert_eq!(window.created_for(), vec![BackendKind::Null]);

    for _ in 0..3 {
        presenter.update().unwrap();
        assert_eq!(run_frame(&mut presenter).unwrap(), 1);
    }

    let calls = calls.borrow();
    assert_eq!(
        &calls[..4],
        &["ui 320x200", "begin Primary", "content Primary", "overlay Primary"]
    );
    assert_eq!(calls.len(), 12);
    drop(calls);
    presenter.shutdown();
    assert!(window.current_backend().is_none());
}

#[test]
fn ui_init_callback_sees_the_window_size() {
    let dir = TempDir::new().unwrap();
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    let config = PresenterConfig {
        ui_init_callback: Some(Box::new(move |size: &WindowSize| {
            *sink.borrow_mut() = Some((size.fb_width, size.fb_height));
        })),
        ..null_config(&dir)
    };
    let (presenter, info) = Presenter::initialize(
        config,
        Box::new(HeadlessWindow::new(1, 1)),
        Box::new(NoopHooks),
    )
    .unwrap();

    assert_eq!(*seen.borrow(), Some((320, 200)));
    assert_eq!((info.window_size.fb_width, info.window_size.fb_height), (320, 200));
    presenter.shutdown();
}

#[test]
fn resize_events_reach_the_primary_view() {
    let dir = TempDir::new().unwrap();
    let window = HeadlessWindow::new(1, 1);
    let (mut presenter, _calls) = recording_presenter(&dir, window.clone());
    let generation = presenter.gpu().target_generation();

    window.resize(640, 480);
    let events = presenter.update().unwrap();
    assert!(matches!(
        events.as_slice(),
        [PresenterEvent::Resized(size)] if size.fb_width == 640 && size.fb_height == 480
    ));
    assert_eq!(presenter.gpu().primary_config().width, 640);
    assert_eq!(presenter.gpu().target_generation(), generation + 1);

    // Same size again changes nothing.
    window.resize(640, 480);
    presenter.update().unwrap();
    assert_eq!(presenter.gpu().target_generation(), generation + 1);

    // A minimised window keeps the last usable size.
    window.resize(0, 0);
    presenter.update().unwrap();
    assert_eq!(presenter.gpu().primary_config().width, 640);
    assert_eq!(run_frame(&mut presenter).unwrap(), 1);
}

#[test]
fn window_events_are_forwarded() {
    let dir = TempDir::new().unwrap();
    let window = HeadlessWindow::new(1, 1);
    let (mut presenter, _calls) = recording_presenter(&dir, window.clone());

    window.push_event(WindowEvent::Focused(false));
    window.push_event(WindowEvent::Occluded(true));
    window.push_event(WindowEvent::CloseRequested);
    let events = presenter.update().unwrap();
    assert_eq!(
        events,
        vec![
            PresenterEvent::Focused(false),
            PresenterEvent::Occluded(true),
            PresenterEvent::CloseRequested,
        ]
    );
}

#[test]
fn stale_swapchain_skips_one_view_then_recovers() {
    let dir = TempDir::new().unwrap();
    let (mut presenter, calls) = recording_presenter(&dir, HeadlessWindow::new(1, 1));

    presenter.gpu_mut().invalidate_swapchains();
    assert_eq!(run_frame(&mut presenter).unwrap(), 0);
    assert_eq!(calls.borrow().as_slice(), &["abort Primary"]);

    assert_eq!(run_frame(&mut presenter).unwrap(), 1);
}

#[test]
fn not_ready_view_can_be_retried_before_ending() {
    let dir = TempDir::new().unwrap();
    let (mut presenter, _calls) = recording_presenter(&dir, HeadlessWindow::new(1, 1));

    presenter.gpu_mut().invalidate_swapchains();
    presenter.begin_frame().unwrap();
    assert!(!presenter.begin_render_view().unwrap());
    assert!(presenter.begin_render_view().unwrap());
    presenter.end_render_view().unwrap();
    assert!(!presenter.has_render_view());
    presenter.end_frame().unwrap();
}

#[test]
fn frame_calls_out_of_order_are_rejected() {
    let dir = TempDir::new().unwrap();
    let (mut presenter, _calls) = recording_presenter(&dir, HeadlessWindow::new(1, 1));

    assert!(matches!(
        presenter.begin_render_view(),
        Err(GfxError::FrameOrder(_))
    ));
    presenter.begin_frame().unwrap();
    assert!(matches!(presenter.begin_frame(), Err(GfxError::FrameOrder(_))));
    assert!(presenter.begin_render_view().unwrap());
    assert!(matches!(presenter.end_frame(), Err(GfxError::FrameOrder(_))));
    presenter.end_render_view().unwrap();
    presenter.end_frame().unwrap();
}

#[test]
fn refused_backends_fall_through_to_null() {
    let dir = TempDir::new().unwrap();
    let mut window = HeadlessWindow::new(1, 1);
    let refused: Vec<BackendKind> = available_backends()
        .into_iter()
        .filter(|kind| *kind != BackendKind::Null)
        .collect();
    for kind in &refused {
        window = window.refuse(*kind);
    }

    let config = PresenterConfig {
        desired_backend: BackendKind::Auto,
        ..null_config(&dir)
    };
    let (presenter, info) =
        Presenter::initialize(config, Box::new(window.clone()), Box::new(NoopHooks)).unwrap();

    assert_eq!(info.backend, BackendKind::Null);
    assert_eq!(window.created_for(), vec![BackendKind::Null]);
    assert_eq!(presenter.available_backends(), available_backends().as_slice());
}

#[test]
fn no_backend_is_reported_with_every_attempt() {
    let dir = TempDir::new().unwrap();
    let mut window = HeadlessWindow::new(1, 1);
    for kind in available_backends() {
        window = window.refuse(kind);
    }
    let config = PresenterConfig {
        desired_backend: BackendKind::Auto,
        ..null_config(&dir)
    };

    let err = Presenter::initialize(config, Box::new(window), Box::new(NoopHooks)).unwrap_err();
    match err {
        GfxError::NoBackendAvailable { tried } => assert_eq!(tried, available_backends()),
        other => panic!("unexpected error {other}"),
    }
}
