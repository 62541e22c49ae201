use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::core::{App, AppControl, Engine};
use crate::input::platform::winit::translate_window_event;
use crate::rhi::{self, GpuInit, GraphicsDevice, NativeWindow};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,

    /// Hide and confine the cursor, for mouse-look.
    ///
    /// Platforms that cannot confine (macOS) fall back to locking the cursor
    /// in place. A locked cursor stops producing `CursorMoved` events, so the
    /// camera's absolute-position mouse-look does nothing there; keyboard
    /// movement still works. A warning is logged when this happens.
    pub grab_cursor: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "maya".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            grab_cursor: false,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens a window, drives `app` until it exits or the window closes, and
    /// shuts the device down. Uses the platform backend.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        Self::run_with_device(config, rhi::create_default(gpu_init), app)
    }

    pub fn run_with_device<A>(
        config: RuntimeConfig,
        device: Box<dyn GraphicsDevice>,
        app: A,
    ) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, Engine::new(device), app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppState<A: App> {
    config: RuntimeConfig,
    engine: Engine,
    app: A,
    window: Option<Arc<Window>>,
    failure: Option<anyhow::Error>,
}

impl<A: App> AppState<A> {
    fn new(config: RuntimeConfig, engine: Engine, app: A) -> Self {
        Self {
            config,
            engine,
            app,
            window: None,
            failure: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        if self.config.grab_cursor
            && grab_cursor(&window).is_some_and(|mode| !reports_cursor_motion(mode))
        {
            log::warn!("cursor is locked, not confined; mouse-look is unavailable here");
        }

        self.engine
            .initialize(NativeWindow::Winit(window.clone()), &mut self.app)?;

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        event_loop.exit();
    }
}

/// Confines (or, failing that, locks) and hides the cursor. Returns the mode
/// that took effect.
fn grab_cursor(window: &Window) -> Option<CursorGrabMode> {
    let mode = match window.set_cursor_grab(CursorGrabMode::Confined) {
        Ok(()) => CursorGrabMode::Confined,
        Err(_) => match window.set_cursor_grab(CursorGrabMode::Locked) {
            Ok(()) => CursorGrabMode::Locked,
            Err(e) => {
                log::warn!("cursor grab unavailable: {e}");
                return None;
            }
        },
    };
    window.set_cursor_visible(false);
    Some(mode)
}

/// Whether the cursor still reports absolute positions in `mode`.
fn reports_cursor_motion(mode: CursorGrabMode) -> bool {
    !matches!(mode, CursorGrabMode::Locked)
}

impl<A: App> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.create_window(event_loop) {
            self.fail(event_loop, err.context("failed to start"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.engine.is_running() {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        if let Some(ev) = translate_window_event(window.scale_factor(), &event) {
            self.engine.handle_event(ev);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Err(err) = self.engine.resize(size.width, size.height, &mut self.app) {
                    self.fail(event_loop, err);
                    return;
                }
                window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                if let Err(err) = self.engine.resize(size.width, size.height, &mut self.app) {
                    self.fail(event_loop, err);
                    return;
                }
                window.request_redraw();
            }

            WindowEvent::Focused(true) if self.config.grab_cursor => {
                grab_cursor(&window);
            }

            WindowEvent::RedrawRequested => match self.engine.run_frame(&mut self.app) {
                Ok(AppControl::Continue) => {}
                Ok(AppControl::Exit) => event_loop.exit(),
                Err(err) => self.fail(event_loop, err),
            },

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.engine.shutdown(&mut self.app);
        self.window = None;
    }
}
