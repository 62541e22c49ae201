use std::time::Instant;

use anyhow::{Context, Result};

use crate::input::{InputEvent, InputState};
use crate::rhi::{GraphicsDevice, NativeWindow};
use crate::time::{FrameClock, FrameTime};

use super::app::{App, AppControl};
use super::ctx::FrameCtx;

/// Owns the device, input state and frame clock, and drives an [`App`].
///
/// The engine knows nothing about windows: the runtime (or a test) feeds it
/// input events and resize notifications and asks it to run frames.
pub struct Engine {
    device: Box<dyn GraphicsDevice>,
    input: InputState,
    clock: FrameClock,
    running: bool,
}

impl Engine {
    pub fn new(device: Box<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            input: InputState::new(),
            clock: FrameClock::new(),
            running: false,
        }
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    /// Initializes the device against `window` and runs the app's setup.
    pub fn initialize(&mut self, window: NativeWindow, app: &mut dyn App) -> Result<()> {
        log::info!("engine initializing");
        self.device
            .initialize(window)
            .context("failed to initialize graphics device")?;

        if let Err(err) = app.on_initialize(self.device.as_mut()) {
            self.device.shutdown();
            return Err(err.context("application initialization failed"));
        }

        let (w, h) = self.device.surface_size();
        app.on_resize(w, h);

        self.clock.reset();
        self.running = true;
        log::info!("engine initialized ({w}x{h})");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        self.input.apply_event(event);
    }

    pub fn resize(&mut self, width: u32, height: u32, app: &mut dyn App) -> Result<()> {
        self.device
            .resize(width, height)
            .context("failed to resize graphics device")?;
        app.on_resize(width, height);
        Ok(())
    }

    /// Runs one frame: tick, update, render, then roll input state.
    pub fn run_frame(&mut self, app: &mut dyn App) -> Result<AppControl> {
        self.run_frame_at(app, Instant::now())
    }

    /// [`run_frame`](Self::run_frame) with an explicit timestamp.
    pub fn run_frame_at(&mut self, app: &mut dyn App, now: Instant) -> Result<AppControl> {
        if !self.running {
            return Ok(AppControl::Exit);
        }

        let time = self.clock.tick_at(now);
        let control = self.frame(app, time);
        self.input.update();

        match control {
            Ok(AppControl::Continue) => Ok(AppControl::Continue),
            Ok(AppControl::Exit) => {
                log::info!("application requested exit at frame {}", time.frame_index);
                self.running = false;
                Ok(AppControl::Exit)
            }
            Err(err) => {
                log::error!("frame {} failed: {err:#}", time.frame_index);
                self.running = false;
                Err(err)
            }
        }
    }

    fn frame(&mut self, app: &mut dyn App, time: FrameTime) -> Result<AppControl> {
        let mut ctx = FrameCtx {
            device: self.device.as_mut(),
            input: &self.input,
            time,
        };

        if app.on_update(&mut ctx)? == AppControl::Exit {
            return Ok(AppControl::Exit);
        }

        ctx.device.begin_frame().context("begin_frame failed")?;
        let rendered = app.on_render(&mut ctx);
        // Close the bracket even when rendering failed so the device stays usable.
        let ended = ctx.device.end_frame().context("end_frame failed");

        let control = rendered?;
        ended?;
        Ok(control)
    }

    /// Lets the app release its resources, then shuts the device down.
    pub fn shutdown(&mut self, app: &mut dyn App) {
        if self.device.state().is_initialized() {
            app.on_shutdown(self.device.as_mut());
        }
        self.device.shutdown();
        self.running = false;
        log::info!("engine shut down");
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ButtonState, InputProvider, Key};
    use crate::rhi::{DeviceState, NullDevice};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        exit_after: Option<u64>,
        saw_pressed: bool,
    }

    impl App for Recorder {
        fn on_initialize(&mut self, _device: &mut dyn GraphicsDevice) -> Result<()> {
            self.calls.push("init");
            Ok(())
        }

        fn on_update(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl> {
            self.calls.push("update");
            self.saw_pressed |= ctx.input.is_key_pressed(Key::Space);
            match self.exit_after {
                Some(n) if ctx.time.frame_index >= n => Ok(AppControl::Exit),
                _ => Ok(AppControl::Continue),
            }
        }

        fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl> {
            assert_eq!(ctx.device.state(), DeviceState::Recording);
            self.calls.push("render");
            Ok(AppControl::Continue)
        }

        fn on_resize(&mut self, _width: u32, _height: u32) {
            self.calls.push("resize");
        }

        fn on_shutdown(&mut self, _device: &mut dyn GraphicsDevice) {
            self.calls.push("shutdown");
        }
    }

    fn engine() -> Engine {
        Engine::new(Box::new(NullDevice::with_size(640, 480)))
    }

    #[test]
    fn frame_runs_update_then_render() {
        let mut app = Recorder::default();
        let mut engine = engine();
        engine.initialize(NativeWindow::Headless, &mut app).unwrap();
        assert_eq!(engine.run_frame(&mut app).unwrap(), AppControl::Continue);
        engine.shutdown(&mut app);

        assert_eq!(app.calls, ["init", "resize", "update", "render", "shutdown"]);
        assert_eq!(engine.device().state(), DeviceState::Shutdown);
    }

    #[test]
    fn exit_from_update_skips_render() {
        let mut app = Recorder {
            exit_after: Some(0),
            ..Default::default()
        };
        let mut engine = engine();
        engine.initialize(NativeWindow::Headless, &mut app).unwrap();

        assert_eq!(engine.run_frame(&mut app).unwrap(), AppControl::Exit);
        assert!(!engine.is_running());
        assert!(!app.calls.contains(&"render"));
        assert_eq!(engine.device().state(), DeviceState::Idle);
    }

    #[test]
    fn pressed_keys_last_one_frame() {
        let mut app = Recorder::default();
        let mut engine = engine();
        engine.initialize(NativeWindow::Headless, &mut app).unwrap();

        engine.handle_event(InputEvent::Key {
            key: Key::Space,
            state: ButtonState::Pressed,
            repeat: false,
        });
        engine.run_frame(&mut app).unwrap();
        assert!(app.saw_pressed);
        assert!(!engine.input().is_key_pressed(Key::Space));
        assert!(engine.input().is_key_down(Key::Space));
    }

    #[test]
    fn render_error_still_ends_frame() {
        struct Failing;
        impl App for Failing {
            fn on_update(&mut self, _: &mut FrameCtx<'_>) -> Result<AppControl> {
                Ok(AppControl::Continue)
            }
            fn on_render(&mut self, _: &mut FrameCtx<'_>) -> Result<AppControl> {
                anyhow::bail!("boom")
            }
        }

        let mut app = Failing;
        let mut engine = engine();
        engine.initialize(NativeWindow::Headless, &mut app).unwrap();
        let err = engine.run_frame(&mut app).unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(engine.device().state(), DeviceState::Idle);
        assert!(!engine.is_running());
    }

    #[test]
    fn failed_app_setup_shuts_device_down() {
        struct BadSetup;
        impl App for BadSetup {
            fn on_initialize(&mut self, _: &mut dyn GraphicsDevice) -> Result<()> {
                anyhow::bail!("no assets")
            }
            fn on_update(&mut self, _: &mut FrameCtx<'_>) -> Result<AppControl> {
                Ok(AppControl::Continue)
            }
            fn on_render(&mut self, _: &mut FrameCtx<'_>) -> Result<AppControl> {
                Ok(AppControl::Continue)
            }
        }

        let mut engine = engine();
        assert!(engine.initialize(NativeWindow::Headless, &mut BadSetup).is_err());
        assert_eq!(engine.device().state(), DeviceState::Shutdown);
        assert_eq!(engine.run_frame(&mut BadSetup).unwrap(), AppControl::Exit);
    }
}
