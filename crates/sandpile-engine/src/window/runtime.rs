use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::error::PlatformError;
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,

    /// Client-area size; window decorations are added around it.
    pub inner_size: PhysicalSize<u32>,

    pub position: PhysicalPosition<i32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Sandbox".to_string(),
            inner_size: PhysicalSize::new(1440, 900),
            position: PhysicalPosition::new(80, 80),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, starts `app` and runs the frame loop until a quit
    /// signal or a fatal error.
    ///
    /// Startup failures (window, GPU capabilities, `App::on_start`) are
    /// returned after the event loop has shut down.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new()
            .map_err(PlatformError::EventLoop)
            .context("failed to create winit EventLoop")?;

        // Never block on the OS queue: render whenever no events are pending.
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .map_err(PlatformError::EventLoop)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    fatal: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            fatal: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        self.request_exit(event_loop);
    }

    /// Window, GPU context, app resources, then show: nothing is visible
    /// until everything the first frame needs exists.
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        log::debug!("creating window");
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.inner_size)
            .with_position(self.config.position)
            .with_visible(false);

        let window = event_loop
            .create_window(attrs)
            .map_err(PlatformError::Window)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        let mut entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let app = &mut self.app;
        entry
            .with_gpu(|gpu| app.on_start(gpu))
            .context("application startup failed")?;

        entry.with_mut(|fields| {
            fields.clock.reset();
            fields.window.set_visible(true);
            fields.window.request_redraw();
        });
        log::info!("window shown");

        self.window = Some(entry);
        Ok(())
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Every pending event has been dispatched by now; render the next frame.
        if let Some(entry) = self.window.as_ref() {
            entry.borrow_window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, window) = (&mut self.app, &mut self.window);

        let Some(entry) = window.as_mut() else {
            return;
        };
        if entry.borrow_window().id() != window_id {
            return;
        }

        if app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.borrow_window().inner_size();
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
            }

            WindowEvent::RedrawRequested => {
                let result = entry.with_mut(|fields| {
                    let time = fields.clock.tick();
                    let mut ctx = FrameCtx {
                        window: WindowCtx {
                            id: window_id,
                            window: fields.window,
                        },
                        gpu: fields.gpu,
                        time,
                    };
                    app.on_frame(&mut ctx)
                });

                match result {
                    Ok(AppControl::Continue) => {}
                    Ok(AppControl::Exit) => self.request_exit(event_loop),
                    Err(err) => self.fail(event_loop, err),
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // App resources go first, then the surface and device.
        self.app.on_exit();
        self.window = None;
        log::debug!("runtime shut down");
    }
}
