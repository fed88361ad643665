use std::time::Duration;

use anyhow::Context;
use winit::event::WindowEvent;

use crate::core::{App, AppControl, FrameCtx, FrameStatus};
use crate::device::Gpu;
use crate::error::PlatformError;
use crate::render::RenderCtx;
use crate::time::RateMeter;

use super::config::SandpileConfig;
use super::frame_loop::{FrameLoop, LoopEvent, LoopState};
use super::renderer::SandpileRenderer;

/// Runs the ping-pong sandpile in the window it is given.
pub struct SandpileApp {
    config: SandpileConfig,
    renderer: Option<SandpileRenderer>,
    frame_loop: FrameLoop,
    step_rate: RateMeter,
}

impl SandpileApp {
    pub fn new(config: SandpileConfig) -> Self {
        Self {
            config,
            renderer: None,
            frame_loop: FrameLoop::new(),
            step_rate: RateMeter::new(Duration::from_secs(2)),
        }
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }
}

impl App for SandpileApp {
    fn on_start(&mut self, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let ctx = RenderCtx::new(
            gpu.device(),
            gpu.queue(),
            gpu.surface_format(),
            gpu.sample_count(),
        );
        let renderer = SandpileRenderer::new(&ctx, &self.config)
            .context("failed to set up the sandpile renderer")?;

        log::info!(
            "sandpile ready: {}x{} grid, threshold {}, {:?} edges",
            self.config.grid.width,
            self.config.grid.height,
            self.config.rule.threshold(),
            self.config.rule.edges()
        );
        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match self.frame_loop.handle(LoopEvent::from_window_event(event)) {
            LoopState::Terminated => AppControl::Exit,
            LoopState::Idle | LoopState::Rendering => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> anyhow::Result<AppControl> {
        let renderer = self
            .renderer
            .as_ref()
            .context("frame requested before the renderer was created")?;

        let status = self
            .frame_loop
            .render(|step| ctx.render(|_, target| renderer.run_cycle(target, step)));

        match status {
            None => Ok(AppControl::Exit),
            Some(FrameStatus::Presented) => {
                if let Some(rate) = self.step_rate.record(ctx.time.dt) {
                    log::debug!("{rate:.1} steps/s ({} total)", self.frame_loop.frames());
                }
                Ok(AppControl::Continue)
            }
            Some(FrameStatus::Skipped) => Ok(AppControl::Continue),
            Some(FrameStatus::Lost) => Err(anyhow::Error::new(PlatformError::SurfaceLost)
                .context(format!("frame {} could not be presented", self.frame_loop.frames()))),
        }
    }

    fn on_exit(&mut self) {
        if self.renderer.take().is_some() {
            log::debug!("sandpile resources released after {} steps", self.frame_loop.frames());
        }
    }
}
