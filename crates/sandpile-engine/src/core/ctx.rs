use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

/// What happened to a frame handed to [`FrameCtx::render`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// Commands were submitted and the frame was presented.
    Presented,
    /// No surface texture was available; nothing was recorded.
    Skipped,
    /// The surface cannot be recovered.
    Lost,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the window's next surface texture, calls `draw` with a ready
    /// [`RenderCtx`] and [`RenderTarget`], then submits and presents.
    ///
    /// `draw` is not called when no surface texture can be acquired.
    pub fn render<F>(&mut self, draw: F) -> FrameStatus
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface unavailable: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => FrameStatus::Lost,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        FrameStatus::Skipped
                    }
                };
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            self.gpu.sample_count(),
        );

        // RenderTarget borrows frame.encoder; dropped before present() takes frame.
        {
            let (color_view, resolve_target) = match self.gpu.msaa_view() {
                Some(msaa) => (msaa, Some(&frame.view)),
                None => (&frame.view, None),
            };
            let mut target = RenderTarget::new(&mut frame.encoder, color_view, resolve_target);
            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.present(frame);

        FrameStatus::Presented
    }
}
