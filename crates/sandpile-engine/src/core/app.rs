use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Call order: `on_start` once the GPU context exists and before the window is
/// shown, then any number of `on_window_event` / `on_frame`, then `on_exit`.
pub trait App {
    /// Creates GPU resources. An error aborts startup before the first frame.
    fn on_start(&mut self, gpu: &Gpu<'_>) -> anyhow::Result<()>;

    /// Called for every window event, before the runtime's own handling.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw when no events are pending.
    ///
    /// An error stops the runtime and is returned from `Runtime::run`.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> anyhow::Result<AppControl>;

    /// Releases app-owned GPU resources while the device is still alive.
    fn on_exit(&mut self) {}
}
