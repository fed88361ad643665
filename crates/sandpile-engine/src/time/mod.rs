//! Time subsystem.
//!
//! Frame timing without coupling to the runtime:
//! - one `FrameClock` per window, ticked once per redraw
//! - `RateMeter` turns the ticks into a periodic frames-per-second figure

mod frame_clock;
mod rate;

pub use frame_clock::{FrameClock, FrameTime};
pub use rate::RateMeter;
