//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - checking adapter capabilities against what the app asked for
//! - creating & configuring the Surface (swapchain) and its multisample target
//! - acquiring frames and presenting them

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::{CapabilityError, SurfaceErrorAction};
pub use frame::GpuFrame;
pub use init::GpuInit;
