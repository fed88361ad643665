use thiserror::Error;

use crate::error::codes;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// The adapter cannot provide what `GpuInit` asked for.
///
/// All variants are fatal at startup.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("failed to create wgpu surface")]
    Surface(#[source] wgpu::CreateSurfaceError),

    #[error("no GPU adapter compatible with the window surface")]
    NoAdapter(#[source] wgpu::RequestAdapterError),

    #[error("adapter does not support {count}x multisampling for {format:?}")]
    UnsupportedSampleCount {
        count: u32,
        format: wgpu::TextureFormat,
    },

    #[error("adapter is missing required features {0:?}")]
    MissingFeatures(wgpu::Features),

    #[error("adapter does not support the requested limits")]
    UnsupportedLimits,

    #[error("failed to create wgpu device/queue")]
    Device(#[source] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

impl CapabilityError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CapabilityError::Surface(_) => codes::SURFACE,
            CapabilityError::NoAdapter(_) => codes::NO_ADAPTER,
            CapabilityError::UnsupportedSampleCount { .. } => codes::SAMPLE_COUNT,
            CapabilityError::MissingFeatures(_) => codes::FEATURES,
            CapabilityError::UnsupportedLimits => codes::LIMITS,
            CapabilityError::Device(_) => codes::DEVICE,
            CapabilityError::NoSurfaceFormat => codes::SURFACE_FORMAT,
        }
    }
}
