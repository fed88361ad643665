//! Fatal error taxonomy and process exit codes.
//!
//! Errors are typed where they originate (`PlatformError` here,
//! [`CapabilityError`] in `device`, [`ShaderError`] in `sandpile::shader`) and
//! travel upward as `anyhow::Error` with context attached. The binary maps the
//! first typed error in the chain to a distinct exit code.

use thiserror::Error;

use crate::device::CapabilityError;
use crate::sandpile::ShaderError;

/// Process exit codes, one per fatal path.
pub mod codes {
    /// Error without a typed origin.
    pub const UNKNOWN: u8 = 1;

    pub const EVENT_LOOP: u8 = 10;
    pub const WINDOW: u8 = 11;

    pub const SURFACE: u8 = 20;
    pub const NO_ADAPTER: u8 = 21;
    pub const SAMPLE_COUNT: u8 = 22;
    pub const FEATURES: u8 = 23;
    pub const LIMITS: u8 = 24;
    pub const DEVICE: u8 = 25;
    pub const SURFACE_FORMAT: u8 = 26;

    pub const SHADER_READ: u8 = 30;
    pub const SHADER_COMPILE: u8 = 31;
    pub const SHADER_LINK: u8 = 32;

    pub const SURFACE_LOST: u8 = 40;
}

/// Window-system failures.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to create or run the event loop")]
    EventLoop(#[source] winit::error::EventLoopError),

    #[error("failed to create the window")]
    Window(#[source] winit::error::OsError),

    /// The surface ran out of memory while the frame loop was running.
    #[error("the window surface was lost")]
    SurfaceLost,
}

impl PlatformError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PlatformError::EventLoop(_) => codes::EVENT_LOOP,
            PlatformError::Window(_) => codes::WINDOW,
            PlatformError::SurfaceLost => codes::SURFACE_LOST,
        }
    }
}

/// Maps an error chain to its process exit code.
///
/// The outermost typed error wins; untyped chains map to [`codes::UNKNOWN`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<PlatformError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<CapabilityError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<ShaderError>() {
            return e.exit_code();
        }
    }
    codes::UNKNOWN
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn codes_are_distinct_and_nonzero() {
        let all = [
            codes::UNKNOWN,
            codes::EVENT_LOOP,
            codes::WINDOW,
            codes::SURFACE,
            codes::NO_ADAPTER,
            codes::SAMPLE_COUNT,
            codes::FEATURES,
            codes::LIMITS,
            codes::DEVICE,
            codes::SURFACE_FORMAT,
            codes::SHADER_READ,
            codes::SHADER_COMPILE,
            codes::SHADER_LINK,
            codes::SURFACE_LOST,
        ];
        for (i, a) in all.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn exit_code_sees_through_context() {
        let err = Err::<(), _>(PlatformError::EventLoop(
            winit::error::EventLoopError::RecreationAttempt,
        ))
        .context("starting runtime")
        .unwrap_err();
        assert_eq!(exit_code(&err), codes::EVENT_LOOP);
    }

    #[test]
    fn exit_code_for_capability_error() {
        let err = anyhow::Error::new(CapabilityError::UnsupportedSampleCount {
            count: 3,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
        })
        .context("creating GPU context");
        assert_eq!(exit_code(&err), codes::SAMPLE_COUNT);
    }

    #[test]
    fn exit_code_for_shader_error() {
        let err = anyhow::Error::new(ShaderError::Compile {
            name: "sandpile.frag.wgsl".into(),
            log: "expected `;`".into(),
        });
        assert_eq!(exit_code(&err), codes::SHADER_COMPILE);
    }

    #[test]
    fn untyped_error_maps_to_unknown() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&err), codes::UNKNOWN);
    }
}
