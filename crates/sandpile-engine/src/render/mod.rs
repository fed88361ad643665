//! GPU rendering helpers shared by the passes.
//!
//! Convention:
//! - geometry is expressed in unit-square coordinates ([0,1]x[0,1], +Y up)
//! - vertex shaders map it to NDC with `pos * 2 - 1`

mod ctx;
mod quad;

pub use ctx::{RenderCtx, RenderTarget};
pub use quad::{QuadVertex, ScreenQuad, SCREEN_QUAD_VERTICES};
