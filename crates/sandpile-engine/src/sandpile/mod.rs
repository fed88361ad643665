//! Ping-pong sandpile simulation.
//!
//! Two grid textures alternate roles every frame: the simulation pass reads
//! the current one and writes the next state into the other, the display pass
//! draws that result, and the frame loop flips the roles once it is presented.

mod app;
mod buffers;
mod config;
mod display;
mod frame_loop;
mod grid;
mod palette;
mod ping_pong;
mod renderer;
mod shader;
mod simulation;

pub use app::SandpileApp;
pub use buffers::{StateBuffers, STATE_FORMAT};
pub use config::{SandpileConfig, DEFAULT_SHADER_DIR};
pub use display::DisplayPass;
pub use frame_loop::{FrameLoop, LoopEvent, LoopState};
pub use grid::{Edges, Grid, GridSize, Rule, NEIGHBOURS, SEED_STATES, TOPPLE_THRESHOLD};
pub use palette::{Palette, PaletteUniform, PALETTE_LEN};
pub use ping_pong::{BufferIndex, PingPong, Step};
pub use renderer::SandpileRenderer;
pub use shader::{
    ColorKind, CompiledShader, LinkedProgram, ResourceKind, ResourceSlot, ShaderError, ShaderProgram,
    ShaderSource,
};
pub use simulation::{SimParams, SimulationPass};
