use std::path::PathBuf;

use super::grid::{GridSize, Rule};
use super::palette::Palette;

/// Directory holding the shipped WGSL files.
pub const DEFAULT_SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders");

/// Simulation and display settings.
#[derive(Debug, Clone)]
pub struct SandpileConfig {
    /// Where `sandpile.{vert,frag}.wgsl` and `display.{vert,frag}.wgsl` live.
    pub shader_dir: PathBuf,
    pub grid: GridSize,
    pub rule: Rule,
    pub palette: Palette,
}

impl Default for SandpileConfig {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from(DEFAULT_SHADER_DIR),
            grid: GridSize::default(),
            rule: Rule::default(),
            palette: Palette::default(),
        }
    }
}
