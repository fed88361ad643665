use crate::render::{RenderCtx, RenderTarget, ScreenQuad};

use super::buffers::StateBuffers;
use super::config::SandpileConfig;
use super::display::DisplayPass;
use super::grid::Grid;
use super::ping_pong::Step;
use super::shader::{ColorKind, LinkedProgram, ResourceSlot, ShaderError};
use super::simulation::SimulationPass;

pub const SANDPILE_VERT: &str = "sandpile.vert.wgsl";
pub const SANDPILE_FRAG: &str = "sandpile.frag.wgsl";
pub const DISPLAY_VERT: &str = "display.vert.wgsl";
pub const DISPLAY_FRAG: &str = "display.frag.wgsl";

/// State texture at binding 0, pass uniform at binding 1.
pub(super) const PASS_RESOURCES: [ResourceSlot; 2] = [
    ResourceSlot::texture(0, 0, ColorKind::Uint),
    ResourceSlot::uniform(0, 1),
];

/// Owns every GPU resource of the simulation.
///
/// Dropping it releases them; it must go before the device does.
pub struct SandpileRenderer {
    quad: ScreenQuad,
    buffers: StateBuffers,
    simulation: SimulationPass,
    display: DisplayPass,
}

impl SandpileRenderer {
    /// Compiles both programs, then creates the quad, seeded buffers and passes.
    ///
    /// Shaders are checked before any GPU resource exists.
    pub fn new(ctx: &RenderCtx<'_>, config: &SandpileConfig) -> Result<Self, ShaderError> {
        let dir = config.shader_dir.as_path();
        let sim_program = LinkedProgram::load(
            dir,
            "sandpile",
            SANDPILE_VERT,
            SANDPILE_FRAG,
            &PASS_RESOURCES,
            ColorKind::Uint,
        )?;
        // Surface formats are all float or normalized.
        let display_program = LinkedProgram::load(
            dir,
            "display",
            DISPLAY_VERT,
            DISPLAY_FRAG,
            &PASS_RESOURCES,
            ColorKind::Float,
        )?;

        let quad = ScreenQuad::new(ctx.device);
        let buffers = StateBuffers::new(ctx.device, ctx.queue, &Grid::seeded(config.grid));

        log::debug!("creating sandpile pipelines");
        let simulation = SimulationPass::new(
            ctx.device,
            &sim_program.create_modules(ctx.device),
            &buffers,
            config.rule,
        );
        let display = DisplayPass::new(
            ctx,
            &display_program.create_modules(ctx.device),
            &buffers,
            &config.palette,
            config.rule.threshold(),
        );

        Ok(Self {
            quad,
            buffers,
            simulation,
            display,
        })
    }

    /// Records one step into `step.target` and draws the result.
    ///
    /// Both passes share the frame's encoder, so the display pass reads what
    /// the simulation pass wrote.
    pub fn run_cycle(&self, target: &mut RenderTarget<'_>, step: Step) {
        self.simulation
            .run(target.encoder, &self.buffers, &self.quad, step.current);
        self.display.run(target, &self.quad, step.target);
    }
}
