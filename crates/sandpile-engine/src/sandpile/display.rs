use wgpu::util::DeviceExt;

use crate::render::{QuadVertex, RenderCtx, RenderTarget, ScreenQuad};

use super::buffers::{self, StateBuffers};
use super::palette::{Palette, PaletteUniform};
use super::ping_pong::BufferIndex;
use super::shader::ShaderProgram;
use super::simulation::quad_primitive;

/// Draws a state buffer to the window, one palette color per cell.
pub struct DisplayPass {
    pipeline: wgpu::RenderPipeline,
    _palette_ubo: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
}

impl DisplayPass {
    pub fn new(
        ctx: &RenderCtx<'_>,
        program: &ShaderProgram,
        buffers: &StateBuffers,
        palette: &Palette,
        threshold: u32,
    ) -> Self {
        let device = ctx.device;

        let uniform = palette.uniform(ctx.surface_format.is_srgb(), threshold);
        let palette_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sandpile palette ubo"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sandpile display bgl"),
            entries: &[
                buffers::state_texture_entry(0),
                buffers::uniform_entry::<PaletteUniform>(1),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sandpile display pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let vertex_buffers = [QuadVertex::layout()];
        let targets = [Some(wgpu::ColorTargetState {
            format: ctx.surface_format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sandpile display pipeline"),
            layout: Some(&pipeline_layout),
            vertex: program.vertex_state(&vertex_buffers),
            fragment: Some(program.fragment_state(&targets)),
            primitive: quad_primitive(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: ctx.sample_count,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        });

        let bind_groups = buffers::state_bind_groups(
            device,
            "sandpile display bind group",
            &bind_group_layout,
            buffers,
            &palette_ubo,
        );

        Self {
            pipeline,
            _palette_ubo: palette_ubo,
            bind_groups,
        }
    }

    /// Records a full-window draw of buffer `result`.
    pub fn run(&self, target: &mut RenderTarget<'_>, quad: &ScreenQuad, result: BufferIndex) {
        let color_attachment = target.color_attachment(wgpu::Color::BLACK);
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sandpile display pass"),
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_groups[result.as_usize()], &[]);
        quad.draw(&mut rpass);
    }
}
