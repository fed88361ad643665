use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::{QuadVertex, ScreenQuad};

use super::buffers::{self, STATE_FORMAT, StateBuffers};
use super::grid::{Edges, GridSize, Rule};
use super::ping_pong::BufferIndex;
use super::shader::ShaderProgram;

/// Matches `struct SimParams` in `sandpile.frag.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    pub dim: [f32; 2],
    pub threshold: u32,
    /// `0` wraps, `1` drops grains at the border.
    pub open_edges: u32,
}

impl SimParams {
    pub fn new(size: GridSize, rule: Rule) -> Self {
        Self {
            dim: size.as_vec2(),
            threshold: rule.threshold(),
            open_edges: (rule.edges() == Edges::Open) as u32,
        }
    }
}

/// Advances the grid by one step: reads one state buffer, writes the other.
pub struct SimulationPass {
    pipeline: wgpu::RenderPipeline,
    _params_ubo: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
}

impl SimulationPass {
    pub fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        buffers: &StateBuffers,
        rule: Rule,
    ) -> Self {
        let params = SimParams::new(buffers.size(), rule);
        let params_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sandpile sim params ubo"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sandpile sim bgl"),
            entries: &[
                buffers::state_texture_entry(0),
                buffers::uniform_entry::<SimParams>(1),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sandpile sim pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let vertex_buffers = [QuadVertex::layout()];
        let targets = [Some(wgpu::ColorTargetState {
            format: STATE_FORMAT,
            // Integer targets cannot blend.
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sandpile sim pipeline"),
            layout: Some(&pipeline_layout),
            vertex: program.vertex_state(&vertex_buffers),
            fragment: Some(program.fragment_state(&targets)),
            primitive: quad_primitive(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let bind_groups = buffers::state_bind_groups(
            device,
            "sandpile sim bind group",
            &bind_group_layout,
            buffers,
            &params_ubo,
        );

        Self {
            pipeline,
            _params_ubo: params_ubo,
            bind_groups,
        }
    }

    /// Records one step from `src` into `src.other()`.
    ///
    /// Every texel of the target is overwritten, so its previous contents
    /// are never loaded.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        buffers: &StateBuffers,
        quad: &ScreenQuad,
        src: BufferIndex,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sandpile sim pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: buffers.target(src.other()),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_groups[src.as_usize()], &[]);
        quad.draw(&mut rpass);
    }
}

pub(super) fn quad_primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}
