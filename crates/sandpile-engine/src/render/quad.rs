use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Two triangles spanning the unit square, as a plain triangle list.
pub const SCREEN_QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

/// Static vertex buffer shared by every full-target pass.
///
/// Drawing it rasterizes every pixel of the bound target exactly once.
pub struct ScreenQuad {
    vbo: wgpu::Buffer,
}

impl ScreenQuad {
    pub fn new(device: &wgpu::Device) -> Self {
        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sandpile screen quad vbo"),
            contents: bytemuck::cast_slice(&SCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { vbo }
    }

    pub fn vertex_count(&self) -> u32 {
        SCREEN_QUAD_VERTICES.len() as u32
    }

    /// Binds the quad to vertex slot 0 and issues the draw.
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vbo.slice(..));
        rpass.draw(0..self.vertex_count(), 0..1);
    }
}
