use wgpu::util::DeviceExt;

use super::grid::{Grid, GridSize};
use super::ping_pong::BufferIndex;

/// Texel format of the grid: one unsigned height per cell.
pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

struct StateBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// The two grid textures the simulation alternates between.
///
/// Both are seeded with the same grid; each is readable from shaders and
/// usable as a color attachment through the same view.
pub struct StateBuffers {
    size: GridSize,
    buffers: [StateBuffer; 2],
}

impl StateBuffers {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, seed: &Grid) -> Self {
        let size = seed.size();
        log::debug!("creating state buffers ({}x{})", size.width, size.height);

        let buffer = |label: &'static str| {
            let texture = device.create_texture_with_data(
                queue,
                &wgpu::TextureDescriptor {
                    label: Some(label),
                    size: size.extent(),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: STATE_FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::COPY_DST
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                seed.as_bytes(),
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            StateBuffer { texture, view }
        };

        Self {
            size,
            buffers: [buffer("sandpile state 0"), buffer("sandpile state 1")],
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn texture(&self, index: BufferIndex) -> &wgpu::Texture {
        &self.buffers[index.as_usize()].texture
    }

    /// View for sampling and for rendering into buffer `index`.
    pub fn target(&self, index: BufferIndex) -> &wgpu::TextureView {
        &self.buffers[index.as_usize()].view
    }
}

/// Bind group layout entry for reading a state texture with `textureLoad`.
pub fn state_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Uint,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Bind group layout entry for a fragment-stage uniform of type `T`.
pub fn uniform_entry<T>(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

/// One bind group per source buffer, indexed by [`BufferIndex::as_usize`].
pub fn state_bind_groups(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffers: &StateBuffers,
    uniform: &wgpu::Buffer,
) -> [wgpu::BindGroup; 2] {
    BufferIndex::BOTH.map(|index| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(buffers.target(index)),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform.as_entire_binding(),
                },
            ],
        })
    })
}
