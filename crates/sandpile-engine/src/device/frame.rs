/// Represents a single acquired frame.
///
/// This object is short-lived and must be finalized promptly. Holding the surface
/// texture prevents acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,

    /// View of the surface texture. Passes resolve into it when multisampling
    /// is enabled, otherwise they render into it directly.
    pub view: wgpu::TextureView,

    pub encoder: wgpu::CommandEncoder,
}
