/// One acquired surface frame.
///
/// Must be submitted promptly; holding the surface texture blocks acquisition
/// of the next frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
