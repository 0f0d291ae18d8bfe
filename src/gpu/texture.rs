//! Framework-agnostic render-target texture abstraction.

/// A render-target texture and its default view.
///
/// Used to decouple texture creation from any windowing or GUI framework.
/// The texture is created with `RENDER_ATTACHMENT | TEXTURE_BINDING | COPY_SRC`
/// usage flags, making it suitable for off-screen rendering followed by
/// read-back or compositing.
pub struct RenderTarget {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Create a new render-target texture with the given dimensions and format.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("RenderTarget"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Side length of the procedurally generated soft-circle sprite used by
/// the marine-snow particle field's fragment stage (spec §4.3).
pub const SOFT_CIRCLE_SIZE: u32 = 32;

/// Rasterize a `size`×`size` RGBA8 soft-edged circular gradient: opaque
/// white at the center, smoothly falling to fully transparent at the
/// edge. Pulled out as a pure function (no GPU handle needed) so the
/// falloff curve is unit-testable without a device.
#[must_use]
pub fn soft_circle_rgba8(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let center = (size as f32 - 1.0) * 0.5;
    let radius = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let dist = (dx * dx + dy * dy).sqrt() / radius;
            let alpha = (1.0 - dist).clamp(0.0, 1.0).powf(1.8);
            let byte = (alpha * 255.0).round() as u8;
            pixels.extend_from_slice(&[255, 255, 255, byte]);
        }
    }
    pixels
}

/// A sampleable GPU texture holding the procedural soft-circle sprite,
/// plus a matching filtering sampler.
pub struct SoftCircleTexture {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// Default full-texture view.
    pub view: wgpu::TextureView,
    /// Clamp-to-edge linear sampler matching this texture.
    pub sampler: wgpu::Sampler,
}

impl SoftCircleTexture {
    /// Upload the procedurally generated soft-circle sprite to the GPU.
    #[must_use]
    pub fn create(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let size = SOFT_CIRCLE_SIZE;
        let pixels = soft_circle_rgba8(size);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Marine Snow Soft Circle"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = crate::gpu::pipeline_helpers::linear_sampler(device, "Soft Circle Sampler");

        Self {
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_circle_center_is_opaque() {
        let size = 32;
        let pixels = soft_circle_rgba8(size);
        let center = (size / 2) as usize;
        let idx = (center * size as usize + center) * 4;
        assert_eq!(pixels[idx + 3], 255);
    }

    #[test]
    fn soft_circle_corner_is_transparent() {
        let size = 32;
        let pixels = soft_circle_rgba8(size);
        // Top-left corner is outside the inscribed circle.
        assert_eq!(pixels[3], 0);
    }

    #[test]
    fn soft_circle_buffer_has_expected_length() {
        let size = 16;
        let pixels = soft_circle_rgba8(size);
        assert_eq!(pixels.len(), (size * size * 4) as usize);
    }
}
