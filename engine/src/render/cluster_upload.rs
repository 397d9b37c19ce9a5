//! Cluster Texture Publishing
//!
//! The assigner hands each finished frame to a [`ClusterSink`]. Two sinks are
//! provided:
//!
//! - [`GpuClusterTexture`]: an `Rgba32Float` texture updated with
//!   `Queue::write_texture`, bound for texel fetches in fragment and compute
//!   shaders
//! - [`RecordingSink`]: keeps a copy of the last published bytes

use super::cluster_buffers::{ClusterTexture, TEXEL_BYTES};
use crate::error::{ClusterError, Result};

/// Receives the cluster texture once per frame.
pub trait ClusterSink {
    /// Store or upload a finished texture.
    fn publish(&mut self, texture: &ClusterTexture) -> Result<()>;
}

/// Sink that records the last published frame.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    data: Vec<f32>,
    width: usize,
    height: usize,
    publish_count: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the last published frame.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Floats of the last published frame.
    pub fn floats(&self) -> &[f32] {
        &self.data
    }

    /// `(width, height)` in texels of the last published frame.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn publish_count(&self) -> usize {
        self.publish_count
    }
}

impl ClusterSink for RecordingSink {
    fn publish(&mut self, texture: &ClusterTexture) -> Result<()> {
        self.data.clear();
        self.data.extend_from_slice(texture.as_slice());
        self.width = texture.width();
        self.height = texture.height();
        self.publish_count += 1;
        Ok(())
    }
}

/// Convert texel dimensions to a `wgpu` extent within `max_dimension`.
///
/// # Arguments
///
/// * `width` - Texture width in texels (the cluster count)
/// * `height` - Texture height in texels (rows per cluster)
/// * `max_dimension` - The device's `max_texture_dimension_2d`
///
/// # Returns
///
/// `(width, height)` as `u32`, or [`ClusterError::Upload`] if either side
/// does not fit.
pub fn texture_extent(width: usize, height: usize, max_dimension: u32) -> Result<(u32, u32)> {
    let fits = |side: usize| u32::try_from(side).ok().filter(|&side| side <= max_dimension);
    match (fits(width), fits(height)) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(ClusterError::Upload(format!(
            "cluster texture {}x{} exceeds the device limit of {}",
            width, height, max_dimension
        ))),
    }
}

/// GPU texture holding the per-cluster light lists.
///
/// Width is the cluster count and height the rows per cluster, so shaders
/// fetch texel `(cluster, row)` directly.
pub struct GpuClusterTexture {
    /// The GPU texture containing the cluster data
    pub texture: wgpu::Texture,
    /// Texture view for shader access
    pub view: wgpu::TextureView,
    /// Bind group layout (needed for pipeline creation)
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Bind group for shader access
    pub bind_group: wgpu::BindGroup,
    queue: wgpu::Queue,
    width: u32,
    height: u32,
    uploads: u64,
}

impl GpuClusterTexture {
    /// Create a texture sized for `layout`.
    ///
    /// Fails if either dimension exceeds the device's 2D texture limit.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, layout: &ClusterTexture) -> Result<Self> {
        let (width, height) = texture_extent(
            layout.width(),
            layout.height(),
            device.limits().max_texture_dimension_2d,
        )?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Cluster Light Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Cluster Light Texture View"),
            ..Default::default()
        });

        // Rgba32Float is not filterable; shaders use textureLoad
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cluster Light Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cluster Light Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        log::info!(
            "[Clusters] GPU texture {}x{} Rgba32Float ({} KB)",
            width,
            height,
            layout.size_bytes() / 1024
        );

        Ok(Self {
            texture,
            view,
            bind_group_layout,
            bind_group,
            queue: queue.clone(),
            width,
            height,
            uploads: 0,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames uploaded so far.
    #[inline]
    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

impl ClusterSink for GpuClusterTexture {
    fn publish(&mut self, texture: &ClusterTexture) -> Result<()> {
        if texture.width() != self.width as usize || texture.height() != self.height as usize {
            return Err(ClusterError::Upload(format!(
                "cluster data is {}x{} but the GPU texture is {}x{}",
                texture.width(),
                texture.height(),
                self.width,
                self.height
            )));
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texture.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * TEXEL_BYTES as u32),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.uploads += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::cluster_config::ClusterConfig;
    use crate::render::cluster_cull::ClusterLightList;

    #[test]
    fn test_recording_sink_copies_bytes() {
        let config = ClusterConfig::with_grid(2, 1, 1).unwrap();
        let mut texture = ClusterTexture::new(&config);
        let mut list = ClusterLightList::new(config.max_lights_per_cluster);
        list.add(3);
        texture.encode_cluster(1, &list);

        let mut sink = RecordingSink::new();
        assert_eq!(sink.publish_count(), 0);
        sink.publish(&texture).unwrap();

        assert_eq!(sink.publish_count(), 1);
        assert_eq!(sink.bytes(), texture.as_bytes());
        assert_eq!(sink.dimensions(), (2, 26));
        assert_eq!(&sink.floats()[4..6], &[1.0, 3.0]);
    }

    #[test]
    fn test_texture_extent_limits() {
        assert_eq!(texture_extent(3456, 26, 8192).unwrap(), (3456, 26));
        assert_eq!(texture_extent(8192, 1, 8192).unwrap(), (8192, 1));
        assert!(matches!(texture_extent(8193, 26, 8192), Err(ClusterError::Upload(_))));
        assert!(matches!(texture_extent(16, 9000, 8192), Err(ClusterError::Upload(_))));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_texture_extent_does_not_wrap() {
        // 2^32 + 16 would wrap to 16 under a plain cast
        let width = (u32::MAX as usize) + 17;
        assert!(matches!(texture_extent(width, 26, u32::MAX), Err(ClusterError::Upload(_))));
    }

    #[test]
    fn test_recording_sink_replaces_previous_frame() {
        let small = ClusterTexture::new(&ClusterConfig::with_grid(1, 1, 1).unwrap());
        let large = ClusterTexture::new(&ClusterConfig::with_grid(4, 1, 1).unwrap());

        let mut sink = RecordingSink::new();
        sink.publish(&large).unwrap();
        sink.publish(&small).unwrap();
        assert_eq!(sink.bytes().len(), small.size_bytes());
        assert_eq!(sink.publish_count(), 2);
    }
}
