//! Cluster Texture Buffer
//!
//! CPU-side storage for the per-cluster light lists, laid out as an RGBA32F
//! texture that shaders read with texel fetches.
//!
//! ## Layout
//!
//! The texture is `cluster_count` texels wide and `rows_per_cluster` texels
//! high. Each column holds one cluster's slots, four per texel:
//!
//! ```text
//!            cluster 0        cluster 1        ...
//! row 0    [count i0 i1 i2] [count i0 i1 i2]
//! row 1    [i3 i4 i5 i6]    [i3 i4 i5 i6]
//! ...
//! ```
//!
//! Slot `k` of a cluster (`k = 0` is the count) lives in row `k / 4`,
//! component `k % 4`. The float offset of `(cluster, row)` is
//! `4 * cluster + 4 * row * cluster_count`.
//!
//! Values are stored as f32; counts and indices are exact up to 2^24.

use super::cluster_config::{ClusterConfig, ResetMode, TEXEL_COMPONENTS};
use super::cluster_cull::ClusterLightList;

/// Bytes per RGBA32F texel.
pub const TEXEL_BYTES: usize = TEXEL_COMPONENTS * std::mem::size_of::<f32>();

/// Packed per-cluster light lists in texture layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterTexture {
    data: Vec<f32>,
    cluster_count: usize,
    rows: usize,
    max_lights: u32,
}

impl ClusterTexture {
    /// Allocate a zeroed texture sized for `config`.
    pub fn new(config: &ClusterConfig) -> Self {
        let cluster_count = config.grid.cluster_count();
        let rows = config.rows_per_cluster();
        Self {
            data: vec![0.0; cluster_count * rows * TEXEL_COMPONENTS],
            cluster_count,
            rows,
            max_lights: config.max_lights_per_cluster,
        }
    }

    /// Texture width in texels (one column per cluster).
    #[inline]
    pub fn width(&self) -> usize {
        self.cluster_count
    }

    /// Texture height in texels.
    #[inline]
    pub fn height(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    #[inline]
    pub fn max_lights(&self) -> u32 {
        self.max_lights
    }

    /// Float offset of the first component of texel `(cluster, row)`.
    ///
    /// # Arguments
    ///
    /// * `cluster` - Linear cluster index (the texel column)
    /// * `row` - Texel row, 0 holding the count and the first three indices
    ///
    /// # Returns
    ///
    /// `4 * cluster + 4 * row * cluster_count`.
    ///
    /// # Example
    ///
    /// ```
    /// use light_clusters::render::{ClusterConfig, ClusterTexture};
    ///
    /// // 2 clusters, 26 rows each at the default cap of 100
    /// let texture = ClusterTexture::new(&ClusterConfig::with_grid(2, 1, 1).unwrap());
    /// assert_eq!(texture.buffer_index(1, 0), 4);
    /// assert_eq!(texture.buffer_index(0, 1), 8);
    /// assert_eq!(texture.buffer_index(1, 25), 4 + 4 * 25 * 2);
    /// ```
    #[inline]
    pub fn buffer_index(&self, cluster: usize, row: usize) -> usize {
        debug_assert!(cluster < self.cluster_count && row < self.rows);
        TEXEL_COMPONENTS * cluster + TEXEL_COMPONENTS * row * self.cluster_count
    }

    /// Float offset of slot `slot` of `cluster`.
    #[inline]
    fn slot_index(&self, cluster: usize, slot: usize) -> usize {
        let component = slot % TEXEL_COMPONENTS;
        let row = slot / TEXEL_COMPONENTS;
        self.buffer_index(cluster, row) + component
    }

    /// Clear the texture before a new frame.
    pub fn reset(&mut self, mode: ResetMode) {
        match mode {
            ResetMode::Full => self.data.fill(0.0),
            ResetMode::CountsOnly => {
                for cluster in 0..self.cluster_count {
                    let index = self.buffer_index(cluster, 0);
                    self.data[index] = 0.0;
                }
            }
        }
    }

    /// Write one cluster's count and indices.
    pub fn encode_cluster(&mut self, cluster: usize, list: &ClusterLightList) {
        debug_assert!(list.len() <= self.max_lights as usize);
        let count_index = self.slot_index(cluster, 0);
        self.data[count_index] = list.len() as f32;
        for (i, light_index) in list.iter().enumerate() {
            let index = self.slot_index(cluster, i + 1);
            self.data[index] = light_index as f32;
        }
    }

    /// Light count stored for `cluster`.
    #[inline]
    pub fn cluster_light_count(&self, cluster: usize) -> u32 {
        self.data[self.buffer_index(cluster, 0)] as u32
    }

    /// Read back one cluster's light indices.
    pub fn decode_cluster(&self, cluster: usize) -> Vec<u32> {
        let count = self.cluster_light_count(cluster) as usize;
        (1..=count)
            .map(|slot| self.data[self.slot_index(cluster, slot)] as u32)
            .collect()
    }

    /// Raw float data in texture order.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes for GPU upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Bytes per texture row.
    #[inline]
    pub fn bytes_per_row(&self) -> usize {
        self.cluster_count * TEXEL_BYTES
    }

    /// Total size in bytes.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}
