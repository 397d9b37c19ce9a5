//! Cluster Grid Configuration
//!
//! Constants and configuration for the cluster grid that partitions the
//! camera's view volume for light assignment.
//!
//! Clusters divide the view frustum into a 3D grid:
//! - X/Y: Uniform slices of the camera's near-plane rectangle
//! - Z: Uniform slices of the `[near, far]` depth range
//!
//! Clusters are addressed by a linear index where X varies fastest:
//! `index = x + y * X + z * X * Y`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Default cap on lights stored per cluster.
pub const MAX_LIGHTS_PER_CLUSTER: u32 = 100;

/// Components per texel of the cluster texture (RGBA).
pub const TEXEL_COMPONENTS: usize = 4;

/// Largest light count whose indices are exactly representable in an f32 texel.
pub const MAX_EXACT_LIGHT_COUNT: usize = 1 << 24;

/// Default number of horizontal slices.
pub const DEFAULT_CLUSTERS_X: u32 = 16;

/// Default number of vertical slices.
pub const DEFAULT_CLUSTERS_Y: u32 = 9;

/// Default number of depth slices.
pub const DEFAULT_CLUSTERS_Z: u32 = 24;

/// Dimensions of the cluster grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGrid {
    /// Slices along screen-horizontal
    pub x: u32,
    /// Slices along screen-vertical
    pub y: u32,
    /// Slices along depth
    pub z: u32,
}

impl Default for ClusterGrid {
    fn default() -> Self {
        Self {
            x: DEFAULT_CLUSTERS_X,
            y: DEFAULT_CLUSTERS_Y,
            z: DEFAULT_CLUSTERS_Z,
        }
    }
}

impl ClusterGrid {
    /// Create a grid, rejecting any zero dimension.
    pub fn new(x: u32, y: u32, z: u32) -> Result<Self> {
        let grid = Self { x, y, z };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<()> {
        if self.x == 0 || self.y == 0 || self.z == 0 {
            return Err(ClusterError::InvalidGrid {
                x: self.x,
                y: self.y,
                z: self.z,
            });
        }
        Ok(())
    }

    /// Total number of clusters (X * Y * Z).
    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// Linear index of the cluster at `(x, y, z)`.
    ///
    /// X varies fastest, then Y, then Z.
    ///
    /// # Arguments
    ///
    /// * `x` - Column, 0 at the left edge of the view
    /// * `y` - Row, 0 at the bottom edge of the view
    /// * `z` - Depth slice, 0 nearest the camera
    ///
    /// # Returns
    ///
    /// `x + y * X + z * X * Y`, in `0..cluster_count()`.
    ///
    /// # Example
    ///
    /// ```
    /// use light_clusters::render::cluster_config::ClusterGrid;
    ///
    /// let grid = ClusterGrid::new(16, 9, 24).unwrap();
    /// assert_eq!(grid.cluster_index(0, 0, 0), 0);
    /// assert_eq!(grid.cluster_index(1, 2, 3), 1 + 2 * 16 + 3 * 16 * 9);
    /// assert_eq!(grid.cluster_coords(grid.cluster_index(5, 8, 23)), (5, 8, 23));
    /// ```
    #[inline]
    pub fn cluster_index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.x && y < self.y && z < self.z);
        x as usize + y as usize * self.x as usize + z as usize * self.x as usize * self.y as usize
    }

    /// Recover `(x, y, z)` from a linear cluster index.
    #[inline]
    pub fn cluster_coords(&self, index: usize) -> (u32, u32, u32) {
        debug_assert!(index < self.cluster_count());
        let per_slice = self.x as usize * self.y as usize;
        let z = index / per_slice;
        let rem = index % per_slice;
        let y = rem / self.x as usize;
        let x = rem % self.x as usize;
        (x as u32, y as u32, z as u32)
    }

    /// Near and far distance of a depth slice.
    ///
    /// Slices divide `[near, far]` uniformly.
    pub fn depth_slice_bounds(&self, slice: u32, near: f32, far: f32) -> (f32, f32) {
        let step = (far - near) / self.z as f32;
        (near + slice as f32 * step, near + (slice + 1) as f32 * step)
    }
}

/// How the cluster buffer is cleared before each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Zero only the count of every cluster. Index slots keep stale values
    /// that consumers never read past `count`.
    CountsOnly,
    /// Zero the whole buffer so identical inputs always give identical bytes.
    #[default]
    Full,
}

/// Where the shared near-plane rectangle is placed for each depth slice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateralScaling {
    /// Place the rectangle at each slice's own near distance. Deeper slices
    /// keep the near-plane extent and are not widened.
    #[default]
    NearPlane,
    /// Place the rectangle at the camera's near distance, giving the true
    /// perspective subdivision of the view frustum.
    PerspectiveCorrect,
}

/// Full configuration of a cluster assigner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub grid: ClusterGrid,
    pub max_lights_per_cluster: u32,
    pub reset_mode: ResetMode,
    pub lateral_scaling: LateralScaling,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            grid: ClusterGrid::default(),
            max_lights_per_cluster: MAX_LIGHTS_PER_CLUSTER,
            reset_mode: ResetMode::default(),
            lateral_scaling: LateralScaling::default(),
        }
    }
}

impl ClusterConfig {
    /// Default configuration with the given grid dimensions.
    pub fn with_grid(x: u32, y: u32, z: u32) -> Result<Self> {
        Ok(Self {
            grid: ClusterGrid::new(x, y, z)?,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if self.max_lights_per_cluster == 0 {
            return Err(ClusterError::InvalidMaxLights);
        }
        Ok(())
    }

    /// Texel rows each cluster occupies: one count slot plus the index slots,
    /// four per row.
    #[inline]
    pub fn rows_per_cluster(&self) -> usize {
        (self.max_lights_per_cluster as usize + 1).div_ceil(TEXEL_COMPONENTS)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClusterConfig::default();
        assert_eq!(config.grid, ClusterGrid::new(16, 9, 24).unwrap());
        assert_eq!(config.max_lights_per_cluster, 100);
        assert_eq!(config.reset_mode, ResetMode::Full);
        assert_eq!(config.lateral_scaling, LateralScaling::NearPlane);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            ClusterGrid::new(0, 4, 4),
            Err(ClusterError::InvalidGrid { x: 0, y: 4, z: 4 })
        ));
        assert!(ClusterGrid::new(4, 0, 4).is_err());
        assert!(ClusterGrid::new(4, 4, 0).is_err());
    }

    #[test]
    fn test_zero_max_lights_rejected() {
        let config = ClusterConfig {
            max_lights_per_cluster: 0,
            ..ClusterConfig::default()
        };
        assert!(matches!(config.validate(), Err(ClusterError::InvalidMaxLights)));
    }

    #[test]
    fn test_rows_per_cluster() {
        // 100 indices + 1 count = 101 slots -> 26 rows of 4
        assert_eq!(ClusterConfig::default().rows_per_cluster(), 26);

        let mut config = ClusterConfig::default();
        config.max_lights_per_cluster = 3;
        assert_eq!(config.rows_per_cluster(), 1);
        config.max_lights_per_cluster = 4;
        assert_eq!(config.rows_per_cluster(), 2);
    }

    #[test]
    fn test_cluster_index_calculation() {
        let grid = ClusterGrid::new(16, 9, 24).unwrap();
        assert_eq!(grid.cluster_index(0, 0, 0), 0);
        assert_eq!(grid.cluster_index(1, 0, 0), 1);
        assert_eq!(grid.cluster_index(0, 1, 0), 16);
        assert_eq!(grid.cluster_index(0, 0, 1), 16 * 9);
        assert_eq!(grid.cluster_index(15, 8, 23), grid.cluster_count() - 1);
    }

    #[test]
    fn test_cluster_coords_roundtrip() {
        let grid = ClusterGrid::new(3, 5, 7).unwrap();
        for index in 0..grid.cluster_count() {
            let (x, y, z) = grid.cluster_coords(index);
            assert_eq!(grid.cluster_index(x, y, z), index);
        }
    }

    #[test]
    fn test_depth_slice_bounds_uniform() {
        let grid = ClusterGrid::new(1, 1, 4).unwrap();
        let (n0, f0) = grid.depth_slice_bounds(0, 1.0, 9.0);
        assert_eq!((n0, f0), (1.0, 3.0));
        let (n3, f3) = grid.depth_slice_bounds(3, 1.0, 9.0);
        assert_eq!((n3, f3), (7.0, 9.0));

        // Each slice's far should equal the next slice's near
        for i in 0..3 {
            let (_, this_far) = grid.depth_slice_bounds(i, 1.0, 9.0);
            let (next_near, _) = grid.depth_slice_bounds(i + 1, 1.0, 9.0);
            assert!((this_far - next_near).abs() < 1e-6);
        }
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "grid": { "x": 4, "y": 2, "z": 8 },
            "max_lights_per_cluster": 32,
            "reset_mode": "counts_only",
            "lateral_scaling": "perspective_correct"
        }"#;
        let config = ClusterConfig::from_json_str(json).unwrap();
        assert_eq!(config.grid, ClusterGrid { x: 4, y: 2, z: 8 });
        assert_eq!(config.max_lights_per_cluster, 32);
        assert_eq!(config.reset_mode, ResetMode::CountsOnly);
        assert_eq!(config.lateral_scaling, LateralScaling::PerspectiveCorrect);
    }

    #[test]
    fn test_config_from_json_defaults_missing_fields() {
        let config = ClusterConfig::from_json_str(r#"{ "grid": { "x": 2, "y": 2, "z": 2 } }"#).unwrap();
        assert_eq!(config.max_lights_per_cluster, MAX_LIGHTS_PER_CLUSTER);
        assert_eq!(config.reset_mode, ResetMode::Full);
    }

    #[test]
    fn test_config_from_json_rejects_zero_grid() {
        let result = ClusterConfig::from_json_str(r#"{ "grid": { "x": 0, "y": 2, "z": 2 } }"#);
        assert!(matches!(result, Err(ClusterError::InvalidGrid { .. })));
    }
}
