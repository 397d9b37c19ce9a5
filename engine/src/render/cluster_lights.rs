//! Light Spheres for Cluster Assignment
//!
//! Lights enter the clustering pass as world-space bounding spheres. A light is
//! identified by its position in the slice handed to the frame, so indices are
//! stable for one frame only.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::cluster_config::MAX_EXACT_LIGHT_COUNT;
use crate::error::{ClusterError, Result};

/// GPU-compatible light bounding sphere.
///
/// Layout (16 bytes):
/// - position: vec3<f32> (12 bytes) - World position of the light
/// - radius:   f32 (4 bytes) - Influence radius
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
pub struct ClusterLight {
    /// World position (x, y, z)
    pub position: [f32; 3],
    /// Influence radius (non-negative)
    pub radius: f32,
}

static_assertions::assert_eq_size!(ClusterLight, [u8; 16]);

impl Default for ClusterLight {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            radius: 1.0,
        }
    }
}

impl ClusterLight {
    pub fn new(position: [f32; 3], radius: f32) -> Self {
        debug_assert!(radius >= 0.0, "light radius must be non-negative");
        Self { position, radius }
    }

    /// Set position and return self for chaining.
    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    /// Set radius and return self for chaining.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Describe why this sphere cannot be culled, if it cannot.
    ///
    /// A negative radius would reject spheres whose center lies inside a
    /// cluster, and NaN passes every plane test.
    pub fn invalid_reason(&self) -> Option<String> {
        if !self.position.iter().all(|v| v.is_finite()) {
            return Some(format!("non-finite position {:?}", self.position));
        }
        if !self.radius.is_finite() {
            return Some(format!("non-finite radius {}", self.radius));
        }
        if self.radius < 0.0 {
            return Some(format!("negative radius {}", self.radius));
        }
        None
    }
}

/// Reject light counts whose indices a float texel cannot hold exactly.
///
/// # Arguments
///
/// * `count` - Number of lights submitted for the frame
///
/// # Returns
///
/// `Ok(())` for at most [`MAX_EXACT_LIGHT_COUNT`] lights, otherwise
/// [`ClusterError::TooManyLights`].
pub fn check_light_count(count: usize) -> Result<()> {
    if count > MAX_EXACT_LIGHT_COUNT {
        return Err(ClusterError::TooManyLights {
            count,
            max: MAX_EXACT_LIGHT_COUNT,
        });
    }
    Ok(())
}

/// Validate a frame's light slice: its length and every sphere.
///
/// Returns [`ClusterError::InvalidLight`] naming the first bad light.
///
/// # Example
///
/// ```
/// use light_clusters::render::cluster_lights::{validate_lights, ClusterLight};
///
/// let lights = [ClusterLight::new([0.0, 0.0, -5.0], 1.0)];
/// assert!(validate_lights(&lights).is_ok());
///
/// let bad = [lights[0], ClusterLight { position: [0.0, 0.0, -5.0], radius: -1.0 }];
/// assert!(validate_lights(&bad).is_err());
/// ```
pub fn validate_lights(lights: &[ClusterLight]) -> Result<()> {
    check_light_count(lights.len())?;
    for (index, light) in lights.iter().enumerate() {
        if let Some(reason) = light.invalid_reason() {
            return Err(ClusterError::InvalidLight { index, reason });
        }
    }
    Ok(())
}

impl From<(Vec3, f32)> for ClusterLight {
    fn from((center, radius): (Vec3, f32)) -> Self {
        Self::new(center.to_array(), radius)
    }
}
