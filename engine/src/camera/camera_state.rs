//! Per-frame camera state consumed by the cluster partitioner.
//!
//! ## Coordinate System
//!
//! - X: Right (+X is screen right)
//! - Y: Up (+Y is screen up)
//! - Camera looks along `forward`; the default camera looks toward -Z

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Camera parameters needed to partition the view frustum into clusters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Vertical field of view in degrees, in (0, 180)
    pub fov_y_degrees: f32,
    /// Aspect ratio (width / height)
    pub aspect_ratio: f32,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub far: f32,
    /// Camera position in world space
    pub position: Vec3,
    /// View direction (need not be normalized)
    pub forward: Vec3,
    /// Up hint (need not be normalized or orthogonal to forward)
    pub up: Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

/// Orthonormal camera basis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl CameraState {
    /// Camera at `position` looking toward `target`.
    pub fn looking_at(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            fov_y_degrees,
            aspect_ratio,
            near,
            far,
            position,
            forward: target - position,
            up,
        }
    }

    /// Camera from yaw and pitch angles in radians.
    ///
    /// Yaw 0 looks toward -Z, positive pitch looks up. The up vector is the
    /// world Y axis re-orthogonalized against the view direction, falling back
    /// to +Z-facing up when looking straight up or down.
    pub fn from_angles(
        position: Vec3,
        yaw: f32,
        pitch: f32,
        fov_y_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let forward = Vec3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        )
        .normalize();

        let right = forward.cross(Vec3::Y);
        let right = if right.length_squared() > 1e-8 {
            right.normalize()
        } else {
            Vec3::X
        };
        let up = right.cross(forward).normalize();

        Self {
            fov_y_degrees,
            aspect_ratio,
            near,
            far,
            position,
            forward,
            up,
        }
    }

    /// Reject parameters that would produce degenerate frusta.
    pub fn validate(&self) -> Result<()> {
        let scalars = [self.fov_y_degrees, self.aspect_ratio, self.near, self.far];
        if scalars.iter().any(|v| !v.is_finite())
            || !self.position.is_finite()
            || !self.forward.is_finite()
            || !self.up.is_finite()
        {
            return Err(ClusterError::InvalidCamera("non-finite camera parameter".into()));
        }
        if self.near <= 0.0 {
            return Err(ClusterError::InvalidCamera(format!(
                "near plane must be positive, got {}",
                self.near
            )));
        }
        if self.near >= self.far {
            return Err(ClusterError::InvalidCamera(format!(
                "near ({}) must be less than far ({})",
                self.near, self.far
            )));
        }
        if self.fov_y_degrees <= 0.0 || self.fov_y_degrees >= 180.0 {
            return Err(ClusterError::InvalidCamera(format!(
                "vertical fov must be in (0, 180) degrees, got {}",
                self.fov_y_degrees
            )));
        }
        if self.aspect_ratio <= 0.0 {
            return Err(ClusterError::InvalidCamera(format!(
                "aspect ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if self.forward.length_squared() < 1e-12 || self.up.length_squared() < 1e-12 {
            return Err(ClusterError::InvalidCamera("zero-length forward or up vector".into()));
        }
        if self.forward.normalize().cross(self.up.normalize()).length_squared() < 1e-12 {
            return Err(ClusterError::InvalidCamera("forward and up are parallel".into()));
        }
        Ok(())
    }

    /// Orthonormal basis with `right = forward × up` and `up` re-derived
    /// from `right × forward`. Call on a validated camera.
    pub fn basis(&self) -> CameraBasis {
        let forward = self.forward.normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        CameraBasis { forward, up, right }
    }

    /// Half extents `(w, h)` of the camera's near-plane rectangle.
    pub fn near_half_extents(&self) -> (f32, f32) {
        let half_fov = (self.fov_y_degrees * 0.5).to_radians();
        let half_height = half_fov.tan() * self.near;
        (self.aspect_ratio * half_height, half_height)
    }
}
