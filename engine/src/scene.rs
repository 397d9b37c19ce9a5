//! Scene files for offline clustering runs.
//!
//! A scene bundles a configuration, a camera and a light list, stored as
//! pretty-printed JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::CameraState;
use crate::error::Result;
use crate::render::cluster_lights::validate_lights;
use crate::render::{ClusterConfig, ClusterLight};

/// Everything needed to run the clustering pass offline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterScene {
    pub config: ClusterConfig,
    pub camera: CameraState,
    pub lights: Vec<ClusterLight>,
}

impl ClusterScene {
    /// Lights spread evenly over `rings` horizontal rings around the origin,
    /// with the camera placed outside the outermost ring looking at the center.
    pub fn light_rings(light_count: usize, rings: usize, ring_radius: f32, light_radius: f32) -> Self {
        let rings = rings.max(1);
        let per_ring = light_count.div_ceil(rings).max(1);

        let lights = (0..light_count)
            .map(|i| {
                let ring = i / per_ring;
                let slot = i % per_ring;
                let angle = slot as f32 / per_ring as f32 * std::f32::consts::TAU;
                let radius = ring_radius * (ring + 1) as f32 / rings as f32;
                let height = (ring as f32 - (rings - 1) as f32 * 0.5) * light_radius;
                ClusterLight::new(
                    [radius * angle.cos(), height, radius * angle.sin()],
                    light_radius,
                )
            })
            .collect();

        let camera = CameraState {
            position: Vec3::new(0.0, ring_radius * 0.5, ring_radius * 2.0),
            forward: Vec3::new(0.0, -ring_radius * 0.5, -ring_radius * 2.0),
            far: ring_radius * 4.0,
            ..CameraState::default()
        };

        Self {
            config: ClusterConfig::default(),
            camera,
            lights,
        }
    }

    /// Parse a scene and validate its configuration, camera and lights.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let scene: Self = serde_json::from_str(json)?;
        scene.config.validate()?;
        scene.camera.validate()?;
        validate_lights(&scene.lights)?;
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
