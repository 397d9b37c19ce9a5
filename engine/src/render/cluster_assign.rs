//! Cluster Light Assignment
//!
//! Drives one frame of clustered light assignment:
//!
//! 1. Validate the lights and camera (a rejected frame leaves the
//!    previously published data untouched)
//! 2. Reset the cluster texture
//! 3. For every cluster in linear order, cull all lights against its
//!    sub-frustum and encode the resulting list
//! 4. Publish the finished texture to the sink exactly once
//!
//! Each cluster reads only the shared camera-derived frusta and the light
//! slice, and writes only its own texture column.

use super::cluster_buffers::ClusterTexture;
use super::cluster_config::ClusterConfig;
use super::cluster_cull::{ClusterLightList, LightCuller};
use super::cluster_frustum::SubFrustumCache;
use super::cluster_lights::{validate_lights, ClusterLight};
use super::cluster_upload::ClusterSink;
use crate::camera::CameraState;
use crate::error::Result;

/// Statistics gathered during one assignment frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub total_lights: usize,
    pub total_clusters: usize,
    /// Clusters with at least one light
    pub active_clusters: usize,
    /// Sum of all cluster counts
    pub light_assignments: usize,
    pub max_lights_in_cluster: usize,
    /// Clusters whose list filled before every light was tested
    pub overflow_clusters: usize,
    /// Lights skipped across all overflowing clusters; an upper bound on
    /// dropped assignments
    pub unscanned_lights: usize,
}

impl ClusterStats {
    pub fn average_lights_per_active_cluster(&self) -> f32 {
        if self.active_clusters == 0 {
            0.0
        } else {
            self.light_assignments as f32 / self.active_clusters as f32
        }
    }
}

/// Assigns lights to clusters and owns the packed output texture.
pub struct ClusterAssigner {
    config: ClusterConfig,
    frusta: SubFrustumCache,
    culler: LightCuller,
    /// Scratch list reused for every cluster
    list: ClusterLightList,
    texture: ClusterTexture,
    stats: ClusterStats,
    frame: u64,
}

impl ClusterAssigner {
    /// Create an assigner, validating the configuration.
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;

        let texture = ClusterTexture::new(&config);
        log::info!(
            "[Clusters] {}x{}x{} grid, {} lights/cluster, texture {}x{} ({} KB)",
            config.grid.x,
            config.grid.y,
            config.grid.z,
            config.max_lights_per_cluster,
            texture.width(),
            texture.height(),
            texture.size_bytes() / 1024
        );

        Ok(Self {
            frusta: SubFrustumCache::new(config.grid, config.lateral_scaling),
            culler: LightCuller::new(),
            list: ClusterLightList::new(config.max_lights_per_cluster),
            texture,
            stats: ClusterStats::default(),
            frame: 0,
            config,
        })
    }

    /// Run one frame of assignment and publish the result to `sink`.
    ///
    /// On error nothing is published and the texture keeps the previous
    /// frame's contents, except for sink failures, which happen after the
    /// texture was rebuilt.
    pub fn update_clusters(
        &mut self,
        camera: &CameraState,
        lights: &[ClusterLight],
        sink: &mut dyn ClusterSink,
    ) -> Result<&ClusterStats> {
        if let Err(err) = validate_lights(lights) {
            log::warn!("[Clusters] frame rejected: {}", err);
            return Err(err);
        }

        let frusta = match self.frusta.get(camera) {
            Ok(frusta) => frusta,
            Err(err) => {
                log::warn!("[Clusters] frame rejected: {}", err);
                return Err(err);
            }
        };

        self.texture.reset(self.config.reset_mode);

        let mut stats = ClusterStats {
            total_lights: lights.len(),
            total_clusters: frusta.len(),
            ..ClusterStats::default()
        };

        for (cluster, frustum) in frusta.iter().enumerate() {
            let outcome = self.culler.cull_cluster(frustum, lights, &mut self.list);
            self.texture.encode_cluster(cluster, &self.list);

            if outcome.assigned > 0 {
                stats.active_clusters += 1;
            }
            stats.light_assignments += outcome.assigned;
            stats.max_lights_in_cluster = stats.max_lights_in_cluster.max(outcome.assigned);
            if outcome.overflowed() {
                stats.overflow_clusters += 1;
                stats.unscanned_lights += outcome.unscanned;
            }
        }

        self.frame += 1;
        self.stats = stats;

        if stats.overflow_clusters > 0 {
            log::warn!(
                "[Clusters] frame {}: {} clusters hit the {}-light cap ({} lights unscanned)",
                self.frame,
                stats.overflow_clusters,
                self.config.max_lights_per_cluster,
                stats.unscanned_lights
            );
        }
        log::debug!(
            "[Clusters] frame {}: {} lights, {}/{} active clusters, {} assignments, max {}",
            self.frame,
            stats.total_lights,
            stats.active_clusters,
            stats.total_clusters,
            stats.light_assignments,
            stats.max_lights_in_cluster
        );

        sink.publish(&self.texture)?;
        Ok(&self.stats)
    }

    /// Drop cached sub-frusta so the next frame rebuilds them.
    pub fn invalidate(&mut self) {
        self.frusta.invalidate();
    }

    #[inline]
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Texture written by the last successful frame.
    #[inline]
    pub fn texture(&self) -> &ClusterTexture {
        &self.texture
    }

    /// Statistics of the last successful frame.
    #[inline]
    pub fn stats(&self) -> &ClusterStats {
        &self.stats
    }

    /// Number of frames completed.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
