//! Per-Cluster Light Culling
//!
//! Tests every light sphere against one cluster's sub-frustum and collects the
//! indices of the lights that may touch it. Lights are visited in ascending
//! index order, so a list that reaches its cap always holds the lowest indices
//! that passed the test.

use super::cluster_frustum::{SubFrustum, Visibility};
use super::cluster_lights::ClusterLight;

/// Light indices assigned to a single cluster, bounded by a cap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterLightList {
    /// Ascending light indices; never longer than `max_lights`
    indices: Vec<u32>,
    max_lights: u32,
}

impl ClusterLightList {
    /// Create an empty list holding at most `max_lights` indices.
    pub fn new(max_lights: u32) -> Self {
        Self {
            indices: Vec::with_capacity(max_lights as usize),
            max_lights,
        }
    }

    /// Add a light index to the list.
    /// Returns true if added, false if the list is full.
    pub fn add(&mut self, light_index: u32) -> bool {
        if self.is_full() {
            return false;
        }
        debug_assert!(self.indices.last().is_none_or(|&last| last < light_index));
        self.indices.push(light_index);
        true
    }

    /// Clear the list, keeping its allocation.
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.indices.len() >= self.max_lights as usize
    }

    #[inline]
    pub fn max_lights(&self) -> u32 {
        self.max_lights
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }
}

/// Outcome of culling all lights against one cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullOutcome {
    /// Lights recorded in the list
    pub assigned: usize,
    /// Lights never tested because the list filled first
    pub unscanned: usize,
}

impl CullOutcome {
    /// True if the cap cut the scan short.
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.unscanned > 0
    }
}

/// Sphere-versus-sub-frustum light culler.
#[derive(Clone, Copy, Debug, Default)]
pub struct LightCuller;

impl LightCuller {
    pub fn new() -> Self {
        Self
    }

    /// Fill `list` with every light whose sphere is not entirely outside
    /// `frustum`, stopping once the list is full.
    ///
    /// `list` is cleared first.
    pub fn cull_cluster(&self, frustum: &SubFrustum, lights: &[ClusterLight], list: &mut ClusterLightList) -> CullOutcome {
        list.clear();

        for (light_index, light) in lights.iter().enumerate() {
            if list.is_full() {
                return CullOutcome {
                    assigned: list.len(),
                    unscanned: lights.len() - light_index,
                };
            }
            if frustum.classify_sphere(light.center(), light.radius) != Visibility::Outside {
                list.add(light_index as u32);
            }
        }

        CullOutcome {
            assigned: list.len(),
            unscanned: 0,
        }
    }
}
