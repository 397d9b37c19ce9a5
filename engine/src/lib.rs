//! Light Clusters Library
//!
//! Clustered light assignment for forward and deferred shading. The camera's
//! view frustum is split into a 3D grid of clusters; every light's bounding
//! sphere is tested against every cluster, and the resulting per-cluster light
//! lists are packed into an RGBA32F texture that shaders read with texel
//! fetches.
//!
//! # Modules
//!
//! - [`render`] - Cluster grid, sub-frustum partitioning, culling, packing and upload
//! - [`camera`] - Per-frame camera state
//! - [`scene`] - JSON scene files for offline runs
//! - [`error`] - Error type shared by the pipeline
//!
//! # Example
//!
//! ```no_run
//! use light_clusters::camera::CameraState;
//! use light_clusters::render::{ClusterAssigner, ClusterConfig, ClusterLight, RecordingSink};
//!
//! let mut assigner = ClusterAssigner::new(ClusterConfig::default())?;
//! let mut sink = RecordingSink::new();
//!
//! let lights = [ClusterLight::new([0.0, 1.0, -10.0], 4.0)];
//! let stats = assigner.update_clusters(&CameraState::default(), &lights, &mut sink)?;
//! println!("{} active clusters", stats.active_clusters);
//! # Ok::<(), light_clusters::ClusterError>(())
//! ```

pub mod camera;
pub mod error;
pub mod render;
pub mod scene;

// Re-export the render module contents at crate level for convenience
pub use render::*;
pub use camera::{CameraBasis, CameraState};
pub use error::{ClusterError, Result};
pub use scene::ClusterScene;
