//! Render Module
//!
//! CPU-side clustered light assignment and the GPU texture it feeds.

pub mod cluster_assign;
pub mod cluster_buffers;
pub mod cluster_config;
pub mod cluster_cull;
pub mod cluster_frustum;
pub mod cluster_lights;
pub mod cluster_upload;

// Re-export commonly used types for convenience
pub use cluster_assign::{ClusterAssigner, ClusterStats};
pub use cluster_buffers::{ClusterTexture, TEXEL_BYTES};
pub use cluster_config::{
    ClusterConfig, ClusterGrid, LateralScaling, ResetMode, MAX_EXACT_LIGHT_COUNT,
    MAX_LIGHTS_PER_CLUSTER, TEXEL_COMPONENTS,
};
pub use cluster_cull::{ClusterLightList, CullOutcome, LightCuller};
pub use cluster_frustum::{FrustumPartitioner, NearRect, SubFrustum, SubFrustumCache, Visibility};
pub use cluster_lights::{check_light_count, validate_lights, ClusterLight};
pub use cluster_upload::{ClusterSink, GpuClusterTexture, RecordingSink};
