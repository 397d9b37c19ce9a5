//! Error type shared by the clustering pipeline.

use thiserror::Error;

/// Errors raised while configuring or running a clustering frame.
///
/// Configuration errors are fatal at construction. Camera errors reject a
/// single frame: the previously published buffer stays valid and nothing is
/// published for the rejected frame.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("invalid cluster grid {x}x{y}x{z}: every dimension must be positive")]
    InvalidGrid { x: u32, y: u32, z: u32 },

    #[error("max lights per cluster must be positive")]
    InvalidMaxLights,

    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    #[error("invalid light {index}: {reason}")]
    InvalidLight { index: usize, reason: String },

    #[error("{count} lights exceed the {max} indices a float texel can hold exactly")]
    TooManyLights { count: usize, max: usize },

    #[error("cluster upload failed: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
