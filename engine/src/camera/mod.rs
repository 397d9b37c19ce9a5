//! Camera Module
//!
//! Per-frame camera state and the orthonormal basis derived from it.
//! This module is window-system agnostic - it only deals with camera state and math.

pub mod camera_state;

pub use camera_state::{CameraBasis, CameraState};
