//! Cluster Sub-Frustum Partitioning
//!
//! Splits the camera's view frustum into `X × Y × Z` sub-frusta, one per
//! cluster, each described by six inward-facing planes.
//!
//! ## Construction
//!
//! The camera's near-plane rectangle (half extents `w = aspect * h`,
//! `h = tan(fov / 2) * near`) is divided into `X × Y` equal cells and the depth
//! range `[near, far]` into `Z` equal slices. Every cluster's lateral planes
//! pass through the camera position and one edge of its cell rectangle, so
//! each sub-frustum is a perspective wedge cut by its slice's near and far
//! planes.
//!
//! ## Sign Convention
//!
//! `+x` is screen right and `+y` is screen up, so column `x = 0` is the left
//! edge of the view and row `y = 0` the bottom edge. A cell spans
//! `[-w + x * x_step, -w + (x + 1) * x_step]` horizontally and
//! `[-h + y * y_step, -h + (y + 1) * y_step]` vertically; `bottom < top`
//! always holds, which keeps all four lateral normals facing into the cell.
//!
//! ## Lateral Scaling
//!
//! With [`LateralScaling::NearPlane`] the cell rectangle is placed at each
//! slice's own near distance, so deeper slices keep the near-plane extent and
//! cover a narrower cone than the camera. [`LateralScaling::PerspectiveCorrect`]
//! places it at the camera's near distance instead.

use glam::{Vec3, Vec4};

use super::cluster_config::{ClusterGrid, LateralScaling};
use crate::camera::{CameraBasis, CameraState};
use crate::error::Result;

/// Result of classifying a bounding sphere against a sub-frustum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Entirely behind at least one plane
    Outside,
    /// Straddles at least one plane
    Intersecting,
    /// In front of every plane by at least the radius
    Inside,
}

/// Cell rectangle on the near plane, in camera-space units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearRect {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

/// Six inward-facing planes bounding one cluster.
///
/// Each plane is stored as `(normal, d)` with a unit normal; a point `p` is on
/// the inner side when `normal · p + d >= 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubFrustum {
    pub planes: [Vec4; 6],
}

impl SubFrustum {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
    pub const BOTTOM: usize = 2;
    pub const TOP: usize = 3;
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    /// Build the planes of a wedge whose apex is `position`.
    ///
    /// The lateral planes pass through the apex and the edges of `rect` placed
    /// at `rect_distance` along the view direction. `near_z` and `far_z` bound
    /// the wedge along the view direction.
    pub fn from_rect(
        position: Vec3,
        basis: &CameraBasis,
        rect: NearRect,
        rect_distance: f32,
        near_z: f32,
        far_z: f32,
    ) -> Self {
        let CameraBasis { forward, up, right } = *basis;
        let rect_center = forward * rect_distance;

        let left_edge = (right * rect.left + rect_center).normalize();
        let left = left_edge.cross(up).normalize();

        let right_edge = (right * rect.right + rect_center).normalize();
        let right_normal = up.cross(right_edge).normalize();

        let bottom_edge = (up * rect.bottom + rect_center).normalize();
        let bottom = right.cross(bottom_edge).normalize();

        let top_edge = (up * rect.top + rect_center).normalize();
        let top = top_edge.cross(right).normalize();

        let near_point = position + forward * near_z;
        let far_point = position + forward * far_z;

        Self {
            planes: [
                plane_through(left, position),
                plane_through(right_normal, position),
                plane_through(bottom, position),
                plane_through(top, position),
                plane_through(forward, near_point),
                plane_through(-forward, far_point),
            ],
        }
    }

    /// Signed distance from `point` to the plane at `index`.
    #[inline]
    pub fn signed_distance(&self, index: usize, point: Vec3) -> f32 {
        self.planes[index].dot(point.extend(1.0))
    }

    /// Classify a sphere against all six planes.
    ///
    /// A sphere is outside as soon as its center lies more than `radius`
    /// behind any plane. The test is conservative: spheres near a corner of the
    /// wedge may be reported as intersecting without touching it.
    pub fn classify_sphere(&self, center: Vec3, radius: f32) -> Visibility {
        let mut visibility = Visibility::Inside;
        for plane in &self.planes {
            let dist = plane.dot(center.extend(1.0));
            if dist < -radius {
                return Visibility::Outside;
            }
            if dist < radius {
                visibility = Visibility::Intersecting;
            }
        }
        visibility
    }

    /// True unless the sphere is entirely outside.
    #[inline]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.classify_sphere(center, radius) != Visibility::Outside
    }

    /// Check if a point is inside (or on the boundary of) the sub-frustum.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.dot(point.extend(1.0)) >= 0.0)
    }
}

#[inline]
fn plane_through(normal: Vec3, point: Vec3) -> Vec4 {
    normal.extend(-normal.dot(point))
}

/// Derives the sub-frustum of every cluster from one frame's camera.
#[derive(Clone, Debug)]
pub struct FrustumPartitioner {
    grid: ClusterGrid,
    lateral_scaling: LateralScaling,
    position: Vec3,
    basis: CameraBasis,
    near: f32,
    far: f32,
    half_width: f32,
    half_height: f32,
    x_step: f32,
    y_step: f32,
}

impl FrustumPartitioner {
    /// Validate the camera and precompute the near-plane subdivision.
    pub fn new(camera: &CameraState, grid: ClusterGrid, lateral_scaling: LateralScaling) -> Result<Self> {
        grid.validate()?;
        camera.validate()?;

        let (half_width, half_height) = camera.near_half_extents();

        Ok(Self {
            grid,
            lateral_scaling,
            position: camera.position,
            basis: camera.basis(),
            near: camera.near,
            far: camera.far,
            half_width,
            half_height,
            x_step: 2.0 * half_width / grid.x as f32,
            y_step: 2.0 * half_height / grid.y as f32,
        })
    }

    #[inline]
    pub fn grid(&self) -> ClusterGrid {
        self.grid
    }

    /// Near-plane rectangle of the cell in column `x`, row `y`.
    pub fn cell_rect(&self, x: u32, y: u32) -> NearRect {
        debug_assert!(x < self.grid.x && y < self.grid.y);
        NearRect {
            left: -self.half_width + x as f32 * self.x_step,
            right: -self.half_width + (x + 1) as f32 * self.x_step,
            bottom: -self.half_height + y as f32 * self.y_step,
            top: -self.half_height + (y + 1) as f32 * self.y_step,
        }
    }

    /// Near and far distance of depth slice `z`.
    #[inline]
    pub fn depth_range(&self, z: u32) -> (f32, f32) {
        debug_assert!(z < self.grid.z);
        self.grid.depth_slice_bounds(z, self.near, self.far)
    }

    /// Sub-frustum of the cluster at `(x, y, z)`.
    pub fn sub_frustum(&self, x: u32, y: u32, z: u32) -> SubFrustum {
        let rect = self.cell_rect(x, y);
        let (near_z, far_z) = self.depth_range(z);
        let rect_distance = match self.lateral_scaling {
            LateralScaling::NearPlane => near_z,
            LateralScaling::PerspectiveCorrect => self.near,
        };
        SubFrustum::from_rect(self.position, &self.basis, rect, rect_distance, near_z, far_z)
    }

    /// Sub-frustum of the cluster with linear index `index`.
    #[inline]
    pub fn sub_frustum_at(&self, index: usize) -> SubFrustum {
        let (x, y, z) = self.grid.cluster_coords(index);
        self.sub_frustum(x, y, z)
    }
}

/// Caches every cluster's sub-frustum, rebuilding only when the camera moves.
#[derive(Clone, Debug)]
pub struct SubFrustumCache {
    grid: ClusterGrid,
    lateral_scaling: LateralScaling,
    /// Camera the cached frusta were built from
    last_camera: Option<CameraState>,
    frusta: Vec<SubFrustum>,
}

impl SubFrustumCache {
    pub fn new(grid: ClusterGrid, lateral_scaling: LateralScaling) -> Self {
        Self {
            grid,
            lateral_scaling,
            last_camera: None,
            frusta: Vec::with_capacity(grid.cluster_count()),
        }
    }

    /// Returns true if the camera has changed since the last build.
    pub fn needs_update(&self, camera: &CameraState) -> bool {
        self.last_camera.as_ref() != Some(camera)
    }

    /// Get all sub-frusta in linear cluster order, rebuilding if necessary.
    ///
    /// An invalid camera leaves the previous contents untouched.
    pub fn get(&mut self, camera: &CameraState) -> Result<&[SubFrustum]> {
        if self.needs_update(camera) {
            let partitioner = FrustumPartitioner::new(camera, self.grid, self.lateral_scaling)?;
            self.frusta.clear();
            self.frusta
                .extend((0..self.grid.cluster_count()).map(|index| partitioner.sub_frustum_at(index)));
            self.last_camera = Some(*camera);
            log::trace!("[Clusters] rebuilt {} sub-frusta", self.frusta.len());
        }
        Ok(&self.frusta)
    }

    /// Force a rebuild on next access.
    pub fn invalidate(&mut self) {
        self.last_camera = None;
    }

    pub fn has_cached_frusta(&self) -> bool {
        self.last_camera.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// fov 90, aspect 1, near 1, far 10, at origin looking down -Z
    fn test_camera() -> CameraState {
        CameraState {
            fov_y_degrees: 90.0,
            aspect_ratio: 1.0,
            near: 1.0,
            far: 10.0,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    fn partitioner(x: u32, y: u32, z: u32, lateral: LateralScaling) -> FrustumPartitioner {
        FrustumPartitioner::new(&test_camera(), ClusterGrid::new(x, y, z).unwrap(), lateral).unwrap()
    }

    #[test]
    fn test_plane_normals_are_unit() {
        let p = partitioner(4, 3, 5, LateralScaling::NearPlane);
        for index in 0..p.grid().cluster_count() {
            for plane in p.sub_frustum_at(index).planes {
                assert!((plane.truncate().length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_cell_rect_covers_near_plane() {
        let p = partitioner(2, 4, 1, LateralScaling::NearPlane);
        let first = p.cell_rect(0, 0);
        let last = p.cell_rect(1, 3);
        assert!((first.left + 1.0).abs() < 1e-5);
        assert!((first.bottom + 1.0).abs() < 1e-5);
        assert!((last.right - 1.0).abs() < 1e-5);
        assert!((last.top - 1.0).abs() < 1e-5);
        for y in 0..4 {
            let rect = p.cell_rect(0, y);
            assert!(rect.bottom < rect.top);
            assert!((rect.top - rect.bottom - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_depth_range() {
        let p = partitioner(1, 1, 3, LateralScaling::NearPlane);
        assert_eq!(p.depth_range(0), (1.0, 4.0));
        assert_eq!(p.depth_range(2), (7.0, 10.0));
    }

    #[test]
    fn test_left_and_right_halves() {
        let p = partitioner(2, 1, 1, LateralScaling::NearPlane);
        let left = p.sub_frustum(0, 0, 0);
        let right = p.sub_frustum(1, 0, 0);

        let left_point = Vec3::new(-1.0, 0.0, -5.0);
        let right_point = Vec3::new(1.0, 0.0, -5.0);

        assert!(left.contains_point(left_point));
        assert!(!left.contains_point(right_point));
        assert!(right.contains_point(right_point));
        assert!(!right.contains_point(left_point));

        assert_eq!(left.classify_sphere(left_point, 0.1), Visibility::Inside);
        assert_eq!(right.classify_sphere(left_point, 0.1), Visibility::Outside);
    }

    #[test]
    fn test_bottom_row_is_below_center() {
        let p = partitioner(1, 2, 1, LateralScaling::NearPlane);
        let bottom = p.sub_frustum(0, 0, 0);
        let top = p.sub_frustum(0, 1, 0);

        assert!(bottom.contains_point(Vec3::new(0.0, -2.0, -5.0)));
        assert!(!bottom.contains_point(Vec3::new(0.0, 2.0, -5.0)));
        assert!(top.contains_point(Vec3::new(0.0, 2.0, -5.0)));
    }

    #[test]
    fn test_near_and_far_planes() {
        let p = partitioner(1, 1, 2, LateralScaling::PerspectiveCorrect);
        let first = p.sub_frustum(0, 0, 0);
        let second = p.sub_frustum(0, 0, 1);

        // near 1, far 10, two slices split at 5.5
        assert!(first.contains_point(Vec3::new(0.0, 0.0, -3.0)));
        assert!(!first.contains_point(Vec3::new(0.0, 0.0, -7.0)));
        assert!(second.contains_point(Vec3::new(0.0, 0.0, -7.0)));
        assert!(!second.contains_point(Vec3::new(0.0, 0.0, -0.5)));
        assert!(!second.contains_point(Vec3::new(0.0, 0.0, -11.0)));

        assert!((first.signed_distance(SubFrustum::NEAR, Vec3::new(0.0, 0.0, -3.0)) - 2.0).abs() < 1e-5);
        assert!((first.signed_distance(SubFrustum::FAR, Vec3::new(0.0, 0.0, -3.0)) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_straddling_plane_intersects() {
        let p = partitioner(2, 1, 1, LateralScaling::NearPlane);
        let left = p.sub_frustum(0, 0, 0);
        // Center just right of the split at x = 0, radius reaches across
        let center = Vec3::new(0.2, 0.0, -5.0);
        assert_eq!(left.classify_sphere(center, 0.5), Visibility::Intersecting);
        assert_eq!(left.classify_sphere(center, 0.1), Visibility::Outside);
    }

    #[test]
    fn test_near_plane_scaling_narrows_deep_slices() {
        // Point at depth 8 with x / depth = 0.5 is inside the camera frustum
        let point = Vec3::new(4.0, 0.0, -8.0);

        let fixed = partitioner(2, 1, 2, LateralScaling::NearPlane);
        let correct = partitioner(2, 1, 2, LateralScaling::PerspectiveCorrect);

        // Slice 1 starts at 5.5; the fixed rectangle limits x / depth to 1 / 5.5
        assert!(!fixed.sub_frustum(1, 0, 1).contains_point(point));
        assert!(correct.sub_frustum(1, 0, 1).contains_point(point));
    }

    #[test]
    fn test_slices_agree_on_first_slice() {
        let fixed = partitioner(3, 3, 4, LateralScaling::NearPlane);
        let correct = partitioner(3, 3, 4, LateralScaling::PerspectiveCorrect);
        for y in 0..3 {
            for x in 0..3 {
                let a = fixed.sub_frustum(x, y, 0);
                let b = correct.sub_frustum(x, y, 0);
                for (pa, pb) in a.planes.iter().zip(b.planes.iter()) {
                    assert!((*pa - *pb).length() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_rotated_camera() {
        // Camera at (10, 0, 0) looking toward the origin
        let camera = CameraState::looking_at(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::Y,
            90.0,
            1.0,
            1.0,
            10.0,
        );
        let p = FrustumPartitioner::new(&camera, ClusterGrid::new(2, 1, 1).unwrap(), LateralScaling::NearPlane)
            .unwrap();
        // Looking toward -X, screen right is -Z
        let right = p.sub_frustum(1, 0, 0);
        let left = p.sub_frustum(0, 0, 0);
        assert!(right.contains_point(Vec3::new(5.0, 0.0, -1.0)));
        assert!(left.contains_point(Vec3::new(5.0, 0.0, 1.0)));
    }

    #[test]
    fn test_invalid_camera_rejected() {
        let camera = CameraState {
            near: 5.0,
            far: 1.0,
            ..test_camera()
        };
        assert!(FrustumPartitioner::new(&camera, ClusterGrid::default(), LateralScaling::NearPlane).is_err());
    }

    #[test]
    fn test_cache_rebuilds_on_camera_change() {
        let grid = ClusterGrid::new(2, 2, 2).unwrap();
        let mut cache = SubFrustumCache::new(grid, LateralScaling::NearPlane);
        let camera = test_camera();

        assert!(cache.needs_update(&camera));
        assert_eq!(cache.get(&camera).unwrap().len(), 8);
        assert!(cache.has_cached_frusta());
        assert!(!cache.needs_update(&camera));

        let mut moved = camera;
        moved.position.x = 3.0;
        assert!(cache.needs_update(&moved));
        let frusta = cache.get(&moved).unwrap();
        assert!(frusta[0].contains_point(Vec3::new(2.5, -1.0, -5.0)));

        cache.invalidate();
        assert!(cache.needs_update(&moved));
    }

    #[test]
    fn test_cache_keeps_previous_frusta_on_invalid_camera() {
        let grid = ClusterGrid::new(1, 1, 1).unwrap();
        let mut cache = SubFrustumCache::new(grid, LateralScaling::NearPlane);
        let camera = test_camera();
        let before = cache.get(&camera).unwrap()[0];

        let broken = CameraState {
            fov_y_degrees: 0.0,
            ..camera
        };
        assert!(cache.get(&broken).is_err());
        assert!(!cache.needs_update(&camera));
        assert_eq!(cache.get(&camera).unwrap()[0], before);
    }
}
