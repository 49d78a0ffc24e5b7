//! Touch-to-place raycasting against the invisible reference floor.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Handedness, RenderCamera};
use crate::math::{Mat4, Quat, Ray, Vec3};
use crate::projection::NormalizedTouch;

const PARALLEL_EPSILON: f32 = 1e-6;

/// Identifier of a raycast target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaneId(Uuid);

impl PlaneId {
    /// Create a new unique plane ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The invisible plane touches are cast against.
///
/// Created once per session and never mutated or rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePlane {
    id: PlaneId,
    center: Vec3,
    normal: Vec3,
    u_axis: Vec3,
    v_axis: Vec3,
    half_width: f32,
    half_height: f32,
    double_sided: bool,
}

impl ReferencePlane {
    /// A square plane of side `size`, built facing +Z, rotated about X by
    /// `rotation_x` radians and moved to height `height`.
    ///
    /// `rotation_x = π/2` gives a horizontal floor facing down,
    /// `-π/2` one facing up.
    #[must_use]
    pub fn horizontal(height: f32, size: f32, rotation_x: f32, double_sided: bool) -> Self {
        let rotation = Mat4::from_rotation_x(rotation_x);
        Self {
            id: PlaneId::new(),
            center: Vec3::new(0.0, height, 0.0),
            normal: rotation.transform_vector(Vec3::new(0.0, 0.0, 1.0)),
            u_axis: rotation.transform_vector(Vec3::new(1.0, 0.0, 0.0)),
            v_axis: rotation.transform_vector(Vec3::new(0.0, 1.0, 0.0)),
            half_width: size / 2.0,
            half_height: size / 2.0,
            double_sided,
        }
    }

    /// An upright `width` x `height` quad centered at `center`, built facing
    /// +Z and rotated about Y by `yaw` radians. Accepts hits from both faces.
    #[must_use]
    pub fn upright(center: Vec3, width: f32, height: f32, yaw: f32) -> Self {
        let rotation = Quat::from_axis_angle(Vec3::up(), yaw);
        Self {
            id: PlaneId::new(),
            center,
            normal: rotation.rotate(Vec3::new(0.0, 0.0, 1.0)),
            u_axis: rotation.rotate(Vec3::new(1.0, 0.0, 0.0)),
            v_axis: Vec3::up(),
            half_width: width / 2.0,
            half_height: height / 2.0,
            double_sided: true,
        }
    }

    /// Plane identifier.
    #[must_use]
    pub fn id(&self) -> PlaneId {
        self.id
    }

    /// Plane center.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Front-face normal.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Intersect a ray with the finite plane.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let denom = ray.direction.dot(&self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        // Single-sided planes only block rays hitting their front face.
        if !self.double_sided && denom > 0.0 {
            return None;
        }

        let distance = self.center.sub(&ray.origin).dot(&self.normal) / denom;
        if distance < 0.0 {
            return None;
        }

        let point = ray.at(distance);
        let local = point.sub(&self.center);
        if local.dot(&self.u_axis).abs() > self.half_width
            || local.dot(&self.v_axis).abs() > self.half_height
        {
            return None;
        }

        Some(Intersection {
            target: self.id,
            point,
            distance,
        })
    }
}

/// A ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// What was hit.
    pub target: PlaneId,
    /// World-space hit point.
    pub point: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Where to put new content, valid only for the frame it was computed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementPoint {
    /// World-space position on the reference plane.
    pub position: Vec3,
    /// Rotation about Y that faces the camera's horizontal position.
    pub yaw: f32,
}

/// Yaw that turns an object at `object` to face `camera` on the XZ plane.
#[must_use]
pub fn facing_yaw(camera: Vec3, object: Vec3) -> f32 {
    (camera.x - object.x).atan2(camera.z - object.z)
}

/// Casts touch rays against the reference plane only.
#[derive(Debug, Clone)]
pub struct PlacementRaycaster {
    plane: ReferencePlane,
}

impl PlacementRaycaster {
    /// Create a raycaster targeting `plane`.
    #[must_use]
    pub fn new(plane: ReferencePlane) -> Self {
        Self { plane }
    }

    /// The reference plane.
    #[must_use]
    pub fn plane(&self) -> &ReferencePlane {
        &self.plane
    }

    /// World-space ray from the camera through a normalized touch.
    #[must_use]
    pub fn ray_from_camera(camera: &RenderCamera, touch: NormalizedTouch) -> Ray {
        let projection = camera.projection();
        let tan_half = (projection.fov.to_radians() / 2.0).tan();
        let depth = match camera.handedness() {
            Handedness::Right => -1.0,
            Handedness::Left => 1.0,
        };
        let local = Vec3::new(
            touch.x * tan_half * projection.aspect,
            touch.y * tan_half,
            depth,
        );
        let world = camera.world_matrix();
        Ray::new(world.translation(), world.transform_vector(local))
    }

    /// Cast a touch and return a placement point on a hit.
    ///
    /// A miss is a normal outcome and yields `None`.
    #[must_use]
    pub fn on_touch(&self, camera: &RenderCamera, touch: NormalizedTouch) -> Option<PlacementPoint> {
        let ray = Self::ray_from_camera(camera, touch);
        let hit = self.plane.intersect(&ray)?;
        if hit.target != self.plane.id() {
            return None;
        }

        let yaw = facing_yaw(camera.position(), hit.point);
        tracing::debug!(
            "Touch ({:.3}, {:.3}) hit floor at {:?} (distance {:.3})",
            touch.x,
            touch.y,
            hit.point,
            hit.distance
        );
        Some(PlacementPoint {
            position: hit.point,
            yaw,
        })
    }
}

/// A touchable link button placed next to anchored content.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    url: String,
    plane: ReferencePlane,
}

impl Hotspot {
    /// Create a button opening `url` on the given quad.
    #[must_use]
    pub fn new(url: impl Into<String>, plane: ReferencePlane) -> Self {
        Self {
            url: url.into(),
            plane,
        }
    }

    /// Link the button opens.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The button quad.
    #[must_use]
    pub fn plane(&self) -> &ReferencePlane {
        &self.plane
    }
}

/// The hotspot nearest the camera under a touch, if any.
#[must_use]
pub fn pick_hotspot<'a>(
    hotspots: &'a [Hotspot],
    camera: &RenderCamera,
    touch: NormalizedTouch,
) -> Option<&'a Hotspot> {
    let ray = PlacementRaycaster::ray_from_camera(camera, touch);
    hotspots
        .iter()
        .filter_map(|hotspot| {
            hotspot
                .plane
                .intersect(&ray)
                .map(|hit| (hit.distance, hotspot))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, hotspot)| hotspot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraTransform;
    use crate::projection::{CameraParameters, Projection};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn camera_with(matrix: Mat4) -> RenderCamera {
        let p = Projection::new(CameraParameters::new(60.0, 0.75), 0.1, 1000.0);
        let mut cam = RenderCamera::new(p, Handedness::Right);
        cam.set_transform(CameraTransform::Matrix(matrix));
        cam
    }

    fn floor() -> ReferencePlane {
        ReferencePlane::horizontal(-1.0, 100.0, FRAC_PI_2, true)
    }

    #[test]
    fn horizontal_plane_faces_down() {
        let n = floor().normal();
        assert!((n.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn center_touch_looking_down_hits_below_camera() {
        let raycaster = PlacementRaycaster::new(floor());
        let cam = camera_with(Mat4::from_rotation_x(-FRAC_PI_2));

        let point = raycaster
            .on_touch(&cam, NormalizedTouch::center())
            .expect("hit");
        assert!((point.position.y + 1.0).abs() < 1e-5);
        assert!(point.position.x.abs() < 1e-5);
        assert!(point.position.z.abs() < 1e-5);
    }

    #[test]
    fn horizontal_view_misses() {
        let raycaster = PlacementRaycaster::new(floor());
        let cam = camera_with(Mat4::identity());
        assert!(raycaster.on_touch(&cam, NormalizedTouch::center()).is_none());
    }

    #[test]
    fn looking_up_misses() {
        let raycaster = PlacementRaycaster::new(floor());
        let cam = camera_with(Mat4::from_rotation_x(FRAC_PI_2));
        assert!(raycaster.on_touch(&cam, NormalizedTouch::center()).is_none());
    }

    #[test]
    fn hits_beyond_extent_miss() {
        let raycaster = PlacementRaycaster::new(ReferencePlane::horizontal(-1.0, 2.0, FRAC_PI_2, true));
        // Tilted slightly below the horizon: would land ~100m away.
        let cam = camera_with(Mat4::from_rotation_x(-0.01));
        assert!(raycaster.on_touch(&cam, NormalizedTouch::center()).is_none());
    }

    #[test]
    fn single_sided_plane_blocks_back_face() {
        // Facing down: a camera above sees its back face.
        let down = ReferencePlane::horizontal(-1.0, 100.0, FRAC_PI_2, false);
        let up = ReferencePlane::horizontal(-1.0, 100.0, -FRAC_PI_2, false);
        let cam = camera_with(Mat4::from_rotation_x(-FRAC_PI_2));

        assert!(PlacementRaycaster::new(down)
            .on_touch(&cam, NormalizedTouch::center())
            .is_none());
        assert!(PlacementRaycaster::new(up)
            .on_touch(&cam, NormalizedTouch::center())
            .is_some());
    }

    #[test]
    fn off_center_touch_moves_hit_sideways() {
        let raycaster = PlacementRaycaster::new(floor());
        let cam = camera_with(Mat4::from_rotation_x(-FRAC_PI_2));
        let point = raycaster
            .on_touch(&cam, NormalizedTouch::new(0.5, 0.0))
            .expect("hit");
        assert!(point.position.x > 0.0);
    }

    #[test]
    fn yaw_faces_camera() {
        // Camera due +Z of the object: no rotation.
        assert!(facing_yaw(Vec3::new(0.0, 0.0, 5.0), Vec3::zero()).abs() < 1e-6);
        // Camera due +X: quarter turn.
        assert!((facing_yaw(Vec3::new(5.0, 0.0, 0.0), Vec3::zero()) - FRAC_PI_2).abs() < 1e-6);
        // Diagonal.
        assert!((facing_yaw(Vec3::new(1.0, 3.0, 1.0), Vec3::zero()) - FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn placement_yaw_uses_camera_position() {
        let raycaster = PlacementRaycaster::new(floor());
        // Pitched 45° down, one meter above the floor.
        let mut m = Mat4::from_rotation_x(-FRAC_PI_4);
        m.data[12] = 2.0;
        let cam = camera_with(m);
        let point = raycaster
            .on_touch(&cam, NormalizedTouch::center())
            .expect("hit");
        assert!((point.position.x - 2.0).abs() < 1e-5);
        assert!((point.position.z + 1.0).abs() < 1e-4);
        // Camera is due +Z of the hit.
        assert!(point.yaw.abs() < 1e-4);
    }

    fn buttons() -> Vec<Hotspot> {
        vec![
            Hotspot::new(
                "https://example.com/near",
                ReferencePlane::upright(Vec3::new(0.0, 0.0, -2.0), 0.5, 0.25, 0.0),
            ),
            Hotspot::new(
                "https://example.com/far",
                ReferencePlane::upright(Vec3::new(0.0, 0.0, -4.0), 2.0, 2.0, 0.0),
            ),
        ]
    }

    #[test]
    fn touch_picks_nearest_hotspot() {
        let cam = camera_with(Mat4::identity());
        let hotspots = buttons();
        let picked = pick_hotspot(&hotspots, &cam, NormalizedTouch::center()).expect("hit");
        assert_eq!(picked.url(), "https://example.com/near");
    }

    #[test]
    fn touch_beside_small_hotspot_reaches_larger_one() {
        let cam = camera_with(Mat4::identity());
        let hotspots = buttons();
        // Rises ~0.17 per meter: 0.35 at the near button (half height
        // 0.125), 0.69 at the far one (half height 1.0).
        let picked = pick_hotspot(&hotspots, &cam, NormalizedTouch::new(0.0, 0.3)).expect("hit");
        assert_eq!(picked.url(), "https://example.com/far");
    }

    #[test]
    fn hotspot_turned_sideways_is_missed_head_on() {
        let cam = camera_with(Mat4::identity());
        let edge_on = vec![Hotspot::new(
            "https://example.com",
            ReferencePlane::upright(Vec3::new(0.0, 0.0, -2.0), 0.5, 0.25, FRAC_PI_2),
        )];
        assert!(pick_hotspot(&edge_on, &cam, NormalizedTouch::center()).is_none());
    }

    #[test]
    fn empty_hotspots_never_hit() {
        let cam = camera_with(Mat4::identity());
        assert!(pick_hotspot(&[], &cam, NormalizedTouch::center()).is_none());
    }
}
