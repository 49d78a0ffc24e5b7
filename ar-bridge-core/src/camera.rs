//! The render camera written by the pose adapter and projection updater.

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Quat, Vec3};
use crate::projection::Projection;

/// Coordinate-system handedness of a render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    /// Right-handed, camera looks down -Z (OpenGL, the tracking SDK).
    Right,
    /// Left-handed, camera looks down +Z.
    Left,
}

/// Camera local-to-world transform in the form the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraTransform {
    /// Raw matrix written directly; automatic recomputation is disabled.
    Matrix(Mat4),
    /// Position and rotation set separately on the camera node.
    Decomposed {
        /// World position.
        position: Vec3,
        /// World rotation.
        rotation: Quat,
        /// Residual scale from the decomposition.
        scale: Vec3,
    },
}

impl CameraTransform {
    /// The transform as a local-to-world matrix.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        match self {
            Self::Matrix(m) => *m,
            Self::Decomposed {
                position,
                rotation,
                scale,
            } => Mat4::compose(*position, *rotation, *scale),
        }
    }

    /// World position of the camera.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        match self {
            Self::Matrix(m) => m.translation(),
            Self::Decomposed { position, .. } => *position,
        }
    }
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::Matrix(Mat4::identity())
    }
}

/// Camera state shared between the event handlers and the render step.
///
/// Written only by the pose adapter and the projection updater; the render
/// step reads it and consumes the dirty flag once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCamera {
    transform: CameraTransform,
    projection: Projection,
    handedness: Handedness,
    dirty: bool,
}

impl RenderCamera {
    /// Create a camera at the origin with the given projection.
    #[must_use]
    pub fn new(projection: Projection, handedness: Handedness) -> Self {
        Self {
            transform: CameraTransform::default(),
            projection,
            handedness,
            dirty: true,
        }
    }

    /// Replace the world transform and flag it for the next render.
    pub fn set_transform(&mut self, transform: CameraTransform) {
        self.transform = transform;
        self.dirty = true;
    }

    /// Current world transform.
    #[must_use]
    pub fn transform(&self) -> &CameraTransform {
        &self.transform
    }

    /// Replace the projection.
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    /// Current projection.
    #[must_use]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Engine handedness this camera lives in.
    #[must_use]
    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    /// Local-to-world matrix.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.world_matrix()
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    /// Unit view direction in world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let z = self.world_matrix().basis(2).normalize();
        match self.handedness {
            Handedness::Right => z.scale(-1.0),
            Handedness::Left => z,
        }
    }

    /// Whether the transform changed since the last render.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag. Returns whether it was set.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
