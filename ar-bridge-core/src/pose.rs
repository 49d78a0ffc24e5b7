//! Pose adaptation from the tracking SDK's convention to the engine's.
//!
//! ## Strategies
//!
//! ```text
//!   SDK pose (right-handed, 16 floats)
//!          │
//!          ├── MatrixDirect ─────────► camera.matrix = pose, dirty
//!          │   (right-handed engine, raw matrices, manual updates)
//!          │
//!          └── FlipAndDecompose ─────► negate X and Z basis
//!              (everything else)        └► decompose → position + rotation
//! ```
//!
//! The strategy is picked from [`EngineCapabilities`], never from the
//! tracking mode.

use serde::{Deserialize, Serialize};

use crate::camera::{CameraTransform, Handedness, RenderCamera};
use crate::engine::EngineCapabilities;
use crate::error::{ArError, ArResult};
use crate::math::Mat4;

/// Element order of an incoming pose array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixLayout {
    /// SDK emission order: elements 0-3 hold the X basis, 12-14 the
    /// translation. Same memory order as [`Mat4::data`].
    #[default]
    RowMajor,
    /// Transposed order: translation at elements 3, 7 and 11.
    ColumnMajor,
}

/// Sign mask applied by [`PoseStrategy::FlipAndDecompose`]: X and Z basis
/// vectors negated, Y basis and translation untouched.
#[rustfmt::skip]
const HANDEDNESS_FLIP: [f32; 16] = [
    -1.0, -1.0, -1.0, -1.0,
     1.0,  1.0,  1.0,  1.0,
    -1.0, -1.0, -1.0, -1.0,
     1.0,  1.0,  1.0,  1.0,
];

/// A camera pose for one tracked frame, stored in SDK order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Pose {
    elements: [f32; 16],
}

impl Pose {
    /// Wrap 16 elements in SDK order.
    ///
    /// # Panics
    ///
    /// Panics if any element is not finite. A malformed pose is an
    /// integration bug; use [`Pose::from_slice`] at untrusted boundaries.
    #[must_use]
    pub fn new(elements: [f32; 16]) -> Self {
        assert!(
            elements.iter().all(|v| v.is_finite()),
            "pose elements must be finite"
        );
        Self { elements }
    }

    /// Wrap 16 elements given in `layout`.
    ///
    /// # Panics
    ///
    /// Panics if any element is not finite.
    #[must_use]
    pub fn with_layout(elements: [f32; 16], layout: MatrixLayout) -> Self {
        match layout {
            MatrixLayout::RowMajor => Self::new(elements),
            MatrixLayout::ColumnMajor => {
                Self::new(Mat4::from_cols_array(elements).transpose().data)
            }
        }
    }

    /// Checked constructor for poses arriving from outside the process.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::MalformedPose`] if `values` does not hold exactly 16
    /// finite numbers.
    pub fn from_slice(values: &[f32], layout: MatrixLayout) -> ArResult<Self> {
        let elements: [f32; 16] = values.try_into().map_err(|_| {
            ArError::MalformedPose(format!("expected 16 elements, got {}", values.len()))
        })?;
        if let Some(index) = elements.iter().position(|v| !v.is_finite()) {
            return Err(ArError::MalformedPose(format!(
                "element {index} is not finite"
            )));
        }
        Ok(Self::with_layout(elements, layout))
    }

    /// The pose from a local-to-world matrix.
    ///
    /// # Panics
    ///
    /// Panics if the matrix has non-finite elements.
    #[must_use]
    pub fn from_matrix(matrix: &Mat4) -> Self {
        Self::new(matrix.data)
    }

    /// Elements in SDK order.
    #[must_use]
    pub fn elements(&self) -> &[f32; 16] {
        &self.elements
    }

    /// The pose as a local-to-world matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_cols_array(self.elements)
    }
}

impl TryFrom<Vec<f32>> for Pose {
    type Error = ArError;

    fn try_from(values: Vec<f32>) -> ArResult<Self> {
        Self::from_slice(&values, MatrixLayout::RowMajor)
    }
}

impl From<Pose> for Vec<f32> {
    fn from(pose: Pose) -> Self {
        pose.elements.to_vec()
    }
}

/// How poses are written to the engine camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseStrategy {
    /// Write the SDK matrix as-is and mark the transform dirty.
    MatrixDirect,
    /// Flip handedness, then split into position and rotation.
    FlipAndDecompose,
}

impl PoseStrategy {
    /// Pick the strategy an engine supports.
    #[must_use]
    pub fn for_engine(caps: &EngineCapabilities) -> Self {
        if caps.handedness == Handedness::Right
            && caps.accepts_raw_matrix
            && caps.manual_matrix_update
        {
            Self::MatrixDirect
        } else {
            Self::FlipAndDecompose
        }
    }

    /// Map a pose to a camera transform. Pure and deterministic.
    #[must_use]
    pub fn convert(self, pose: &Pose) -> CameraTransform {
        match self {
            Self::MatrixDirect => CameraTransform::Matrix(pose.to_matrix()),
            Self::FlipAndDecompose => {
                let mut flipped = *pose.elements();
                for (value, sign) in flipped.iter_mut().zip(HANDEDNESS_FLIP) {
                    *value *= sign;
                }
                let (scale, rotation, position) = Mat4::from_cols_array(flipped).decompose();
                CameraTransform::Decomposed {
                    position,
                    rotation,
                    scale,
                }
            }
        }
    }
}

/// Applies incoming poses to the render camera.
#[derive(Debug, Clone)]
pub struct PoseAdapter {
    strategy: PoseStrategy,
    applied: u64,
}

impl PoseAdapter {
    /// Create an adapter with an explicit strategy.
    #[must_use]
    pub fn new(strategy: PoseStrategy) -> Self {
        Self {
            strategy,
            applied: 0,
        }
    }

    /// Create an adapter for an engine's capabilities.
    #[must_use]
    pub fn for_engine(caps: &EngineCapabilities) -> Self {
        Self::new(PoseStrategy::for_engine(caps))
    }

    /// Write `pose` to `camera` and mark it dirty for the next render.
    pub fn apply(&mut self, pose: &Pose, camera: &mut RenderCamera) {
        camera.set_transform(self.strategy.convert(pose));
        self.applied += 1;
        tracing::trace!(
            "Pose #{} applied ({:?}) at {:?}",
            self.applied,
            self.strategy,
            camera.position()
        );
    }

    /// Active strategy.
    #[must_use]
    pub fn strategy(&self) -> PoseStrategy {
        self.strategy
    }

    /// Number of poses applied.
    #[must_use]
    pub fn applied(&self) -> u64 {
        self.applied
    }
}
