//! Vector, quaternion and matrix primitives shared by the pose, projection and
//! raycast modules.
//!
//! ## Conventions
//!
//! ```text
//!   Mat4::data (column-major)         Basis layout
//!   ┌────┬────┬────┬────┐
//!   │  0 │  4 │  8 │ 12 │             col 0 → X basis
//!   │  1 │  5 │  9 │ 13 │             col 1 → Y basis
//!   │  2 │  6 │ 10 │ 14 │             col 2 → Z basis
//!   │  3 │  7 │ 11 │ 15 │             col 3 → translation
//!   └────┴────┴────┴────┘
//! ```
//!
//! This is the same memory order the tracking SDK emits its poses in, so an
//! SDK pose array can be copied into `data` without reordering.

use serde::{Deserialize, Serialize};

/// A 3D vector for positions and directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit vector pointing up (Y+).
    #[must_use]
    pub const fn up() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Length (magnitude) of the vector.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize to unit length. The zero vector is returned unchanged.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self.scale(1.0 / len)
        } else {
            *self
        }
    }

    /// Cross product.
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Component-wise subtraction.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Component-wise addition.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Scale by a scalar.
    #[must_use]
    pub fn scale(&self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::zero()
    }
}

/// A rotation quaternion `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W (scalar) component.
    pub w: f32,
}

impl Quat {
    /// Create a quaternion from raw components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians about `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle / 2.0).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Extract a quaternion from a pure rotation matrix (upper 3x3, unscaled).
    #[must_use]
    pub fn from_rotation_matrix(m: &Mat4) -> Self {
        let d = &m.data;
        let (m11, m12, m13) = (d[0], d[4], d[8]);
        let (m21, m22, m23) = (d[1], d[5], d[9]);
        let (m31, m32, m33) = (d[2], d[6], d[10]);
        let trace = m11 + m22 + m33;

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s, 0.25 / s)
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
            Self::new(0.25 * s, (m12 + m21) / s, (m13 + m31) / s, (m32 - m23) / s)
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
            Self::new((m12 + m21) / s, 0.25 * s, (m23 + m32) / s, (m13 - m31) / s)
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
            Self::new((m13 + m31) / s, (m23 + m32) / s, 0.25 * s, (m21 - m12) / s)
        }
    }

    /// Rotate a vector.
    #[must_use]
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(&v).scale(2.0);
        v.add(&t.scale(self.w)).add(&q.cross(&t))
    }

    /// Quaternion length.
    #[must_use]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// A 4x4 matrix for affine transforms and projections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    /// Matrix data in column-major order.
    pub data: [f32; 16],
}

impl Mat4 {
    /// Identity matrix.
    #[must_use]
    pub fn identity() -> Self {
        #[rustfmt::skip]
        let data = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { data }
    }

    /// Wrap column-major data.
    #[must_use]
    pub const fn from_cols_array(data: [f32; 16]) -> Self {
        Self { data }
    }

    /// Right-handed OpenGL perspective projection.
    #[must_use]
    pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y_radians / 2.0).tan();
        let nf = 1.0 / (near - far);

        #[rustfmt::skip]
        let data = [
            f / aspect, 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, (far + near) * nf, -1.0,
            0.0, 0.0, 2.0 * far * near * nf, 0.0,
        ];
        Self { data }
    }

    /// Rotation of `angle` radians about the X axis.
    #[must_use]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();

        #[rustfmt::skip]
        let data = [
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   s,   0.0,
            0.0, -s,  c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { data }
    }

    /// Build a transform from translation, rotation and per-axis scale.
    #[must_use]
    pub fn compose(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let x_axis = rotation.rotate(Vec3::new(1.0, 0.0, 0.0)).scale(scale.x);
        let y_axis = rotation.rotate(Vec3::new(0.0, 1.0, 0.0)).scale(scale.y);
        let z_axis = rotation.rotate(Vec3::new(0.0, 0.0, 1.0)).scale(scale.z);

        #[rustfmt::skip]
        let data = [
            x_axis.x, x_axis.y, x_axis.z, 0.0,
            y_axis.x, y_axis.y, y_axis.z, 0.0,
            z_axis.x, z_axis.y, z_axis.z, 0.0,
            position.x, position.y, position.z, 1.0,
        ];
        Self { data }
    }

    /// Split an affine transform into `(scale, rotation, position)`.
    ///
    /// A reflected basis (negative determinant) is folded into a negative X
    /// scale so the rotation stays proper.
    #[must_use]
    pub fn decompose(&self) -> (Vec3, Quat, Vec3) {
        let mut sx = self.basis(0).length();
        let sy = self.basis(1).length();
        let sz = self.basis(2).length();
        if self.determinant3() < 0.0 {
            sx = -sx;
        }

        let position = self.translation();
        let inv = |s: f32| if s == 0.0 { 0.0 } else { 1.0 / s };
        let (ix, iy, iz) = (inv(sx), inv(sy), inv(sz));

        let d = &self.data;
        #[rustfmt::skip]
        let rotation = Mat4::from_cols_array([
            d[0] * ix, d[1] * ix, d[2] * ix, 0.0,
            d[4] * iy, d[5] * iy, d[6] * iy, 0.0,
            d[8] * iz, d[9] * iz, d[10] * iz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);

        (
            Vec3::new(sx, sy, sz),
            Quat::from_rotation_matrix(&rotation),
            position,
        )
    }

    /// Multiply two matrices (`self * other`).
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        let mut result = [0.0f32; 16];

        for row in 0..4 {
            for col in 0..4 {
                for k in 0..4 {
                    result[col * 4 + row] += self.data[k * 4 + row] * other.data[col * 4 + k];
                }
            }
        }

        Self { data: result }
    }

    /// Transposed copy.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = [0.0f32; 16];
        for row in 0..4 {
            for col in 0..4 {
                data[row * 4 + col] = self.data[col * 4 + row];
            }
        }
        Self { data }
    }

    /// Column `axis` (0 = X, 1 = Y, 2 = Z) of the upper 3x3 block.
    #[must_use]
    pub fn basis(&self, axis: usize) -> Vec3 {
        let i = axis * 4;
        Vec3::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Translation component.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.data[12], self.data[13], self.data[14])
    }

    /// Transform a point (w = 1).
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform_vector(p).add(&self.translation())
    }

    /// Transform a direction (w = 0).
    #[must_use]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.basis(0)
            .scale(v.x)
            .add(&self.basis(1).scale(v.y))
            .add(&self.basis(2).scale(v.z))
    }

    /// Determinant of the upper 3x3 block.
    #[must_use]
    pub fn determinant3(&self) -> f32 {
        self.basis(0).dot(&self.basis(1).cross(&self.basis(2)))
    }

    /// Whether every element is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

/// A half-line used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point in world space.
    pub origin: Vec3,
    /// Unit direction in world space.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin.add(&self.direction.scale(t))
    }
}
