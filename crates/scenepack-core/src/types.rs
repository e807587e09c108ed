//! Common math types used across scenepack
//!
//! Matrices are column-major (`m[column][row]`), matching the host's
//! world-matrix layout. Quaternions follow the host's `w, x, y, z` order.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 3D vector (position, normal, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Self = Self { x: 0.0, y: 0.0, z: 1.0 };
    pub const X: Self = Self { x: 1.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Unit vector, or zero when the input has no length
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Any unit vector perpendicular to `self`
    pub fn any_orthogonal(&self) -> Self {
        let axis = if self.x.abs() < 0.9 { Self::X } else { Self::new(0.0, 1.0, 0.0) };
        self.cross(&axis).normalize()
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(value: [f32; 3]) -> Self {
        Self::from_array(value)
    }
}

/// 2D vector (UV coordinates, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Z component of the 3D cross product
    pub fn cross(&self, other: &Self) -> f32 {
        self.x * other.y - self.y * other.x
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from(value: [f32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians around a (unit) axis
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// `[w, x, y, z]`, the order the host's decomposition produces
    pub fn to_array(self) -> [f32; 4] {
        [self.w, self.x, self.y, self.z]
    }

    pub fn normalize(&self) -> Self {
        let len = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if len > 0.0 {
            Self::new(self.w / len, self.x / len, self.y / len, self.z / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Columns of the equivalent rotation matrix
    pub fn to_mat3(&self) -> [[f32; 3]; 3] {
        let Quat { w, x, y, z } = self.normalize();
        [
            [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y + w * z), 2.0 * (x * z - w * y)],
            [2.0 * (x * y - w * z), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z + w * x)],
            [2.0 * (x * z + w * y), 2.0 * (y * z - w * x), 1.0 - 2.0 * (x * x + y * y)],
        ]
    }

    /// Quaternion from an orthonormal rotation matrix (columns)
    pub fn from_mat3(m: &[[f32; 3]; 3]) -> Self {
        let trace = 0.25 * (1.0 + m[0][0] + m[1][1] + m[2][2]);

        let q = if trace > 1e-4 {
            let s = trace.sqrt();
            let inv = 1.0 / (4.0 * s);
            Self::new(
                s,
                (m[1][2] - m[2][1]) * inv,
                (m[2][0] - m[0][2]) * inv,
                (m[0][1] - m[1][0]) * inv,
            )
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = 2.0 * (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt();
            let inv = 1.0 / s;
            Self::new(
                (m[1][2] - m[2][1]) * inv,
                0.25 * s,
                (m[1][0] + m[0][1]) * inv,
                (m[2][0] + m[0][2]) * inv,
            )
        } else if m[1][1] > m[2][2] {
            let s = 2.0 * (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt();
            let inv = 1.0 / s;
            Self::new(
                (m[2][0] - m[0][2]) * inv,
                (m[1][0] + m[0][1]) * inv,
                0.25 * s,
                (m[2][1] + m[1][2]) * inv,
            )
        } else {
            let s = 2.0 * (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt();
            let inv = 1.0 / s;
            Self::new(
                (m[0][1] - m[1][0]) * inv,
                (m[2][0] + m[0][2]) * inv,
                (m[2][1] + m[1][2]) * inv,
                0.25 * s,
            )
        };

        // q and -q are the same rotation; keep w positive so output is stable
        let q = if q.w < 0.0 { Self::new(-q.w, -q.x, -q.y, -q.z) } else { q };
        q.normalize()
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 4x4 transformation matrix, column-major
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mat4x4 {
    pub m: [[f32; 4]; 4],
}

impl Mat4x4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Create a new matrix from a flat column-major array
    pub fn from_flat(data: &[f32; 16]) -> Self {
        Self {
            m: [
                [data[0], data[1], data[2], data[3]],
                [data[4], data[5], data[6], data[7]],
                [data[8], data[9], data[10], data[11]],
                [data[12], data[13], data[14], data[15]],
            ],
        }
    }

    /// Compose translation, rotation and (possibly non-uniform) scale
    pub fn from_trs(location: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let r = rotation.to_mat3();
        let s = scale.to_array();
        let mut m = Self::IDENTITY.m;
        for col in 0..3 {
            for row in 0..3 {
                m[col][row] = r[col][row] * s[col];
            }
        }
        m[3] = [location.x, location.y, location.z, 1.0];
        Self { m }
    }

    /// Get translation component
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.m[3][0], self.m[3][1], self.m[3][2])
    }

    fn column3(&self, col: usize) -> Vec3 {
        Vec3::new(self.m[col][0], self.m[col][1], self.m[col][2])
    }

    /// Determinant of the upper-left 3x3 block
    pub fn determinant3(&self) -> f32 {
        self.column3(0).dot(&self.column3(1).cross(&self.column3(2)))
    }

    /// Matrix product `self * rhs`
    pub fn mul(&self, rhs: &Mat4x4) -> Mat4x4 {
        let mut out = [[0.0f32; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, value) in out_col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.m[k][row] * rhs.m[col][k]).sum();
            }
        }
        Mat4x4 { m: out }
    }

    /// Split into location, rotation and scale.
    ///
    /// Scale is the length of each basis column, negated as a whole when the
    /// basis is mirrored. Shear is not represented; non-uniform scale is kept
    /// as-is.
    pub fn decompose(&self) -> Transform {
        let columns = [self.column3(0), self.column3(1), self.column3(2)];
        let mut scale = Vec3::new(columns[0].length(), columns[1].length(), columns[2].length());
        if self.determinant3() < 0.0 {
            scale = -scale;
        }

        let sizes = scale.to_array();
        let mut rot = [[0.0f32; 3]; 3];
        for (col, basis) in columns.iter().enumerate() {
            let unit = if sizes[col] != 0.0 { *basis * (1.0 / sizes[col]) } else { Vec3::ZERO };
            rot[col] = unit.to_array();
        }

        Transform {
            location: self.translation(),
            rotation: Quat::from_mat3(&rot),
            scale,
        }
    }
}

impl Default for Mat4x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A decomposed object transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        location: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn to_matrix(&self) -> Mat4x4 {
        Mat4x4::from_trs(self.location, self.rotation, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_vec3_operations() {
        let v1 = Vec3::new(1.0, 2.0, 3.0);
        let v2 = Vec3::new(4.0, 5.0, 6.0);

        assert!((v1.dot(&v2) - 32.0).abs() < 0.001);

        let cross = v1.cross(&v2);
        assert!((cross.x - (-3.0)).abs() < 0.001);
        assert!((cross.y - 6.0).abs() < 0.001);
        assert!((cross.z - (-3.0)).abs() < 0.001);
    }

    #[test]
    fn test_decompose_identity() {
        let t = Mat4x4::IDENTITY.decompose();
        assert_eq!(t.location, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_decompose_z_rotation() {
        let q = Quat::from_axis_angle(Vec3::UP, std::f32::consts::FRAC_PI_2);
        let t = Mat4x4::from_trs(Vec3::new(1.0, 2.0, 3.0), q, Vec3::ONE).decompose();

        assert!(approx(t.rotation.w, std::f32::consts::FRAC_1_SQRT_2));
        assert!(approx(t.rotation.z, std::f32::consts::FRAC_1_SQRT_2));
        assert!(approx(t.rotation.x, 0.0) && approx(t.rotation.y, 0.0));
        assert_eq!(t.location, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_decompose_keeps_non_uniform_scale() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7);
        let scale = Vec3::new(2.0, 0.5, 3.0);
        let t = Mat4x4::from_trs(Vec3::ZERO, q, scale).decompose();

        assert!(approx(t.scale.x, 2.0));
        assert!(approx(t.scale.y, 0.5));
        assert!(approx(t.scale.z, 3.0));
        for (a, b) in t.rotation.to_array().iter().zip(q.to_array()) {
            assert!(approx(*a, b));
        }
    }

    #[test]
    fn test_decompose_mirrored_negates_scale() {
        let m = Mat4x4::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::new(-1.0, 1.0, 1.0));
        let t = m.decompose();
        assert!(t.scale.x < 0.0 && t.scale.y < 0.0 && t.scale.z < 0.0);

        // Recomposing must give back the original basis
        let back = t.to_matrix();
        for col in 0..3 {
            for row in 0..3 {
                assert!(approx(back.m[col][row], m.m[col][row]));
            }
        }
    }

    #[test]
    fn test_matrix_product_applies_parent() {
        let parent = Mat4x4::from_trs(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY, Vec3::new(2.0, 2.0, 2.0));
        let child = Mat4x4::from_trs(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        let world = parent.mul(&child);

        assert_eq!(world.translation(), Vec3::new(12.0, 0.0, 0.0));
        assert!(approx(world.decompose().scale.x, 2.0));
    }
}
