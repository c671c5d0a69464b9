//! Core value types: points, actuation matrices and training samples.

use core::ops::{Add, Div, Mul, Neg, Sub};

use nalgebra::{Matrix3, Vector3};

use crate::region::RegionMask;

/// A 3x3 actuation matrix in row-major order.
pub type Actuation = [[f32; 3]; 3];

/// A 3D point with named fields for clarity.
///
/// Coordinates and targets are always 3-vectors regardless of training mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Point3 {
    /// Create a new Point3.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a Point3 with all components set to the same value.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product with another point (treating both as vectors).
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Promote to a double precision nalgebra vector.
    #[inline]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Demote a double precision nalgebra vector.
    #[inline]
    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x as f32, v.y as f32, v.z as f32)
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        p.as_array()
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f32> for Point3 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Point3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Promote a row-major actuation to a double precision matrix.
pub fn actuation_to_matrix(a: &Actuation) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| a[r][c] as f64)
}

/// Demote a double precision matrix to a row-major actuation.
pub fn matrix_to_actuation(m: &Matrix3<f64>) -> Actuation {
    let mut out = [[0.0f32; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)] as f32;
        }
    }
    out
}

/// One supervised training sample.
///
/// `actuation` is only populated for simulator data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<R: RegionMask> {
    /// Input coordinate.
    pub coordinate: Point3,
    /// Region the sample belongs to.
    pub region: R,
    /// Target position or displacement.
    pub target: Point3,
    /// Optional per-sample actuation matrix.
    pub actuation: Option<Actuation>,
}

impl<R: RegionMask> Sample<R> {
    /// Create a sample without actuation.
    pub fn new(coordinate: Point3, region: R, target: Point3) -> Self {
        Self {
            coordinate,
            region,
            target,
            actuation: None,
        }
    }

    /// Attach an actuation matrix.
    pub fn with_actuation(mut self, actuation: Actuation) -> Self {
        self.actuation = Some(actuation);
        self
    }
}
