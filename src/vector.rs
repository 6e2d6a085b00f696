//! Vector, matrix and sample types
//!
//! Components are signed 32-bit integers. In a [`Sample`] the `xyz` vector is
//! in µm/s² and the `raw` vector is in ADC counts.

use core::ops::{Add, Neg, Sub};

/// Three-axis integer vector
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3 {
    /// X-axis component
    pub x: i32,
    /// Y-axis component
    pub y: i32,
    /// Z-axis component
    pub z: i32,
}

impl Vector3 {
    /// All components zero
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Create a vector from its components
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Components as an `[x, y, z]` array
    #[must_use]
    pub const fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Apply `f` to each component
    #[must_use]
    pub fn map(self, mut f: impl FnMut(i32) -> i32) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }

    /// Combine two vectors component by component
    #[must_use]
    pub fn zip_with(self, other: Self, mut f: impl FnMut(i32, i32) -> i32) -> Self {
        Self::new(f(self.x, other.x), f(self.y, other.y), f(self.z, other.z))
    }

    /// `true` if `predicate` holds for every component
    pub fn all(self, mut predicate: impl FnMut(i32) -> bool) -> bool {
        predicate(self.x) && predicate(self.y) && predicate(self.z)
    }

    /// `true` if `predicate` holds for at least one component
    pub fn any(self, mut predicate: impl FnMut(i32) -> bool) -> bool {
        predicate(self.x) || predicate(self.y) || predicate(self.z)
    }
}

impl From<[i32; 3]> for Vector3 {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vector3> for [i32; 3] {
    fn from(v: Vector3) -> Self {
        v.to_array()
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, i32::saturating_add)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, i32::saturating_sub)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(i32::saturating_neg)
    }
}

/// 3x3 signed permutation matrix, row-major
///
/// Only matrices with exactly one `±1` entry per row and per column can be
/// constructed, so applying one never scales a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Matrix3([i32; 9]);

impl Matrix3 {
    /// Identity matrix
    pub const IDENTITY: Self = Self([1, 0, 0, 0, 1, 0, 0, 0, 1]);

    /// Validate and wrap a row-major matrix
    ///
    /// Returns `None` unless `m` is a signed permutation.
    #[must_use]
    pub const fn new(m: [i32; 9]) -> Option<Self> {
        if Self::is_signed_permutation(&m) {
            Some(Self(m))
        } else {
            None
        }
    }

    /// Check the structural property every mounting matrix must have
    #[must_use]
    pub const fn is_signed_permutation(m: &[i32; 9]) -> bool {
        let mut row_hits = [0u8; 3];
        let mut col_hits = [0u8; 3];
        let mut i = 0;
        while i < 9 {
            match m[i] {
                0 => {}
                1 | -1 => {
                    row_hits[i / 3] += 1;
                    col_hits[i % 3] += 1;
                }
                _ => return false,
            }
            i += 1;
        }
        let mut k = 0;
        while k < 3 {
            if row_hits[k] != 1 || col_hits[k] != 1 {
                return false;
            }
            k += 1;
        }
        true
    }

    /// Row-major entries
    #[must_use]
    pub const fn entries(&self) -> &[i32; 9] {
        &self.0
    }

    /// Multiply `v` by this matrix
    #[must_use]
    pub fn apply(&self, v: Vector3) -> Vector3 {
        let v = v.to_array();
        let row = |r: usize| {
            (0..3).fold(0i32, |acc, c| {
                acc.saturating_add(self.0[r * 3 + c].saturating_mul(v[c]))
            })
        };
        Vector3::new(row(0), row(1), row(2))
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<[i32; 9]> for Matrix3 {
    type Error = crate::Error;

    fn try_from(m: [i32; 9]) -> Result<Self, Self::Error> {
        Self::new(m).ok_or(crate::Error::InvalidArgument)
    }
}

/// One accelerometer sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Oriented, offset-corrected acceleration in µm/s²
    pub xyz: Vector3,
    /// Raw ADC counts as read from the sensor, in the sensor frame
    pub raw: Vector3,
}
