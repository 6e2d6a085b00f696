//! Mounting positions
//!
//! The sensor can be soldered in eight orientations relative to the device
//! frame: face up or face down, rotated in steps of 90° about Z. Each one maps
//! onto a fixed signed permutation [`Matrix3`].

use crate::vector::{Matrix3, Vector3};

/// Rows of the eight mounting matrices, indexed by position id
const MATRICES: [[i32; 9]; 8] = [
    [0, 1, 0, -1, 0, 0, 0, 0, 1],
    [-1, 0, 0, 0, -1, 0, 0, 0, 1],
    [0, -1, 0, 1, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 1, 0, 0, 0, 1],
    [0, -1, 0, -1, 0, 0, 0, 0, -1],
    [1, 0, 0, 0, -1, 0, 0, 0, -1],
    [0, 1, 0, 1, 0, 0, 0, 0, -1],
    [-1, 0, 0, 0, 1, 0, 0, 0, -1],
];

/// Sensor mounting position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Position {
    /// Face up, rotated 90°
    Top90 = 0,
    /// Face up, rotated 180°
    Top180 = 1,
    /// Face up, rotated 270°
    Top270 = 2,
    /// Face up, axes aligned with the device (identity)
    Top0 = 3,
    /// Face down, rotated 90°
    Bottom90 = 4,
    /// Face down, axes aligned with the device in X
    Bottom0 = 5,
    /// Face down, rotated 270°
    Bottom270 = 6,
    /// Face down, rotated 180°
    Bottom180 = 7,
}

impl Position {
    /// Position programmed by `init()`: the identity mapping
    pub const DEFAULT: Self = Self::Top0;

    /// Every position, ordered by id
    pub const ALL: [Self; 8] = [
        Self::Top90,
        Self::Top180,
        Self::Top270,
        Self::Top0,
        Self::Bottom90,
        Self::Bottom0,
        Self::Bottom270,
        Self::Bottom180,
    ];

    /// Numeric id of this position
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look a position up by id
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        if (id as usize) < Self::ALL.len() {
            Some(Self::ALL[id as usize])
        } else {
            None
        }
    }

    /// Orientation matrix of this position
    #[must_use]
    pub const fn matrix(self) -> Matrix3 {
        match Matrix3::new(MATRICES[self as usize]) {
            Some(m) => m,
            None => Matrix3::IDENTITY,
        }
    }

    /// Rotate a sensor-frame vector into the device frame
    #[must_use]
    pub fn apply(self, v: Vector3) -> Vector3 {
        self.matrix().apply(v)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Position {
    type Error = crate::Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(crate::Error::InvalidArgument)
    }
}
