#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod calibration;
pub mod device;
pub mod interface;
pub mod lock;
pub mod position;
pub mod power;
pub mod registers;
pub mod report;
pub mod vector;

// Re-export main types
pub use calibration::{Calibration, CalibrationThreshold};
pub use device::{Bma250Driver, Filter};
pub use interface::{I2cInterface, Transport};
pub use lock::{AtomicLock, LockError, NoLock, RawLock};
pub use position::Position;
pub use power::{Bandwidth, PowerMode};
pub use report::Report;
pub use vector::{Matrix3, Sample, Vector3};

use core::convert::Infallible;

/// BMA250 I2C address when the SDO pin is low (default: 0x18)
///
/// Use [`Bma250Driver::new()`] for this configuration.
pub const I2C_ADDRESS_SDO_LOW: u8 = 0x18;

/// BMA250 I2C address when the SDO pin is high (alternative: 0x19)
///
/// Use [`Bma250Driver::with_address()`] for this configuration.
pub const I2C_ADDRESS_SDO_HIGH: u8 = 0x19;

/// Expected value of the `CHIP_ID` register
pub const CHIP_ID: u8 = 0x03;

/// Legacy integer form of an unknown hard offset component.
///
/// On the BMA250 this is also a valid offset register value, so the driver
/// never uses it: an unknown hard offset is reported as
/// [`Error::HardOffsetNotWritten`].
pub const HARD_OFFSET_UNKNOWN: i32 = 0x7f;

/// Legacy integer form of an unknown calibration offset component.
pub const CALIB_OFFSET_UNKNOWN: i32 = 0x7fff_ffff;

/// Driver errors
///
/// `E` is the transport error type. Operations that never touch the bus (the
/// calibration engine) use the default `Infallible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E = Infallible> {
    /// Configuration value out of range
    InvalidArgument,
    /// Operation issued before a successful `init()`
    NotInitialized,
    /// `init()` issued while already initialized
    AlreadyActive,
    /// Lock or resource contention
    Busy,
    /// Communication error with the device
    Transport(E),
    /// Unexpected `CHIP_ID` register value (contains the actual value read)
    ChipIdMismatch(u8),
    /// Sampling requested while the device is disabled
    NotActive,
    /// Blocking wait aborted by the host scheduler
    Interrupted,
    /// Hard offset read before it was ever written
    HardOffsetNotWritten,
    /// Catch-all for states that should not occur
    Internal,
}

impl<E> Error<E> {
    /// Legacy integer status code of this error
    ///
    /// Success is `0`; see [`status()`].
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument => -1,
            Self::NotInitialized => -2,
            Self::Busy => -3,
            Self::Transport(_) => -4,
            Self::ChipIdMismatch(_) => -5,
            Self::NotActive => -6,
            Self::Interrupted => -7,
            Self::HardOffsetNotWritten => -8,
            Self::AlreadyActive => -9,
            Self::Internal => -128,
        }
    }

    pub(crate) const fn from_lock(error: LockError) -> Self {
        match error {
            LockError::Busy => Self::Busy,
            LockError::Interrupted => Self::Interrupted,
        }
    }
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Transport(error)
    }
}

/// Collapse a result into the legacy integer status (`0` on success)
pub fn status<T, E>(result: &Result<T, Error<E>>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(error) => error.code(),
    }
}
