//! Power modes and bandwidth selection
//!
//! The BMA250 samples continuously in normal mode and stops in suspend mode.
//! The output data rate follows from the filter bandwidth: new data is
//! produced every `1 / (2 * bandwidth)` seconds.
//!
//! The driver does not run a timer of its own. The host polls `measure()`
//! every `delay` milliseconds, and the driver programs the narrowest
//! bandwidth that still refreshes the data registers within that period.
//!
//! # Example
//!
//! ```
//! use bma250::power::Bandwidth;
//!
//! assert_eq!(Bandwidth::for_delay(20), Bandwidth::Hz31_25);
//! assert_eq!(Bandwidth::for_delay(100), Bandwidth::Hz7_81);
//! ```

/// Shortest polling period accepted by `set_delay()` in milliseconds
pub const DELAY_MIN_MS: u32 = 1;

/// Longest polling period accepted by `set_delay()` in milliseconds
pub const DELAY_MAX_MS: u32 = 1000;

/// Polling period programmed by `init()` in milliseconds
pub const DEFAULT_DELAY_MS: u32 = 100;

/// Power mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Continuous sampling
    Normal,
    /// Sampling stopped, registers retained
    Suspend,
}

impl PowerMode {
    /// Value of the `suspend` bit in `PMU_LPW`
    #[must_use]
    pub const fn suspend_bit(self) -> bool {
        matches!(self, Self::Suspend)
    }
}

/// Digital filter bandwidth (`PMU_BW`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bandwidth {
    /// 7.81 Hz, 64 ms update time
    Hz7_81 = 0x08,
    /// 15.63 Hz, 32 ms update time
    Hz15_63 = 0x09,
    /// 31.25 Hz, 16 ms update time
    Hz31_25 = 0x0A,
    /// 62.5 Hz, 8 ms update time
    Hz62_5 = 0x0B,
    /// 125 Hz, 4 ms update time
    Hz125 = 0x0C,
    /// 250 Hz, 2 ms update time
    Hz250 = 0x0D,
    /// 500 Hz, 1 ms update time
    Hz500 = 0x0E,
    /// 1000 Hz, 0.5 ms update time
    Hz1000 = 0x0F,
}

impl Bandwidth {
    /// Narrowest first
    const TABLE: [Self; 8] = [
        Self::Hz7_81,
        Self::Hz15_63,
        Self::Hz31_25,
        Self::Hz62_5,
        Self::Hz125,
        Self::Hz250,
        Self::Hz500,
        Self::Hz1000,
    ];

    /// Data update time in microseconds
    #[must_use]
    pub const fn update_time_us(self) -> u32 {
        match self {
            Self::Hz7_81 => 64_000,
            Self::Hz15_63 => 32_000,
            Self::Hz31_25 => 16_000,
            Self::Hz62_5 => 8_000,
            Self::Hz125 => 4_000,
            Self::Hz250 => 2_000,
            Self::Hz500 => 1_000,
            Self::Hz1000 => 500,
        }
    }

    /// Narrowest bandwidth whose update time fits in `delay_ms`
    #[must_use]
    pub fn for_delay(delay_ms: u32) -> Self {
        let delay_us = delay_ms.saturating_mul(1000);
        Self::TABLE
            .into_iter()
            .find(|bw| bw.update_time_us() <= delay_us)
            .unwrap_or(Self::Hz1000)
    }

    /// Value of the `bw` field in `PMU_BW`
    #[must_use]
    pub const fn register_value(self) -> u8 {
        self as u8
    }
}

/// `true` if `delay_ms` is accepted by `set_delay()`
#[must_use]
pub const fn is_valid_delay(delay_ms: u32) -> bool {
    delay_ms >= DELAY_MIN_MS && delay_ms <= DELAY_MAX_MS
}
