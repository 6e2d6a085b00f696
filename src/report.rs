//! Report flags
//!
//! The driver and the calibration engine accumulate [`Report`] flags as
//! events happen. The host reads and clears them with `take_report()`.

use bitflags::bitflags;

bitflags! {
    /// Events signalled to the host
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Report: u8 {
        /// A new sample is available
        const DATA = 0x01;
        /// The calibration engine evaluated a stationary window
        const CALIB = 0x02;
        /// A raw component hit the ADC limit
        const OVERFLOW = 0x04;
        /// The hard offset was written
        const HARD_OFFSET_CHANGED = 0x08;
        /// The calibration offset moved noticeably
        const CALIB_OFFSET_CHANGED = 0x10;
    }
}

impl Report {
    /// Return the pending flags and clear them
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Report {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Report({=u8:#04x})", self.bits());
    }
}
