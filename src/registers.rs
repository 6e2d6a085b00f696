//! Register definitions for the BMA250
//!
//! Only the registers the driver touches are declared. Acceleration data
//! (`ACCD_X_LSB` .. `ACCD_Z_MSB`) is read as one burst through the raw
//! interface so the three axes come from the same conversion.

/// First acceleration data register (`ACCD_X_LSB`)
pub const ACCD_X_LSB: u8 = 0x02;

/// Number of acceleration data bytes (LSB/MSB for X, Y, Z)
pub const ACCD_LEN: usize = 6;

/// Value written to `BGW_SOFTRESET` to reset the chip
pub const SOFTRESET_CMD: u8 = 0xB6;

/// Wake-up time after a soft reset in milliseconds
pub const SOFTRESET_SETTLE_MS: u32 = 2;

/// `PMU_RANGE` value selecting ±2 g
pub const RANGE_2G: u8 = 0x03;

device_driver::create_device!(
    device_name: Bma250,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = LE;
        }

        /// BGW_CHIPID - Chip identification (0x00)
        /// Expected value: 0x03
        register ChipId {
            const ADDRESS = 0x00;
            const SIZE_BITS = 8;

            /// Chip ID (should read 0x03)
            chip_id: uint = 0..8,
        },

        /// PMU_RANGE - Acceleration range (0x0F)
        register PmuRange {
            const ADDRESS = 0x0F;
            const SIZE_BITS = 8;

            /// Range selection (0x03 = ±2g, 0x05 = ±4g, 0x08 = ±8g, 0x0C = ±16g)
            range: uint = 0..4,
            reserved_7_4: uint = 4..8,
        },

        /// PMU_BW - Filter bandwidth (0x10)
        register PmuBw {
            const ADDRESS = 0x10;
            const SIZE_BITS = 8;

            /// Bandwidth selection (0x08 = 7.81 Hz .. 0x0F = 1000 Hz)
            bw: uint = 0..5,
            reserved_7_5: uint = 5..8,
        },

        /// PMU_LPW - Power mode (0x11)
        register PmuLpw {
            const ADDRESS = 0x11;
            const SIZE_BITS = 8;

            reserved_0: uint = 0..1,
            /// Sleep phase duration in low-power mode
            sleep_dur: uint = 1..5,
            reserved_5: uint = 5..6,
            /// Low-power mode enable
            lowpower_en: bool = 6,
            /// Suspend mode enable
            suspend: bool = 7,
        },

        /// BGW_SOFTRESET - Soft reset (0x14)
        register BgwSoftreset {
            const ADDRESS = 0x14;
            const SIZE_BITS = 8;

            /// Write 0xB6 to reset
            softreset: uint = 0..8,
        },

        /// OFC_OFFSET_X - Offset compensation, X axis (0x38)
        register OfcOffsetX {
            const ADDRESS = 0x38;
            const SIZE_BITS = 8;

            /// Two's complement, one LSB per ADC count at ±2g
            offset_x: uint = 0..8,
        },

        /// OFC_OFFSET_Y - Offset compensation, Y axis (0x39)
        register OfcOffsetY {
            const ADDRESS = 0x39;
            const SIZE_BITS = 8;

            /// Two's complement, one LSB per ADC count at ±2g
            offset_y: uint = 0..8,
        },

        /// OFC_OFFSET_Z - Offset compensation, Z axis (0x3A)
        register OfcOffsetZ {
            const ADDRESS = 0x3A;
            const SIZE_BITS = 8;

            /// Two's complement, one LSB per ADC count at ±2g
            offset_z: uint = 0..8,
        },
    }
);

/// Decode one axis from its `LSB`/`MSB` register pair
///
/// The sample is 10 bits, left-aligned across the two registers; bit 0 of the
/// LSB register is the new-data flag.
#[must_use]
pub const fn decode_axis(lsb: u8, msb: u8) -> i16 {
    i16::from_le_bytes([lsb, msb]) >> 6
}
