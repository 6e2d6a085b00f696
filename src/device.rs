//! High-level driver API for the BMA250
//!
//! [`Bma250Driver`] owns the device lifecycle, the sampling configuration and
//! the conversion of raw counts into acceleration. Every register access goes
//! through the [`Transport`], bracketed by its bus lock; the lock is released
//! before any computation so other devices on a shared bus are not held up.
//!
//! # Example
//!
//! ```ignore
//! let bus_lock = AtomicLock::new();
//! let mut accel = Bma250Driver::new(I2cInterface::new(i2c, delay, &bus_lock));
//! accel.init()?;
//! accel.set_delay(20)?;
//! accel.set_enable(true)?;
//!
//! let sample = accel.measure()?;
//! if accel.take_report()?.contains(Report::DATA) {
//!     // use sample.xyz (µm/s²)
//! }
//! ```

use crate::interface::{Bus, Transport};
use crate::position::Position;
use crate::power::{self, Bandwidth, PowerMode};
use crate::registers::{self, Bma250 as RegisterDevice};
use crate::report::Report;
use crate::vector::{Sample, Vector3};
use crate::{CHIP_ID, Error, I2C_ADDRESS_SDO_LOW};

use device_driver::RegisterInterface;

/// Smallest hard offset component, in ADC counts (`OFC_OFFSET_*` is 8-bit signed)
pub const HARD_OFFSET_MIN: i32 = -128;

/// Largest hard offset component, in ADC counts
pub const HARD_OFFSET_MAX: i32 = 127;

/// Lowest value the 10-bit ADC produces
pub const ADC_MIN: i32 = -512;

/// Highest value the 10-bit ADC produces
pub const ADC_MAX: i32 = 511;

/// Filter threshold programmed by `init()`, in ADC counts
pub const DEFAULT_FILTER_THRESHOLD: i32 = 2;

/// Standard gravity in µm/s²
const GRAVITY_UM_S2: i64 = 9_806_650;

/// Sensitivity at ±2 g
const COUNTS_PER_G: i64 = 256;

/// Software filter configuration
///
/// While the filter is enabled, a sample is only reported (sets
/// [`Report::DATA`]) when at least one axis moved by `threshold` counts or
/// more since the last reported sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Filter {
    /// Minimum per-axis change in ADC counts
    pub threshold: i32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FILTER_THRESHOLD,
        }
    }
}

/// State that exists between `init()` and `term()`
#[derive(Debug)]
struct Context {
    delay_ms: u32,
    enabled: bool,
    position: Position,
    hard_offset: Option<Vector3>,
    filter: Filter,
    filter_enabled: bool,
    last_reported: Option<Vector3>,
    last_sample: Option<Sample>,
    report: Report,
}

impl Context {
    fn new() -> Self {
        Self {
            delay_ms: power::DEFAULT_DELAY_MS,
            enabled: false,
            position: Position::DEFAULT,
            hard_offset: None,
            filter: Filter::default(),
            filter_enabled: false,
            last_reported: None,
            last_sample: None,
            report: Report::empty(),
        }
    }

    /// Turn raw counts into a sample and raise the matching report flags
    fn process(&mut self, raw: Vector3) -> Sample {
        let mut report = Report::empty();

        if raw.any(|c| c == ADC_MIN || c == ADC_MAX) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Acceleration overflow: {}", raw);
            report |= Report::OVERFLOW;
        }

        let oriented = self.position.apply(raw);
        let sample = Sample {
            xyz: oriented.map(counts_to_um_s2),
            raw,
        };

        if self.passes_filter(oriented) {
            self.last_reported = Some(oriented);
            report |= Report::DATA;
        }
        self.last_sample = Some(sample);
        self.report |= report;

        sample
    }

    fn passes_filter(&self, oriented: Vector3) -> bool {
        if !self.filter_enabled {
            return true;
        }
        self.last_reported.is_none_or(|last| {
            (oriented - last).any(|delta| delta.saturating_abs() >= self.filter.threshold)
        })
    }
}

/// Convert ADC counts at ±2 g into µm/s²
// Clamped value is guaranteed to fit in i32
#[allow(clippy::cast_possible_truncation)]
fn counts_to_um_s2(counts: i32) -> i32 {
    let um_s2 = i64::from(counts) * GRAVITY_UM_S2 / COUNTS_PER_G;
    um_s2.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Run `f` against the register map with the bus lock held
fn with_bus<T, R>(
    transport: &mut T,
    address: u8,
    f: impl FnOnce(&mut RegisterDevice<Bus<'_, T>>) -> Result<R, Error<T::Error>>,
) -> Result<R, Error<T::Error>>
where
    T: Transport,
{
    transport.lock().map_err(Error::from_lock)?;
    let result = f(&mut RegisterDevice::new(Bus::new(transport, address)));
    transport.unlock();
    result
}

/// Main driver for the BMA250
pub struct Bma250Driver<T> {
    transport: T,
    address: u8,
    context: Option<Context>,
}

impl<T> Bma250Driver<T> {
    /// Create a driver for a chip at the default address (0x18, SDO pin LOW)
    ///
    /// No bus traffic happens until `init()`.
    pub const fn new(transport: T) -> Self {
        Self::with_address(transport, I2C_ADDRESS_SDO_LOW)
    }

    /// Create a driver for a chip at a custom address
    pub const fn with_address(transport: T, address: u8) -> Self {
        Self {
            transport,
            address,
            context: None,
        }
    }

    /// `true` between a successful `init()` and `term()`
    pub const fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    /// Consume the driver and return the underlying transport
    pub fn release(self) -> T {
        self.transport
    }
}

impl<T: Transport> Bma250Driver<T> {
    fn context(&self) -> Result<&Context, Error<T::Error>> {
        self.context.as_ref().ok_or(Error::NotInitialized)
    }

    fn context_mut(&mut self) -> Result<&mut Context, Error<T::Error>> {
        self.context.as_mut().ok_or(Error::NotInitialized)
    }

    /// Open the bus, verify the chip and program the default configuration
    ///
    /// The chip is left in suspend mode; call `set_enable(true)` to start
    /// sampling.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The driver is already initialized (`AlreadyActive`)
    /// - The bus lock cannot be taken (`Busy`, `Interrupted`)
    /// - The `CHIP_ID` register holds an unexpected value (`ChipIdMismatch`)
    /// - Communication with the device fails (`Transport`)
    pub fn init(&mut self) -> Result<(), Error<T::Error>> {
        if self.context.is_some() {
            return Err(Error::AlreadyActive);
        }

        let context = Context::new();
        let address = self.address;
        let transport = &mut self.transport;

        transport.lock().map_err(Error::from_lock)?;
        let result = Self::power_on(transport, address, context.delay_ms);
        transport.unlock();
        result?;

        #[cfg(feature = "defmt")]
        defmt::info!("BMA250 initialized at address {=u8:#x}", address);

        self.context = Some(context);
        Ok(())
    }

    fn power_on(transport: &mut T, address: u8, delay_ms: u32) -> Result<(), Error<T::Error>> {
        transport.open()?;
        let result = Self::reset_and_configure(transport, address, delay_ms);
        if result.is_err() {
            // The configuration error is the one worth reporting
            let _ = transport.close();
        }
        result
    }

    fn reset_and_configure(
        transport: &mut T,
        address: u8,
        delay_ms: u32,
    ) -> Result<(), Error<T::Error>> {
        {
            let mut device = RegisterDevice::new(Bus::new(transport, address));

            let chip_id = device.chip_id().read()?.chip_id();
            if chip_id != CHIP_ID {
                #[cfg(feature = "defmt")]
                defmt::warn!("Unexpected chip id {=u8:#x}", chip_id);
                return Err(Error::ChipIdMismatch(chip_id));
            }

            device.bgw_softreset().write(|w| {
                w.set_softreset(registers::SOFTRESET_CMD);
            })?;
        }

        // Registers are inaccessible until the reset completes
        transport.sleep_ms(registers::SOFTRESET_SETTLE_MS);

        let mut device = RegisterDevice::new(Bus::new(transport, address));
        device.pmu_range().write(|w| {
            w.set_range(registers::RANGE_2G);
        })?;
        device.pmu_bw().write(|w| {
            w.set_bw(Bandwidth::for_delay(delay_ms).register_value());
        })?;
        device.pmu_lpw().write(|w| {
            w.set_suspend(PowerMode::Suspend.suspend_bit());
        })?;
        Ok(())
    }

    /// Suspend the chip, close the bus and drop all configuration
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`, a lock error, or a bus error.
    /// On error the driver stays initialized.
    pub fn term(&mut self) -> Result<(), Error<T::Error>> {
        self.context()?;

        let address = self.address;
        let transport = &mut self.transport;

        transport.lock().map_err(Error::from_lock)?;
        let result = Self::power_off(transport, address);
        transport.unlock();
        result?;

        #[cfg(feature = "defmt")]
        defmt::info!("BMA250 terminated");

        self.context = None;
        Ok(())
    }

    fn power_off(transport: &mut T, address: u8) -> Result<(), Error<T::Error>> {
        RegisterDevice::new(Bus::new(transport, address))
            .pmu_lpw()
            .write(|w| {
                w.set_suspend(PowerMode::Suspend.suspend_bit());
            })?;
        transport.close()?;
        Ok(())
    }

    /// Polling period in milliseconds
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn delay(&self) -> Result<u32, Error<T::Error>> {
        Ok(self.context()?.delay_ms)
    }

    /// Set the polling period in milliseconds
    ///
    /// While enabled the matching bandwidth is programmed right away; while
    /// disabled it is programmed on the next `set_enable(true)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` outside
    /// [`DELAY_MIN_MS`](power::DELAY_MIN_MS)..=[`DELAY_MAX_MS`](power::DELAY_MAX_MS),
    /// or a lock or bus error.
    pub fn set_delay(&mut self, delay_ms: u32) -> Result<(), Error<T::Error>> {
        let enabled = self.context()?.enabled;
        if !power::is_valid_delay(delay_ms) {
            return Err(Error::InvalidArgument);
        }

        if enabled {
            let bandwidth = Bandwidth::for_delay(delay_ms);
            with_bus(&mut self.transport, self.address, |device| {
                device.pmu_bw().write(|w| {
                    w.set_bw(bandwidth.register_value());
                })?;
                Ok(())
            })?;
        }

        self.context_mut()?.delay_ms = delay_ms;
        Ok(())
    }

    /// Hard offset in ADC counts, as last programmed with `set_offset()`
    ///
    /// # Errors
    ///
    /// Returns `HardOffsetNotWritten` until `set_offset()` succeeds.
    pub fn offset(&self) -> Result<Vector3, Error<T::Error>> {
        self.context()?
            .hard_offset
            .ok_or(Error::HardOffsetNotWritten)
    }

    /// Program the hard offset in ADC counts
    ///
    /// The components go to the chip's offset compensation registers, which
    /// add them to every conversion before it reaches the data registers.
    /// Raises [`Report::HARD_OFFSET_CHANGED`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a component lies outside
    /// [`HARD_OFFSET_MIN`]..=[`HARD_OFFSET_MAX`], or a lock or bus error. On
    /// error the previous offset is kept.
    pub fn set_offset(&mut self, offset: Vector3) -> Result<(), Error<T::Error>> {
        self.context()?;
        let [x, y, z] = offset.to_array().map(|c| i8::try_from(c).ok());
        let (Some(x), Some(y), Some(z)) = (x, y, z) else {
            return Err(Error::InvalidArgument);
        };

        with_bus(&mut self.transport, self.address, |device| {
            device.ofc_offset_x().write(|w| {
                w.set_offset_x(x.to_le_bytes()[0]);
            })?;
            device.ofc_offset_y().write(|w| {
                w.set_offset_y(y.to_le_bytes()[0]);
            })?;
            device.ofc_offset_z().write(|w| {
                w.set_offset_z(z.to_le_bytes()[0]);
            })?;
            Ok(())
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("BMA250 hard offset: {}", offset);

        let context = self.context_mut()?;
        context.hard_offset = Some(offset);
        context.report |= Report::HARD_OFFSET_CHANGED;
        Ok(())
    }

    /// `true` while sampling
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn enabled(&self) -> Result<bool, Error<T::Error>> {
        Ok(self.context()?.enabled)
    }

    /// Start or stop sampling
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`, or a lock or bus error. The
    /// stored state only changes once the chip accepted the new mode.
    pub fn set_enable(&mut self, enable: bool) -> Result<(), Error<T::Error>> {
        let context = self.context()?;
        let was_enabled = context.enabled;
        let bandwidth = Bandwidth::for_delay(context.delay_ms);
        let mode = if enable {
            PowerMode::Normal
        } else {
            PowerMode::Suspend
        };

        with_bus(&mut self.transport, self.address, |device| {
            if enable {
                device.pmu_bw().write(|w| {
                    w.set_bw(bandwidth.register_value());
                })?;
            }
            device.pmu_lpw().write(|w| {
                w.set_suspend(mode.suspend_bit());
            })?;
            Ok(())
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("BMA250 power mode: {}", mode);

        let context = self.context_mut()?;
        if enable && !was_enabled {
            context.last_reported = None;
        }
        context.enabled = enable;
        Ok(())
    }

    /// Software filter configuration
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn filter(&self) -> Result<Filter, Error<T::Error>> {
        Ok(self.context()?.filter)
    }

    /// Set the software filter configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a negative threshold.
    pub fn set_filter(&mut self, filter: Filter) -> Result<(), Error<T::Error>> {
        let context = self.context_mut()?;
        if filter.threshold < 0 {
            return Err(Error::InvalidArgument);
        }
        context.filter = filter;
        context.last_reported = None;
        Ok(())
    }

    /// `true` while the software filter is active
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn filter_enabled(&self) -> Result<bool, Error<T::Error>> {
        Ok(self.context()?.filter_enabled)
    }

    /// Turn the software filter on or off
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn set_filter_enable(&mut self, enable: bool) -> Result<(), Error<T::Error>> {
        let context = self.context_mut()?;
        context.filter_enabled = enable;
        context.last_reported = None;
        Ok(())
    }

    /// Mounting position
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn position(&self) -> Result<Position, Error<T::Error>> {
        Ok(self.context()?.position)
    }

    /// Set the mounting position by id (0..=7)
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unknown id.
    pub fn set_position(&mut self, id: u8) -> Result<(), Error<T::Error>> {
        let context = self.context_mut()?;
        context.position = Position::from_id(id).ok_or(Error::InvalidArgument)?;
        Ok(())
    }

    /// Read one sample
    ///
    /// Raises [`Report::DATA`] unless the software filter withholds the
    /// sample, and [`Report::OVERFLOW`] if any raw axis sits at the ADC limit.
    /// The returned sample is always the fresh one, and is also kept as
    /// [`last_sample()`](Self::last_sample).
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`, `NotActive` while disabled,
    /// or a lock or bus error.
    pub fn measure(&mut self) -> Result<Sample, Error<T::Error>> {
        if !self.context()?.enabled {
            return Err(Error::NotActive);
        }

        // Read all 6 bytes in one transfer to prevent torn samples
        let mut buffer = [0u8; registers::ACCD_LEN];
        with_bus(&mut self.transport, self.address, |device| {
            device
                .interface
                .read_register(registers::ACCD_X_LSB, 48, &mut buffer)?;
            Ok(())
        })?;

        let raw = Vector3::new(
            i32::from(registers::decode_axis(buffer[0], buffer[1])),
            i32::from(registers::decode_axis(buffer[2], buffer[3])),
            i32::from(registers::decode_axis(buffer[4], buffer[5])),
        );

        Ok(self.context_mut()?.process(raw))
    }

    /// Last sample returned by `measure()`, reported or not
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn last_sample(&self) -> Result<Option<Sample>, Error<T::Error>> {
        Ok(self.context()?.last_sample)
    }

    /// Return the pending report flags and clear them
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`.
    pub fn take_report(&mut self) -> Result<Report, Error<T::Error>> {
        Ok(self.context_mut()?.report.take())
    }

    /// Read a single register (for debugging)
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init()`, or a lock or bus error.
    pub fn read_register(&mut self, address: u8) -> Result<u8, Error<T::Error>> {
        self.context()?;
        let mut value = [0u8; 1];
        with_bus(&mut self.transport, self.address, |device| {
            device.interface.read_register(address, 8, &mut value)?;
            Ok(())
        })?;
        Ok(value[0])
    }
}
