//! Bus transport for the BMA250
//!
//! [`Transport`] is the set of primitives the driver needs from its host:
//! an exclusive bus lock, open/close, register reads and writes addressed to a
//! slave, and a blocking sleep. [`I2cInterface`] implements it on top of
//! `embedded-hal`.

use crate::lock::{LockError, RawLock};
use device_driver::RegisterInterface;

/// Longest payload [`Transport::write`] has to carry
///
/// Every register in the map is a single byte, so the driver never writes
/// more than one byte per call.
pub const MAX_WRITE_LEN: usize = 8;

/// Bus primitives supplied by the host
///
/// Every register access made by the driver is bracketed by `lock()` and
/// `unlock()`. The lock may be shared with other drivers on the same bus.
pub trait Transport {
    /// Bus error type
    type Error;

    /// Take exclusive ownership of the bus
    ///
    /// # Errors
    ///
    /// Returns [`LockError`] if the bus is held elsewhere or the wait was
    /// aborted.
    fn lock(&mut self) -> Result<(), LockError>;

    /// Give the bus back
    fn unlock(&mut self);

    /// Prepare the bus for use
    ///
    /// # Errors
    ///
    /// Returns the bus error if the bus cannot be opened.
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Release bus resources taken by `open()`
    ///
    /// # Errors
    ///
    /// Returns the bus error if the bus cannot be closed.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Write `data` starting at `register` of device `slave`
    ///
    /// `data` holds at most [`MAX_WRITE_LEN`] bytes; implementations may drop
    /// anything beyond that.
    ///
    /// # Errors
    ///
    /// Returns the bus error on transfer failure.
    fn write(&mut self, slave: u8, register: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Fill `data` starting at `register` of device `slave`
    ///
    /// # Errors
    ///
    /// Returns the bus error on transfer failure.
    fn read(&mut self, slave: u8, register: u8, data: &mut [u8]) -> Result<(), Self::Error>;

    /// Block for `ms` milliseconds
    fn sleep_ms(&mut self, ms: u32);
}

/// I2C transport built from `embedded-hal` parts
///
/// * `I2C` - the I2C peripheral
/// * `D` - a delay provider
/// * `L` - the bus lock; pass `&AtomicLock` to share one lock between drivers
pub struct I2cInterface<I2C, D, L> {
    i2c: I2C,
    delay: D,
    lock: L,
    open: bool,
}

impl<I2C, D, L> I2cInterface<I2C, D, L> {
    /// Create a new I2C transport
    ///
    /// # Example
    /// ```ignore
    /// let bus_lock = AtomicLock::new();
    /// let transport = I2cInterface::new(i2c, delay, &bus_lock);
    /// let mut accel = Bma250Driver::new(transport);
    /// accel.init()?;
    /// ```
    pub const fn new(i2c: I2C, delay: D, lock: L) -> Self {
        Self {
            i2c,
            delay,
            lock,
            open: false,
        }
    }

    /// `true` between `open()` and `close()`
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Consume the interface and return the I2C peripheral and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D, L> Transport for I2cInterface<I2C, D, L>
where
    I2C: embedded_hal::i2c::I2c,
    D: embedded_hal::delay::DelayNs,
    L: RawLock,
{
    type Error = I2C::Error;

    fn lock(&mut self) -> Result<(), LockError> {
        self.lock.lock()
    }

    fn unlock(&mut self) {
        self.lock.unlock();
    }

    fn open(&mut self) -> Result<(), Self::Error> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.open = false;
        Ok(())
    }

    fn write(&mut self, slave: u8, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        // Register address followed by the payload, cut at MAX_WRITE_LEN
        let mut buffer = [0u8; 1 + MAX_WRITE_LEN];
        buffer[0] = register;
        let len = data.len().min(MAX_WRITE_LEN);
        buffer[1..=len].copy_from_slice(&data[..len]);

        self.i2c.write(slave, &buffer[..=len])
    }

    fn read(&mut self, slave: u8, register: u8, data: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(slave, &[register], data)
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

/// Register-level view of a [`Transport`] bound to one slave address
///
/// Lets the `device-driver` register map run over any transport. It does not
/// lock; callers hold the bus lock for the lifetime of the adapter.
pub(crate) struct Bus<'a, T> {
    transport: &'a mut T,
    slave: u8,
}

impl<'a, T> Bus<'a, T> {
    pub(crate) fn new(transport: &'a mut T, slave: u8) -> Self {
        Self { transport, slave }
    }
}

impl<T: Transport> RegisterInterface for Bus<'_, T> {
    type Error = T::Error;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in read_data.len()
        self.transport.read(self.slave, address, read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in write_data.len()
        self.transport.write(self.slave, address, write_data)
    }
}
