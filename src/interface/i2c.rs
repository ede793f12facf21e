//! Direct I2C interface built on top of `embedded-hal` `I2c`.

use embedded_hal::i2c::I2c;

use super::{Ak8963Interface, QueuedInterface};
use crate::registers::I2C_ADDRESS;

/// I2C-based interface talking to the magnetometer on the host bus.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
    pending: Option<u8>,
}

impl<I2C> I2cInterface<I2C> {
    /// Creates a new interface at the fixed AK8963 address.
    pub const fn new(i2c: I2C) -> Self {
        Self::new_with_address(i2c, I2C_ADDRESS)
    }

    /// Creates a new interface for a part strapped to another CAD address.
    pub const fn new_with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            pending: None,
        }
    }

    /// Returns the 7-bit device address in use.
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consumes the interface and returns the owned bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Ak8963Interface for I2cInterface<I2C>
where
    I2C: I2c,
{
    type Error = I2C::Error;

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        if buf.is_empty() {
            return Ok(());
        }

        self.i2c.write_read(self.address, &[register], buf)
    }

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        self.i2c.write(self.address, &[register, value])
    }
}

/// The host bus has no queue of its own: the start step only remembers the
/// register and the whole transfer happens on drain. A drain with nothing
/// started performs no transfer and leaves `buf` as it was.
impl<I2C> QueuedInterface for I2cInterface<I2C>
where
    I2C: I2c,
{
    fn start_read(&mut self, register: u8, _len: u8) -> core::result::Result<(), Self::Error> {
        self.pending = Some(register);
        Ok(())
    }

    fn drain(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        match self.pending.take() {
            Some(register) => self.read_many(register, buf),
            None => Ok(()),
        }
    }
}
