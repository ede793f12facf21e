//! Bus interface abstraction for the AK8963 driver.

pub mod i2c;
pub mod pass_through;
pub mod transport;

use embedded_hal::delay::DelayNs;

pub use self::i2c::I2cInterface;
pub use self::pass_through::{PassThroughError, PassThroughInterface};
pub use self::transport::{Absent, Transport, TransportError, TransportKind};

/// Abstraction over the low-level bus access required by the driver.
///
/// Every call performs exactly one register transaction; there are no retries.
pub trait Ak8963Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Gives the transport a chance to bring up the path to the magnetometer.
    fn setup(&mut self, delay: &mut impl DelayNs) -> core::result::Result<(), Self::Error> {
        let _ = delay;
        Ok(())
    }

    /// Reads multiple consecutive registers into the provided buffer.
    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<(), Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error>;

    /// Reads a single register.
    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.read_many(register, &mut value)?;
        Ok(value[0])
    }
}

/// Transports that can split a read into an issue step and a collect step.
pub trait QueuedInterface: Ak8963Interface {
    /// Issues a read of `len` bytes starting at `register` without waiting.
    fn start_read(&mut self, register: u8, len: u8) -> core::result::Result<(), Self::Error>;

    /// Collects the bytes of the previously started read.
    ///
    /// Only valid after a successful [`start_read`](Self::start_read); the
    /// driver never drains an idle slot.
    fn drain(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error>;
}
