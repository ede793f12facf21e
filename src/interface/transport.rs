//! The transport bound at detection time.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use super::{Ak8963Interface, QueuedInterface};

/// Which path exposes the magnetometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    /// Directly on the host bus.
    Direct,
    /// Behind the auxiliary I2C master of a second chip.
    PassThrough,
}

/// Error raised by whichever transport is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<DE, PE> {
    /// Error from the direct transport.
    Direct(DE),
    /// Error from the pass-through transport.
    PassThrough(PE),
}

/// One of two transports, fixed for the lifetime of the driver.
pub enum Transport<D, P> {
    /// Magnetometer found on the direct bus.
    Direct(D),
    /// Magnetometer found behind the pass-through master.
    PassThrough(P),
}

impl<D, P> Transport<D, P> {
    /// Returns which path is bound.
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Direct(_) => TransportKind::Direct,
            Self::PassThrough(_) => TransportKind::PassThrough,
        }
    }
}

impl<D, P> Ak8963Interface for Transport<D, P>
where
    D: Ak8963Interface,
    P: Ak8963Interface,
{
    type Error = TransportError<D::Error, P::Error>;

    fn setup(&mut self, delay: &mut impl DelayNs) -> core::result::Result<(), Self::Error> {
        match self {
            Self::Direct(iface) => iface.setup(delay).map_err(TransportError::Direct),
            Self::PassThrough(iface) => iface.setup(delay).map_err(TransportError::PassThrough),
        }
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        match self {
            Self::Direct(iface) => iface.read_many(register, buf).map_err(TransportError::Direct),
            Self::PassThrough(iface) => iface
                .read_many(register, buf)
                .map_err(TransportError::PassThrough),
        }
    }

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        match self {
            Self::Direct(iface) => iface
                .write_register(register, value)
                .map_err(TransportError::Direct),
            Self::PassThrough(iface) => iface
                .write_register(register, value)
                .map_err(TransportError::PassThrough),
        }
    }
}

impl<D, P> QueuedInterface for Transport<D, P>
where
    D: QueuedInterface,
    P: QueuedInterface,
{
    fn start_read(&mut self, register: u8, len: u8) -> core::result::Result<(), Self::Error> {
        match self {
            Self::Direct(iface) => iface.start_read(register, len).map_err(TransportError::Direct),
            Self::PassThrough(iface) => iface
                .start_read(register, len)
                .map_err(TransportError::PassThrough),
        }
    }

    fn drain(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        match self {
            Self::Direct(iface) => iface.drain(buf).map_err(TransportError::Direct),
            Self::PassThrough(iface) => iface.drain(buf).map_err(TransportError::PassThrough),
        }
    }
}

/// Placeholder for a transport the board does not have.
///
/// Uninhabited: a `Detector` slot of this type is always empty.
pub enum Absent {}

impl Ak8963Interface for Absent {
    type Error = Infallible;

    fn read_many(&mut self, _register: u8, _buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        match *self {}
    }

    fn write_register(&mut self, _register: u8, _value: u8) -> core::result::Result<(), Self::Error> {
        match *self {}
    }
}

impl QueuedInterface for Absent {
    fn start_read(&mut self, _register: u8, _len: u8) -> core::result::Result<(), Self::Error> {
        match *self {}
    }

    fn drain(&mut self, _buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        match *self {}
    }
}
