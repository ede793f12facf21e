//! Generic magnetometer capability exposed to a sensor registry.

use embedded_hal::delay::DelayNs;

use crate::device::Ak8963;
use crate::error::Error;
use crate::interface::QueuedInterface;
use crate::queue::MicrosClock;

/// The two entry points a sensor framework drives a magnetometer through.
pub trait Magnetometer {
    /// Error surfaced by initialization.
    type Error;

    /// One-time bring-up after detection.
    fn init(&mut self, delay: &mut impl DelayNs) -> core::result::Result<(), Self::Error>;

    /// Polled once per control-loop tick; `None` when no new sample is ready.
    fn read(&mut self) -> Option<[i16; 3]>;
}

impl<IFACE, CLK, CommE> Magnetometer for Ak8963<IFACE, CLK>
where
    IFACE: QueuedInterface<Error = CommE>,
    CLK: MicrosClock,
{
    type Error = Error<CommE>;

    fn init(&mut self, delay: &mut impl DelayNs) -> core::result::Result<(), Self::Error> {
        Ak8963::init(self, delay)
    }

    fn read(&mut self) -> Option<[i16; 3]> {
        Ak8963::read(self)
    }
}
