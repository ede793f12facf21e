//! Error handling primitives for the AK8963 driver.

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// `WIA` did not return the AK8963 identity byte.
    DeviceIdMismatch,
    /// No queued read is outstanding.
    NotQueued,
    /// The completion buffer is shorter than the queued length.
    BufferLength,
    /// The requested operation is not available yet.
    NotReady,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
