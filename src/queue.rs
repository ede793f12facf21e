//! Bookkeeping for the single outstanding queued read.

/// Minimum time between arming a transaction and its data being valid.
pub const CONVERSION_BUDGET_US: u32 = 8_000;

/// Monotonic microsecond time source.
///
/// The counter may wrap; elapsed time is computed with wrapping arithmetic.
pub trait MicrosClock {
    /// Current time in microseconds.
    fn now_us(&self) -> u32;
}

impl<C: MicrosClock + ?Sized> MicrosClock for &C {
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

/// State of the in-flight queued transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueuedRead {
    waiting: bool,
    len: u8,
    started_at: u32,
}

impl QueuedRead {
    /// An idle slot.
    pub const fn new() -> Self {
        Self {
            waiting: false,
            len: 0,
            started_at: 0,
        }
    }

    /// Records a new transaction of `len` bytes issued at `now`.
    ///
    /// Returns `false` and leaves the slot untouched while another read is
    /// outstanding.
    pub fn start(&mut self, len: u8, now: u32) -> bool {
        if self.waiting {
            return false;
        }

        self.len = len;
        self.started_at = now;
        self.waiting = true;
        true
    }

    /// Microseconds left of the conversion budget, zero when idle.
    pub fn time_remaining(&self, now: u32) -> u32 {
        if !self.waiting {
            return 0;
        }

        let elapsed = now.wrapping_sub(self.started_at);
        CONVERSION_BUDGET_US.saturating_sub(elapsed)
    }

    /// Clears the slot, returning the declared length if one was outstanding.
    pub fn finish(&mut self) -> Option<u8> {
        if !self.waiting {
            return None;
        }

        self.waiting = false;
        Some(self.len)
    }

    /// A transaction is outstanding.
    pub const fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Declared byte count of the last started transaction.
    pub const fn declared_len(&self) -> u8 {
        self.len
    }

    /// Issue timestamp of the last started transaction.
    pub const fn started_at(&self) -> u32 {
        self.started_at
    }
}

/// Clock moved by hand from test code.
#[cfg(test)]
pub(crate) struct ManualClock(core::cell::Cell<u32>);

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(now: u32) -> Self {
        Self(core::cell::Cell::new(now))
    }

    pub(crate) fn set(&self, now: u32) {
        self.0.set(now);
    }

    pub(crate) fn advance(&self, us: u32) {
        self.0.set(self.0.get().wrapping_add(us));
    }
}

#[cfg(test)]
impl MicrosClock for ManualClock {
    fn now_us(&self) -> u32 {
        self.0.get()
    }
}
