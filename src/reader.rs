//! Per-tick sample readers.
//!
//! Two protocols share the decoding in [`RawSample`]:
//!
//! - **Synchronous** ([`Ak8963::read_sync`]): `ST1`, then the 7-byte
//!   `HXL..=ST2` burst, then re-arm single measurement. Suited to transports
//!   where a register read costs one short bus transaction.
//! - **Queued** ([`Ak8963::read_queued`]): the status read and the data burst
//!   are each issued, left to convert for
//!   [`CONVERSION_BUDGET_US`](crate::queue::CONVERSION_BUDGET_US), and
//!   collected on a later tick. One sample spans two or three calls.
//!
//! ```text
//!        +--------------+  issue ST1   +------------------+
//!   +--> | CheckStatus  | -----------> | WaitingForStatus |
//!   |    +--------------+              +------------------+
//!   |           ^   not ready (retry once)     |  ready: issue HXL..ST2
//!   |           +------------------------------+
//!   |                                          v
//!   |    sample / error               +----------------+
//!   +-------------------------------- | WaitingForData |
//!                                     +----------------+
//! ```

use crate::device::Ak8963;
use crate::error::{Error, Result};
use crate::interface::{Ak8963Interface, QueuedInterface};
use crate::log::{trace, warning};
use crate::params::{MeasurementMode, ReadMode};
use crate::queue::MicrosClock;
use crate::registers::{Status1, Status2, DATA_BURST_LEN, REG_HXL, REG_ST1};

/// How many times a missed status poll is re-issued within one call.
pub const STATUS_RETRIES_PER_TICK: u8 = 1;

/// Position of the queued reader in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadState {
    /// Next call issues a status read.
    #[default]
    CheckStatus,
    /// A 1-byte `ST1` read is converting.
    WaitingForStatus,
    /// A 7-byte `HXL..=ST2` read is converting.
    WaitingForData,
}

/// The `HXL..=ST2` burst: three little-endian axes and the trailing `ST2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample(pub [u8; DATA_BURST_LEN]);

impl RawSample {
    /// Raw X, Y, Z readings.
    pub fn axes(&self) -> [i16; 3] {
        let b = &self.0;
        [
            i16::from_le_bytes([b[0], b[1]]),
            i16::from_le_bytes([b[2], b[3]]),
            i16::from_le_bytes([b[4], b[5]]),
        ]
    }

    /// The trailing status byte.
    pub fn status2(&self) -> Status2 {
        Status2::from(self.0[6])
    }
}

/// Counters for spotting a reader that has stopped producing samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReaderStats {
    /// Samples emitted.
    pub samples: u32,
    /// Reader calls since the last emitted sample.
    pub ticks_since_sample: u32,
    /// Failed bus transactions while reading.
    pub bus_errors: u32,
    /// Bursts discarded for data-error or overflow flags.
    pub sensor_errors: u32,
    /// Failed single-measurement re-arm writes.
    pub rearm_failures: u32,
}

impl ReaderStats {
    fn record(&mut self, sample: Option<[i16; 3]>) -> Option<[i16; 3]> {
        if sample.is_some() {
            self.samples = self.samples.wrapping_add(1);
            self.ticks_since_sample = 0;
        } else {
            self.ticks_since_sample = self.ticks_since_sample.saturating_add(1);
        }
        sample
    }
}

impl<IFACE, CLK, CommE> Ak8963<IFACE, CLK>
where
    IFACE: Ak8963Interface<Error = CommE>,
    CLK: MicrosClock,
{
    /// Reads one sample with back-to-back status and data transactions.
    ///
    /// Returns `None` when no conversion is ready, the bus failed, or `ST2`
    /// flags the burst. After a sample, single measurement is re-armed; a
    /// failed re-arm is counted in [`ReaderStats::rearm_failures`] and does
    /// not discard the sample.
    pub fn read_sync(&mut self) -> Option<[i16; 3]> {
        let sample = self.fetch_sync();
        self.stats.record(sample)
    }

    fn fetch_sync(&mut self) -> Option<[i16; 3]> {
        let status = match self.read_typed::<Status1>() {
            Ok(status) => status,
            Err(_) => {
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                return None;
            }
        };
        if !status.has_data() {
            return None;
        }

        let mut raw = RawSample::default();
        if self.interface.read_many(REG_HXL, &mut raw.0).is_err() {
            self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
            return None;
        }

        let sample = self.decode(&raw)?;

        if self.set_mode(MeasurementMode::Single).is_err() {
            warning!("ak8963 re-arm failed");
            self.stats.rearm_failures = self.stats.rearm_failures.wrapping_add(1);
        }

        Some(sample)
    }

    fn decode(&mut self, raw: &RawSample) -> Option<[i16; 3]> {
        if !raw.status2().is_valid() {
            trace!("ak8963 burst rejected, st2 = {}", raw.0[6]);
            self.stats.sensor_errors = self.stats.sensor_errors.wrapping_add(1);
            return None;
        }

        Some(self.gain.apply(raw.axes()))
    }
}

impl<IFACE, CLK, CommE> Ak8963<IFACE, CLK>
where
    IFACE: QueuedInterface<Error = CommE>,
    CLK: MicrosClock,
{
    /// Reads with the protocol selected by [`Config::read_mode`](crate::Config).
    pub fn read(&mut self) -> Option<[i16; 3]> {
        match self.config.read_mode {
            ReadMode::Synchronous => self.read_sync(),
            ReadMode::Queued => self.read_queued(),
        }
    }

    /// Advances the queued reader by one tick.
    ///
    /// Never waits on the bus for more than one transaction. Returns `None`
    /// until a full status-then-data cycle completes with a valid burst.
    pub fn read_queued(&mut self) -> Option<[i16; 3]> {
        let sample = self.step_queued();
        self.stats.record(sample)
    }

    fn step_queued(&mut self) -> Option<[i16; 3]> {
        let mut retries = STATUS_RETRIES_PER_TICK;

        loop {
            match self.state {
                ReadState::CheckStatus => {
                    if self.issue_queued(REG_ST1, 1) {
                        self.state = ReadState::WaitingForStatus;
                    }
                    return None;
                }
                ReadState::WaitingForStatus => {
                    if self.queued_time_remaining() > 0 {
                        return None;
                    }

                    let mut status = [0u8; 1];
                    let ready = match self.complete_queued_read(&mut status) {
                        Ok(_) => Status1::from(status[0]).has_data(),
                        Err(_) => {
                            self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                            false
                        }
                    };

                    if !ready {
                        self.state = ReadState::CheckStatus;
                        if retries > 0 {
                            retries -= 1;
                            continue;
                        }
                        return None;
                    }

                    self.state = if self.issue_queued(REG_HXL, DATA_BURST_LEN as u8) {
                        ReadState::WaitingForData
                    } else {
                        ReadState::CheckStatus
                    };
                    return None;
                }
                ReadState::WaitingForData => {
                    if self.queued_time_remaining() > 0 {
                        return None;
                    }

                    let mut raw = RawSample::default();
                    let result = self.complete_queued_read(&mut raw.0);
                    self.state = ReadState::CheckStatus;

                    if result.is_err() {
                        self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                        return None;
                    }
                    return self.decode(&raw);
                }
            }
        }
    }

    fn issue_queued(&mut self, register: u8, len: u8) -> bool {
        match self.start_queued_read(register, len) {
            Ok(started) => started,
            Err(_) => {
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                false
            }
        }
    }

    fn queued_time_remaining(&self) -> u32 {
        self.queued.time_remaining(self.clock.now_us())
    }

    /// Issues a queued read of `len` bytes at `register`.
    ///
    /// Returns `Ok(false)` without touching the bus or the outstanding
    /// transaction while another queued read is in flight.
    pub(crate) fn start_queued_read(&mut self, register: u8, len: u8) -> Result<bool, CommE> {
        if self.queued.is_waiting() {
            return Ok(false);
        }

        self.interface
            .start_read(register, len)
            .map_err(Error::from)?;
        Ok(self.queued.start(len, self.clock.now_us()))
    }

    /// Collects the outstanding queued read into `buf`, returning its length.
    ///
    /// Spins out whatever remains of the conversion budget first. `buf` must
    /// hold at least the declared length; exactly that many bytes are written.
    pub(crate) fn complete_queued_read(&mut self, buf: &mut [u8]) -> Result<usize, CommE> {
        if !self.queued.is_waiting() {
            return Err(Error::NotQueued);
        }

        let len = usize::from(self.queued.declared_len());
        if buf.len() < len {
            return Err(Error::BufferLength);
        }

        while self.queued_time_remaining() > 0 {
            core::hint::spin_loop();
        }
        self.queued.finish();

        self.interface
            .drain(&mut buf[..len])
            .map_err(Error::from)?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::AxisGain;
    use crate::config::Config;
    use crate::queue::{ManualClock, CONVERSION_BUDGET_US};

    /// Register-level fake with a fixed status byte and data burst.
    #[derive(Default)]
    struct ScriptedBus {
        status: u8,
        burst: [u8; 7],
        fail_reads: bool,
        fail_writes: bool,
        pending: Option<u8>,
        starts: usize,
        drains: usize,
        writes: Vec<(u8, u8)>,
    }

    impl ScriptedBus {
        fn ready(burst: [u8; 7]) -> Self {
            Self {
                status: 0x01,
                burst,
                ..Self::default()
            }
        }

        fn fill(&self, register: u8, buf: &mut [u8]) {
            match register {
                REG_ST1 => buf[0] = self.status,
                REG_HXL => buf.copy_from_slice(&self.burst[..buf.len()]),
                _ => buf.fill(0),
            }
        }
    }

    impl Ak8963Interface for ScriptedBus {
        type Error = ();

        fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<(), ()> {
            if self.fail_reads {
                return Err(());
            }
            self.fill(register, buf);
            Ok(())
        }

        fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), ()> {
            if self.fail_writes {
                return Err(());
            }
            self.writes.push((register, value));
            Ok(())
        }
    }

    impl QueuedInterface for ScriptedBus {
        fn start_read(&mut self, register: u8, _len: u8) -> core::result::Result<(), ()> {
            self.starts += 1;
            self.pending = Some(register);
            Ok(())
        }

        fn drain(&mut self, buf: &mut [u8]) -> core::result::Result<(), ()> {
            self.drains += 1;
            if self.fail_reads {
                return Err(());
            }
            let register = self.pending.take().ok_or(())?;
            self.fill(register, buf);
            Ok(())
        }
    }

    const AXES_256_512_768: [u8; 7] = [0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00];

    fn queued_device(bus: ScriptedBus, clock: &ManualClock) -> Ak8963<ScriptedBus, &ManualClock> {
        let config = Config::new().read_mode(ReadMode::Queued).build();
        Ak8963::new(bus, clock, config)
    }

    #[test]
    fn sync_read_negates_axes_in_order() {
        let clock = ManualClock::new(0);
        let mut device = Ak8963::new(ScriptedBus::ready(AXES_256_512_768), &clock, Config::default());

        assert_eq!(device.read_sync(), Some([-256, -512, -768]));
        // Single measurement re-armed.
        assert_eq!(device.interface_mut().writes, [(0x0A, 0x01)]);
        assert_eq!(device.stats().samples, 1);
    }

    #[test]
    fn sync_read_applies_gain() {
        let clock = ManualClock::new(0);
        let mut device = Ak8963::new(ScriptedBus::ready(AXES_256_512_768), &clock, Config::default())
            .with_gain(AxisGain::new([2.0, 0.5, 1.0]));

        assert_eq!(device.read_sync(), Some([-512, -256, -768]));
    }

    #[test]
    fn sync_read_accepts_overrun_as_ready() {
        let clock = ManualClock::new(0);
        let mut bus = ScriptedBus::ready(AXES_256_512_768);
        bus.status = 0x02;
        let mut device = Ak8963::new(bus, &clock, Config::default());

        assert!(device.read_sync().is_some());
    }

    #[test]
    fn sync_read_without_ready_flag_yields_nothing() {
        let clock = ManualClock::new(0);
        let mut bus = ScriptedBus::ready(AXES_256_512_768);
        bus.status = 0x00;
        let mut device = Ak8963::new(bus, &clock, Config::default());

        assert_eq!(device.read_sync(), None);
        assert!(device.interface_mut().writes.is_empty());
        assert_eq!(device.stats().ticks_since_sample, 1);
    }

    #[test]
    fn sync_read_discards_overflowed_burst() {
        let clock = ManualClock::new(0);
        let mut burst = AXES_256_512_768;
        burst[6] = 0x04;
        let mut device = Ak8963::new(ScriptedBus::ready(burst), &clock, Config::default());

        assert_eq!(device.read_sync(), None);
        assert_eq!(device.stats().sensor_errors, 1);
        assert!(device.interface_mut().writes.is_empty());
    }

    #[test]
    fn sync_read_bus_failure_yields_nothing() {
        let clock = ManualClock::new(0);
        let mut bus = ScriptedBus::ready(AXES_256_512_768);
        bus.fail_reads = true;
        let mut device = Ak8963::new(bus, &clock, Config::default());

        assert_eq!(device.read_sync(), None);
        assert_eq!(device.stats().bus_errors, 1);
    }

    #[test]
    fn failed_rearm_keeps_the_sample() {
        let clock = ManualClock::new(0);
        let mut bus = ScriptedBus::ready(AXES_256_512_768);
        bus.fail_writes = true;
        let mut device = Ak8963::new(bus, &clock, Config::default());

        assert_eq!(device.read_sync(), Some([-256, -512, -768]));
        assert_eq!(device.stats().rearm_failures, 1);
    }

    #[test]
    fn queued_reader_completes_a_cycle() {
        let clock = ManualClock::new(0);
        let mut device = queued_device(ScriptedBus::ready(AXES_256_512_768), &clock);

        assert_eq!(device.read_queued(), None);
        assert_eq!(device.read_state(), ReadState::WaitingForStatus);

        clock.advance(CONVERSION_BUDGET_US);
        assert_eq!(device.read_queued(), None);
        assert_eq!(device.read_state(), ReadState::WaitingForData);

        clock.advance(CONVERSION_BUDGET_US);
        assert_eq!(device.read_queued(), Some([-256, -512, -768]));
        assert_eq!(device.read_state(), ReadState::CheckStatus);
        assert!(!device.queued_read().is_waiting());
    }

    #[test]
    fn queued_reader_is_live_under_fast_polling() {
        let clock = ManualClock::new(0);
        let mut device = queued_device(ScriptedBus::ready(AXES_256_512_768), &clock);

        let mut calls = 0;
        let sample = loop {
            calls += 1;
            assert!(calls <= 20, "no sample within two conversion budgets");
            let waiting_before = device.queued_read().is_waiting();
            let result = device.read_queued();
            if result.is_some() {
                assert!(waiting_before);
                assert!(!device.queued_read().is_waiting());
                break result;
            }
            clock.advance(1_000);
        };

        assert_eq!(sample, Some([-256, -512, -768]));
        assert_eq!(device.read_state(), ReadState::CheckStatus);
    }

    #[test]
    fn queued_read_is_not_collected_before_budget() {
        let clock = ManualClock::new(1_000);
        let mut device = queued_device(ScriptedBus::ready(AXES_256_512_768), &clock);

        device.read_queued();
        clock.set(1_000 + CONVERSION_BUDGET_US - 1);
        assert_eq!(device.read_queued(), None);
        assert_eq!(device.interface_mut().drains, 0);
        assert_eq!(device.read_state(), ReadState::WaitingForStatus);

        clock.set(1_000 + CONVERSION_BUDGET_US);
        device.read_queued();
        assert_eq!(device.interface_mut().drains, 1);
        assert_eq!(device.read_state(), ReadState::WaitingForData);
    }

    #[test]
    fn missed_status_is_retried_once_per_call() {
        let clock = ManualClock::new(0);
        let mut bus = ScriptedBus::ready(AXES_256_512_768);
        bus.status = 0x00;
        let mut device = queued_device(bus, &clock);

        device.read_queued();
        assert_eq!(device.interface_mut().starts, 1);

        clock.advance(CONVERSION_BUDGET_US);
        assert_eq!(device.read_queued(), None);
        // The miss re-issued the status read within the same call.
        assert_eq!(device.interface_mut().starts, 2);
        assert_eq!(device.interface_mut().drains, 1);
        assert_eq!(device.read_state(), ReadState::WaitingForStatus);
        assert_eq!(device.queued_read().started_at(), CONVERSION_BUDGET_US);

        clock.advance(CONVERSION_BUDGET_US);
        device.read_queued();
        assert_eq!(device.interface_mut().starts, 3);
        assert_eq!(device.interface_mut().drains, 2);
    }

    #[test]
    fn queued_overflow_returns_to_check_status() {
        let clock = ManualClock::new(0);
        let mut burst = AXES_256_512_768;
        burst[6] = 0x04;
        let mut device = queued_device(ScriptedBus::ready(burst), &clock);

        device.read_queued();
        clock.advance(CONVERSION_BUDGET_US);
        device.read_queued();
        clock.advance(CONVERSION_BUDGET_US);

        assert_eq!(device.read_queued(), None);
        assert_eq!(device.read_state(), ReadState::CheckStatus);
        assert_eq!(device.stats().sensor_errors, 1);
    }

    #[test]
    fn queued_data_bus_failure_returns_to_check_status() {
        let clock = ManualClock::new(0);
        let mut device = queued_device(ScriptedBus::ready(AXES_256_512_768), &clock);

        device.read_queued();
        clock.advance(CONVERSION_BUDGET_US);
        device.read_queued();
        device.interface_mut().fail_reads = true;
        clock.advance(CONVERSION_BUDGET_US);

        assert_eq!(device.read_queued(), None);
        assert_eq!(device.read_state(), ReadState::CheckStatus);
        assert_eq!(device.stats().bus_errors, 1);
    }

    #[test]
    fn slot_is_idle_whenever_reader_checks_status() {
        let clock = ManualClock::new(0);
        let mut device = queued_device(ScriptedBus::ready(AXES_256_512_768), &clock);

        for tick in 0..40u32 {
            let bus = device.interface_mut();
            bus.status = if tick % 3 == 0 { 0x00 } else { 0x01 };
            bus.fail_reads = tick % 7 == 0;

            device.read_queued();
            if device.read_state() == ReadState::CheckStatus {
                assert!(!device.queued_read().is_waiting());
            } else {
                assert!(device.queued_read().is_waiting());
            }
            clock.advance(4_000);
        }
        assert!(device.stats().samples > 0);
    }

    #[test]
    fn second_queued_start_is_rejected() {
        let clock = ManualClock::new(500);
        let mut device = queued_device(ScriptedBus::default(), &clock);

        assert_eq!(device.start_queued_read(REG_ST1, 1), Ok(true));
        clock.advance(100);
        assert_eq!(device.start_queued_read(REG_HXL, 7), Ok(false));

        assert_eq!(device.queued_read().declared_len(), 1);
        assert_eq!(device.queued_read().started_at(), 500);
        assert_eq!(device.interface_mut().starts, 1);
    }

    #[test]
    fn completion_checks_slot_and_buffer() {
        let clock = ManualClock::new(0);
        let mut device = queued_device(ScriptedBus::ready(AXES_256_512_768), &clock);

        let mut buf = [0u8; 7];
        assert_eq!(device.complete_queued_read(&mut buf), Err(Error::NotQueued));
        assert_eq!(device.interface_mut().drains, 0);

        device.start_queued_read(REG_HXL, 7).unwrap();
        assert_eq!(device.complete_queued_read(&mut buf[..3]), Err(Error::BufferLength));
        assert!(device.queued_read().is_waiting());

        clock.advance(CONVERSION_BUDGET_US);
        assert_eq!(device.complete_queued_read(&mut buf), Ok(7));
        assert_eq!(buf, AXES_256_512_768);
    }

    #[test]
    fn read_dispatches_on_configured_mode() {
        let clock = ManualClock::new(0);
        let mut sync = Ak8963::new(ScriptedBus::ready(AXES_256_512_768), &clock, Config::default());
        assert!(sync.read().is_some());

        let mut queued = queued_device(ScriptedBus::ready(AXES_256_512_768), &clock);
        assert_eq!(queued.read(), None);
        assert_eq!(queued.read_state(), ReadState::WaitingForStatus);
    }
}
