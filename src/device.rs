//! High-level AK8963 device driver implementation.

use crate::calibration::AxisGain;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::interface::Ak8963Interface;
use crate::log::{debug, warning};
use crate::params::{CalibrationPolicy, MeasurementMode};
use crate::queue::{MicrosClock, QueuedRead};
use crate::reader::{ReadState, ReaderStats};
use crate::registers::{
    Control1,
    Register,
    Status1,
    Status2,
    EXPECTED_WIA,
    FUSE_ROM_LEN,
    REG_ASAX,
    REG_CNTL2,
    REG_WIA,
    SOFT_RESET_COMMAND,
};
use crate::self_test::{run_self_test, SelfTestReport};
use embedded_hal::delay::DelayNs;

// Settle time after powering down, before fuse ROM access (milliseconds).
const POWER_DOWN_TO_FUSE_ROM_DELAY_MS: u32 = 20;
// Settle time after every other mode change or fuse ROM read (milliseconds).
const MODE_SETTLE_DELAY_MS: u32 = 10;

/// Driver for one AK8963 behind an already-bound transport.
pub struct Ak8963<IFACE, CLK> {
    pub(crate) interface: IFACE,
    pub(crate) clock: CLK,
    pub(crate) config: Config,
    pub(crate) gain: AxisGain,
    pub(crate) fuse_rom: Option<[u8; FUSE_ROM_LEN]>,
    pub(crate) queued: QueuedRead,
    pub(crate) state: ReadState,
    pub(crate) stats: ReaderStats,
}

impl<IFACE, CLK> Ak8963<IFACE, CLK> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance from the provided bus interface and clock.
    pub fn new(interface: IFACE, clock: CLK, config: Config) -> Self {
        Self {
            interface,
            clock,
            config,
            gain: AxisGain::UNITY,
            fuse_rom: None,
            queued: QueuedRead::new(),
            state: ReadState::CheckStatus,
            stats: ReaderStats::default(),
        }
    }

    /// Replaces the per-axis gain, e.g. with one computed on a previous boot.
    pub fn with_gain(mut self, gain: AxisGain) -> Self {
        self.gain = gain;
        self
    }

    /// Consumes the driver and returns the owned interface and clock.
    pub fn release(self) -> (IFACE, CLK) {
        (self.interface, self.clock)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Per-axis gain applied to every sample.
    pub fn gain(&self) -> AxisGain {
        self.gain
    }

    /// Raw `ASAX..=ASAZ` bytes, once calibration has read them.
    pub fn fuse_rom(&self) -> Option<[u8; FUSE_ROM_LEN]> {
        self.fuse_rom
    }

    /// Current state of the queued reader.
    pub fn read_state(&self) -> ReadState {
        self.state
    }

    /// Liveness counters maintained by the readers.
    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    /// The queued transaction slot.
    pub fn queued_read(&self) -> &QueuedRead {
        &self.queued
    }
}

impl<IFACE, CLK, CommE> Ak8963<IFACE, CLK>
where
    IFACE: Ak8963Interface<Error = CommE>,
    CLK: MicrosClock,
{
    // ==================================================================
    // == Initialization & Calibration ==================================
    // ==================================================================
    /// Reads the fuse ROM, derives the axis gain, and arms the first conversion.
    ///
    /// The steps and their settle delays are fixed: power-down (20 ms),
    /// fuse ROM mode (10 ms), read `ASAX..=ASAZ` (10 ms), power-down (10 ms),
    /// read `ST1`/`ST2` to drop stale flags, then arm single measurement or
    /// continuous mode 1 depending on [`Config::read_mode`]. How a failing
    /// step is handled follows [`Config::calibration`].
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        let result = self.set_mode(MeasurementMode::PowerDown);
        self.calibration_step(result)?;
        delay.delay_ms(POWER_DOWN_TO_FUSE_ROM_DELAY_MS);

        let result = self.set_mode(MeasurementMode::FuseRom);
        self.calibration_step(result)?;
        delay.delay_ms(MODE_SETTLE_DELAY_MS);

        let mut raw = [0u8; FUSE_ROM_LEN];
        let result = self
            .interface
            .read_many(REG_ASAX, &mut raw)
            .map_err(Error::from);
        if self.calibration_step(result)? {
            self.gain = AxisGain::from_fuse_rom(raw);
            self.fuse_rom = Some(raw);
        } else {
            self.gain = AxisGain::UNITY;
            self.fuse_rom = None;
        }
        delay.delay_ms(MODE_SETTLE_DELAY_MS);

        let result = self.set_mode(MeasurementMode::PowerDown);
        self.calibration_step(result)?;
        delay.delay_ms(MODE_SETTLE_DELAY_MS);

        let result = self.read_typed::<Status1>().map(|_| ());
        self.calibration_step(result)?;
        let result = self.read_typed::<Status2>().map(|_| ());
        self.calibration_step(result)?;

        self.queued = QueuedRead::new();
        self.state = ReadState::CheckStatus;

        let result = self.set_mode(self.config.read_mode.arming_mode());
        self.calibration_step(result)?;

        debug!("ak8963 calibrated, fuse rom read: {}", self.fuse_rom.is_some());
        Ok(())
    }

    /// Applies [`Config::calibration`] to the outcome of one step.
    ///
    /// Returns whether the step succeeded.
    fn calibration_step(&self, result: Result<(), CommE>) -> Result<bool, CommE> {
        match result {
            Ok(()) => Ok(true),
            Err(err) => match self.config.calibration {
                CalibrationPolicy::Propagate => Err(err),
                CalibrationPolicy::BestEffort => {
                    warning!("ak8963 calibration step failed, continuing");
                    Ok(false)
                }
            },
        }
    }

    /// Writes `CNTL1` with `mode` and the configured output resolution.
    pub fn set_mode(&mut self, mode: MeasurementMode) -> Result<(), CommE> {
        let value = Control1::encode(mode, self.config.resolution);
        self.interface
            .write_register(Control1::ADDRESS, value)
            .map_err(Error::from)
    }

    /// Issues a soft reset through `CNTL2`.
    pub fn reset(&mut self) -> Result<(), CommE> {
        self.interface
            .write_register(REG_CNTL2, SOFT_RESET_COMMAND)
            .map_err(Error::from)
    }

    // ==================================================================
    // == Identification & Status =======================================
    // ==================================================================
    /// Verifies `WIA` and returns the `INFO` byte that follows it.
    pub fn check_ids(&mut self) -> Result<u8, CommE> {
        let mut ids = [0u8; 2];
        self.interface
            .read_many(REG_WIA, &mut ids)
            .map_err(Error::from)?;

        if ids[0] != EXPECTED_WIA {
            return Err(Error::DeviceIdMismatch);
        }

        Ok(ids[1])
    }

    /// Returns `true` when `WIA` holds the AK8963 identity byte.
    pub fn check_identity(&mut self) -> Result<bool, CommE> {
        match self.check_ids() {
            Ok(_) => Ok(true),
            Err(Error::DeviceIdMismatch) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Reads one typed register.
    pub(crate) fn read_typed<R>(&mut self) -> Result<R, CommE>
    where
        R: Register<Raw = u8> + From<u8>,
    {
        let raw = self
            .interface
            .read_register(R::ADDRESS)
            .map_err(Error::from)?;
        Ok(R::from(raw))
    }

    // ==================================================================
    // == Self-Test ======================================================
    // ==================================================================
    /// Executes the datasheet self-test routine.
    ///
    /// Leaves the sensor powered down; call [`init`](Self::init) afterwards
    /// to resume sampling.
    pub fn run_self_test(&mut self, delay: &mut impl DelayNs) -> Result<SelfTestReport, CommE> {
        run_self_test(self, delay)
    }
}
