//! Strongly typed parameter enumerations for the AK8963 driver.
//!
//! These enums map directly to datasheet field encodings and are used across
//! [`Config`](crate::config::Config) and the high-level driver APIs. Prefer these
//! types over raw integers to keep configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use ak8963::params::{MeasurementMode, OutputResolution, ReadMode};
//!
//! let mode = MeasurementMode::Continuous1;
//! let bits = OutputResolution::Bits14;
//! let reader = ReadMode::Queued;
//! let _ = (mode, bits, reader);
//! ```

use modular_bitfield::prelude::Specifier;

/// Operating modes encoded in `CNTL1.MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 4]
pub enum MeasurementMode {
    /// Power-down mode.
    PowerDown = 0x0,
    /// Single measurement; returns to power-down after one conversion.
    Single = 0x1,
    /// Continuous measurement mode 1 (8 Hz).
    Continuous1 = 0x2,
    /// External trigger measurement mode.
    ExternalTrigger = 0x4,
    /// Continuous measurement mode 2 (100 Hz).
    Continuous2 = 0x6,
    /// Self-test mode.
    SelfTest = 0x8,
    /// Fuse ROM access mode.
    FuseRom = 0xF,
}

/// Output bit setting encoded in `CNTL1.BIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 1]
pub enum OutputResolution {
    /// 14-bit output, 0.6 µT/LSB.
    Bits14 = 0,
    /// 16-bit output, 0.15 µT/LSB.
    Bits16 = 1,
}

impl OutputResolution {
    /// Multiplier applied to the 14-bit self-test limits.
    pub const fn self_test_scale(self) -> i32 {
        match self {
            Self::Bits14 => 1,
            Self::Bits16 => 4,
        }
    }
}

/// Sampling protocol used by the per-tick reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadMode {
    /// Status and data fetched back-to-back each tick, re-armed in single mode.
    Synchronous,
    /// Status and data fetched through time-gated queued transactions in
    /// continuous mode 1.
    Queued,
}

impl ReadMode {
    /// Mode written to `CNTL1` when arming the first conversion.
    pub const fn arming_mode(self) -> MeasurementMode {
        match self {
            Self::Synchronous => MeasurementMode::Single,
            Self::Queued => MeasurementMode::Continuous1,
        }
    }
}

/// What [`init`](crate::Ak8963::init) does when a calibration step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationPolicy {
    /// Abort the sequence and return the first bus error.
    Propagate,
    /// Log the failure, finish the sequence, and fall back to unity gain when
    /// the fuse ROM could not be read.
    BestEffort,
}
