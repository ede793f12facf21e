//! Register map definitions for the AK8963 magnetometer.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::{MeasurementMode, OutputResolution};

/// Fixed I2C address of the AK8963 (CAD1 = CAD0 = 0).
pub const I2C_ADDRESS: u8 = 0x0C;

/// Register address of `WIA` (device identity).
pub const REG_WIA: u8 = 0x00;
/// Register address of `INFO`.
pub const REG_INFO: u8 = 0x01;
/// Register address of `ST1`.
pub const REG_ST1: u8 = 0x02;
/// Register address of `HXL`, first of the six data bytes.
pub const REG_HXL: u8 = 0x03;
/// Register address of `ST2`, trailing byte of the 7-byte data burst.
pub const REG_ST2: u8 = 0x09;
/// Register address of `CNTL1`.
pub const REG_CNTL1: u8 = 0x0A;
/// Register address of `CNTL2`.
pub const REG_CNTL2: u8 = 0x0B;
/// Register address of `ASTC` (self-test control).
pub const REG_ASTC: u8 = 0x0C;
/// Register address of `I2CDIS`.
pub const REG_I2CDIS: u8 = 0x0F;
/// Register address of `ASAX`, first fuse ROM sensitivity byte.
pub const REG_ASAX: u8 = 0x10;
/// Register address of `ASAY`.
pub const REG_ASAY: u8 = 0x11;
/// Register address of `ASAZ`.
pub const REG_ASAZ: u8 = 0x12;

/// Value reported by `WIA`.
pub const EXPECTED_WIA: u8 = 0x48;
/// Soft reset command written to `CNTL2`.
pub const SOFT_RESET_COMMAND: u8 = 0x01;

/// Length of the `HXL..=ST2` burst.
pub const DATA_BURST_LEN: usize = 7;
/// Number of fuse ROM sensitivity bytes.
pub const FUSE_ROM_LEN: usize = 3;

/// A typed register value and where it lives.
pub trait Register {
    /// Raw storage backing the register payload.
    type Raw: Copy;
    /// Register address as documented in the datasheet.
    const ADDRESS: u8;
}

/// Bitfield representation of the `ST1` register (address `0x02`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status1 {
    // Data ready (bit 0).
    pub data_ready: bool,
    // Data overrun (bit 1).
    pub data_overrun: bool,
    #[skip]
    __: B6,
}

impl Status1 {
    /// A measurement is available to read.
    pub fn has_data(&self) -> bool {
        self.data_ready() || self.data_overrun()
    }
}

impl From<u8> for Status1 {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Status1> for u8 {
    fn from(value: Status1) -> Self {
        value.into_bytes()[0]
    }
}

/// Bitfield representation of the `ST2` register (address `0x09`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status2 {
    #[skip]
    __: B1,
    // Data error (bit 1).
    pub data_error: bool,
    // Sensor overflow (bit 2).
    pub sensor_overflow: bool,
    // Magnetic sensor overflow, HOFL (bit 3).
    pub magnetic_overflow: bool,
    // Output bit setting mirror, BITM (bit 4).
    pub output_16bit: bool,
    #[skip]
    __: B3,
}

impl Status2 {
    /// The burst this byte terminated holds a usable measurement.
    pub fn is_valid(&self) -> bool {
        !(self.data_error() || self.sensor_overflow() || self.magnetic_overflow())
    }
}

impl From<u8> for Status2 {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Status2> for u8 {
    fn from(value: Status2) -> Self {
        value.into_bytes()[0]
    }
}

/// Bitfield representation of the `CNTL1` register (address `0x0A`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control1 {
    // Operating mode (bits 3:0).
    pub mode: MeasurementMode,
    // Output bit setting (bit 4).
    pub output: OutputResolution,
    #[skip]
    __: B3,
}

impl Control1 {
    /// Encodes a mode/resolution pair.
    pub fn encode(mode: MeasurementMode, output: OutputResolution) -> u8 {
        u8::from(Self::new().with_mode(mode).with_output(output))
    }
}

impl From<u8> for Control1 {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Control1> for u8 {
    fn from(value: Control1) -> Self {
        value.into_bytes()[0]
    }
}

/// Bitfield representation of the `ASTC` register (address `0x0C`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTestControl {
    #[skip]
    __: B6,
    // Generate magnetic field for self-test (bit 6).
    pub self_test: bool,
    #[skip]
    __: B1,
}

impl From<u8> for SelfTestControl {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<SelfTestControl> for u8 {
    fn from(value: SelfTestControl) -> Self {
        value.into_bytes()[0]
    }
}

impl Register for Status1 {
    type Raw = u8;
    const ADDRESS: u8 = REG_ST1;
}

impl Register for Status2 {
    type Raw = u8;
    const ADDRESS: u8 = REG_ST2;
}

impl Register for Control1 {
    type Raw = u8;
    const ADDRESS: u8 = REG_CNTL1;
}

impl Register for SelfTestControl {
    type Raw = u8;
    const ADDRESS: u8 = REG_ASTC;
}
