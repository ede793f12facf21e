//! Pass-through interface: the AK8963 behind the auxiliary I2C master of an
//! MPU9250/MPU6500 reached over SPI.
//!
//! Every magnetometer transaction is relayed through I2C slave channel 0 of
//! the MPU. Reads land in `EXT_SENS_DATA_00..` once the master has clocked
//! them in from the magnetometer, which is why a synchronous read has to wait
//! before fetching the result.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Operation, SpiDevice};

use super::{Ak8963Interface, QueuedInterface};
use crate::registers::I2C_ADDRESS;

/// MPU register `I2C_MST_CTRL`.
pub const MPU_REG_I2C_MST_CTRL: u8 = 0x24;
/// MPU register `I2C_SLV0_ADDR`.
pub const MPU_REG_I2C_SLV0_ADDR: u8 = 0x25;
/// MPU register `I2C_SLV0_REG`.
pub const MPU_REG_I2C_SLV0_REG: u8 = 0x26;
/// MPU register `I2C_SLV0_CTRL`.
pub const MPU_REG_I2C_SLV0_CTRL: u8 = 0x27;
/// MPU register `INT_PIN_CFG`.
pub const MPU_REG_INT_PIN_CFG: u8 = 0x37;
/// MPU register `EXT_SENS_DATA_00`.
pub const MPU_REG_EXT_SENS_DATA_00: u8 = 0x49;
/// MPU register `I2C_SLV0_DO`.
pub const MPU_REG_I2C_SLV0_DO: u8 = 0x63;
/// MPU register `USER_CTRL`.
pub const MPU_REG_USER_CTRL: u8 = 0x6A;

/// `INT_PIN_CFG`: clear interrupt status on any read.
pub const INT_ANYRD_2CLEAR: u8 = 0x10;
/// `I2C_MST_CTRL`: multi-master, 400 kHz master clock.
pub const I2C_MST_MULTI_400KHZ: u8 = 0x0D;
/// `USER_CTRL`: I2C master enabled, primary interface SPI only.
pub const USER_CTRL_MST_EN_SPI_ONLY: u8 = 0x30;

/// Slave address flag selecting a read transfer.
const SLV_READ_FLAG: u8 = 0x80;
/// `I2C_SLV0_CTRL` enable bit.
const SLV_ENABLE: u8 = 0x80;
/// `I2C_SLV0_CTRL` length field mask.
const SLV_LEN_MASK: u8 = 0x0F;

/// SPI register address flag selecting a read.
const SPI_DIR_READ: u8 = 0x80;

/// Delay after each master configuration write.
const SETUP_SETTLE_MS: u32 = 10;
/// Time the master needs to relay a read into `EXT_SENS_DATA`.
const RELAY_WAIT_MS: u32 = 8;

/// Longest transfer a single slave channel can relay.
pub const MAX_RELAY_LEN: usize = SLV_LEN_MASK as usize;

/// Errors raised by the pass-through transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PassThroughError<E> {
    /// SPI error talking to the MPU.
    Spi(E),
    /// Read length outside `1..=MAX_RELAY_LEN`.
    Length,
}

impl<E> From<E> for PassThroughError<E> {
    fn from(err: E) -> Self {
        Self::Spi(err)
    }
}

fn relay_len<E>(len: usize) -> core::result::Result<u8, PassThroughError<E>> {
    if (1..=MAX_RELAY_LEN).contains(&len) {
        Ok(len as u8)
    } else {
        Err(PassThroughError::Length)
    }
}

/// SPI-based interface relaying through the MPU's auxiliary I2C master.
pub struct PassThroughInterface<SPI, D> {
    spi: SPI,
    delay: D,
    address: u8,
}

impl<SPI, D> PassThroughInterface<SPI, D> {
    /// Creates a new interface from the MPU SPI device and a delay source.
    pub const fn new(spi: SPI, delay: D) -> Self {
        Self {
            spi,
            delay,
            address: I2C_ADDRESS,
        }
    }

    /// Consumes the interface and returns the owned SPI device and delay.
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }
}

impl<SPI, D> PassThroughInterface<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    fn mpu_write(&mut self, register: u8, value: u8) -> core::result::Result<(), SPI::Error> {
        self.spi.write(&[register & !SPI_DIR_READ, value])
    }

    fn mpu_read(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<(), SPI::Error> {
        let command = [register | SPI_DIR_READ];
        let mut operations = [Operation::Write(&command), Operation::Read(buf)];
        self.spi.transaction(&mut operations)
    }

    fn program_slave_read(&mut self, register: u8, len: u8) -> core::result::Result<(), SPI::Error> {
        self.mpu_write(MPU_REG_I2C_SLV0_ADDR, self.address | SLV_READ_FLAG)?;
        self.mpu_write(MPU_REG_I2C_SLV0_REG, register)?;
        self.mpu_write(MPU_REG_I2C_SLV0_CTRL, len | SLV_ENABLE)
    }
}

impl<SPI, D> Ak8963Interface for PassThroughInterface<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    type Error = PassThroughError<SPI::Error>;

    fn setup(&mut self, delay: &mut impl DelayNs) -> core::result::Result<(), Self::Error> {
        self.mpu_write(MPU_REG_INT_PIN_CFG, INT_ANYRD_2CLEAR)?;
        delay.delay_ms(SETUP_SETTLE_MS);

        self.mpu_write(MPU_REG_I2C_MST_CTRL, I2C_MST_MULTI_400KHZ)?;
        delay.delay_ms(SETUP_SETTLE_MS);

        self.mpu_write(MPU_REG_USER_CTRL, USER_CTRL_MST_EN_SPI_ONLY)?;
        delay.delay_ms(SETUP_SETTLE_MS);

        Ok(())
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        let len = relay_len::<SPI::Error>(buf.len())?;
        self.program_slave_read(register, len)?;
        self.delay.delay_ms(RELAY_WAIT_MS);

        // EXT_SENS_DATA is shared with interrupt-driven readers.
        critical_section::with(|_| self.mpu_read(MPU_REG_EXT_SENS_DATA_00, buf))?;
        Ok(())
    }

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        self.mpu_write(MPU_REG_I2C_SLV0_ADDR, self.address)?;
        self.mpu_write(MPU_REG_I2C_SLV0_REG, register)?;
        self.mpu_write(MPU_REG_I2C_SLV0_DO, value)?;
        self.mpu_write(MPU_REG_I2C_SLV0_CTRL, SLV_ENABLE | 1)?;
        Ok(())
    }
}

impl<SPI, D> QueuedInterface for PassThroughInterface<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    fn start_read(&mut self, register: u8, len: u8) -> core::result::Result<(), Self::Error> {
        let len = relay_len::<SPI::Error>(usize::from(len))?;
        self.program_slave_read(register, len)?;
        Ok(())
    }

    fn drain(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        relay_len::<SPI::Error>(buf.len())?;
        self.mpu_read(MPU_REG_EXT_SENS_DATA_00, buf)?;
        Ok(())
    }
}
