#![cfg_attr(not(test), no_std)]

mod error;

pub mod calibration;
pub mod config;
pub mod detect;
pub mod device;
pub mod interface;
mod log;
pub mod magnetometer;
pub mod params;
pub mod queue;
pub mod reader;
pub mod registers;

pub use crate::calibration::AxisGain;
pub use crate::config::Config;
pub use crate::detect::Detector;
pub use crate::device::Ak8963;
pub use crate::error::{Error, Result};
pub use crate::magnetometer::Magnetometer;
pub use crate::queue::MicrosClock;
pub use crate::reader::ReadState;
