//! Configuration primitives for the AK8963 driver.

use crate::params::{CalibrationPolicy, OutputResolution, ReadMode};

/// User-facing configuration for the AK8963 sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Per-tick sampling protocol.
    pub read_mode: ReadMode,
    /// Behaviour when a calibration step fails.
    pub calibration: CalibrationPolicy,
    /// Output bit setting written with every `CNTL1` mode change.
    pub resolution: OutputResolution,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the sampling protocol.
    pub fn read_mode(mut self, read_mode: ReadMode) -> Self {
        self.config.read_mode = read_mode;
        self
    }

    /// Overrides the calibration failure policy.
    pub fn calibration(mut self, calibration: CalibrationPolicy) -> Self {
        self.config.calibration = calibration;
        self
    }

    /// Overrides the output bit setting.
    pub fn resolution(mut self, resolution: OutputResolution) -> Self {
        self.config.resolution = resolution;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_mode: ReadMode::Synchronous,
            calibration: CalibrationPolicy::BestEffort,
            resolution: OutputResolution::Bits14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::new()
            .read_mode(ReadMode::Queued)
            .calibration(CalibrationPolicy::Propagate)
            .build();

        assert_eq!(config.read_mode, ReadMode::Queued);
        assert_eq!(config.calibration, CalibrationPolicy::Propagate);
        assert_eq!(config.resolution, OutputResolution::Bits14);
    }
}
