//! Driver configuration loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Gyroscope full-scale range selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GyroConfig {
    /// Full-scale range in degrees per second
    pub fsr_dps: f32,
    /// Register code programmed into the device for this range
    pub fsr_code: u32,
}

impl Default for GyroConfig {
    fn default() -> Self {
        Self { fsr_dps: 2000.0, fsr_code: 3 }
    }
}

/// Accelerometer full-scale range selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccelConfig {
    /// Full-scale range in g
    pub fsr_g: f32,
    /// Register code programmed into the device for this range
    pub fsr_code: u32,
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self { fsr_g: 8.0, fsr_code: 2 }
    }
}

/// Stream and output tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Use the 19-bit FIFO format instead of 16-bit
    pub high_res_fifo: bool,
    /// Output slots held back per pass for companion compass events
    pub compass_event_reserve: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { high_res_fifo: false, compass_event_reserve: 2 }
    }
}

/// Top-level driver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gyro: GyroConfig,
    pub accel: AccelConfig,
    pub stream: StreamConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Write configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Raw-to-physical scale factor for one LSB at the configured ranges
    ///
    /// Gyro converts to rad/s, accel to m/s². The divisor depends on the
    /// FIFO format: 16-bit frames span ±32768 LSB, high resolution ±524288.
    pub fn max_lsb(&self) -> f32 {
        if self.stream.high_res_fifo { 524_288.0 } else { 32_768.0 }
    }

    pub fn gyro_scale(&self) -> f32 {
        self.gyro.fsr_dps / self.max_lsb() * (core::f32::consts::PI / 180.0)
    }

    pub fn accel_scale(&self) -> f32 {
        self.accel.fsr_g * 9.80665 / self.max_lsb()
    }
}
