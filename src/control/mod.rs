//! Control-plane abstraction for the motion unit and companion compass

use std::os::fd::RawFd;

use crate::error::Result;
use crate::types::{MountingMatrix, SensorChannel, SensorHandle};

mod mock;

pub use mock::{Directive, MockCompass, MockControl};

/// Control interface of the motion unit
///
/// One method per hardware directive. The driver coordinates state above
/// this trait and issues each directive at most once per transition, so
/// implementations do not need their own caching.
pub trait DeviceControl: Send {
    /// Verify the device is present and responsive
    fn probe(&mut self) -> Result<()>;

    /// Program the sampling period for a channel
    fn write_rate(&mut self, channel: SensorChannel, period_ns: i64) -> Result<()>;

    /// Turn a channel's data path on or off
    fn write_enable(&mut self, channel: SensorChannel, on: bool) -> Result<()>;

    /// Program a channel's full-scale range register code
    fn write_full_scale(&mut self, channel: SensorChannel, code: u32) -> Result<()>;

    /// Program the FIFO batch timeout in milliseconds (0 disables batching)
    fn write_batch_timeout(&mut self, timeout_ms: i64) -> Result<()>;

    /// Ask the device to drain its FIFO and emit a marker for `handle`
    fn write_flush(&mut self, handle: SensorHandle) -> Result<()>;

    /// Read the factory mounting matrix for a channel
    fn read_mounting_matrix(&mut self, channel: SensorChannel) -> Result<MountingMatrix>;
}

/// Companion magnetometer, polled out-of-band from the main byte stream
pub trait CompassSensor: Send {
    fn enable(&mut self, on: bool) -> Result<()>;

    fn set_rate(&mut self, period_ns: i64) -> Result<()>;

    /// Read the latest raw sample and its monotonic timestamp
    ///
    /// Returns `Ok(None)` when no new sample is ready.
    fn read_sample(&mut self) -> Result<Option<([i32; 3], i64)>>;

    /// Mounting matrix rotating compass axes into the body frame
    fn mounting_matrix(&self) -> MountingMatrix;

    /// File descriptor to poll for compass data readiness, if any
    fn readiness_fd(&self) -> Option<RawFd> {
        None
    }
}
