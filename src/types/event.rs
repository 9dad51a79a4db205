//! Cached raw samples and emitted sensor events

use super::{SensorChannel, SensorHandle};

/// Most recent raw sample decoded for one channel
///
/// Exactly one instance is cached per channel and overwritten on every new
/// packet; samples are never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// Raw axis values in sensor LSB units
    pub axes: [i32; 3],
    /// Monotonic timestamp in nanoseconds
    pub timestamp_ns: i64,
}

/// Accuracy status attached to emitted samples
///
/// No calibration or bias estimation happens in this crate, so every sample
/// is reported unreliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Unreliable,
}

/// One event delivered to the caller per output slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    /// Body-frame, scaled sample for one channel
    Sample {
        channel: SensorChannel,
        /// Physical units: rad/s (gyro), m/s² (accel), µT (magnetometer)
        values: [f32; 3],
        timestamp_ns: i64,
        status: SampleStatus,
    },
    /// A requested flush has drained through the device FIFO
    FlushComplete { handle: SensorHandle },
}

impl SensorEvent {
    /// Channel handle this event belongs to
    pub fn handle(&self) -> SensorHandle {
        match self {
            SensorEvent::Sample { channel, .. } => channel.handle(),
            SensorEvent::FlushComplete { handle } => *handle,
        }
    }
}
