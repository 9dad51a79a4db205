//! Mock control plane for testing

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::types::{MountingMatrix, SensorChannel, SensorHandle};

use super::{CompassSensor, DeviceControl};

/// One recorded hardware directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Rate(SensorChannel, i64),
    Enable(SensorChannel, bool),
    FullScale(SensorChannel, u32),
    BatchTimeout(i64),
    Flush(SensorHandle),
}

struct MockControlInner {
    directives: Vec<Directive>,
    matrices: [MountingMatrix; SensorChannel::COUNT],
    detected: bool,
}

/// In-memory [`DeviceControl`] that records every directive
///
/// Clones share state, so the test keeps one handle while the driver
/// owns another.
#[derive(Clone)]
pub struct MockControl {
    inner: Arc<Mutex<MockControlInner>>,
}

impl MockControl {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockControlInner {
                directives: Vec::new(),
                matrices: [MountingMatrix::IDENTITY; SensorChannel::COUNT],
                detected: true,
            })),
        }
    }

    /// A control plane whose probe fails, simulating absent hardware
    pub fn undetected() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().detected = false;
        mock
    }

    /// Set the mounting matrix reported for a channel
    pub fn set_mounting_matrix(&self, channel: SensorChannel, matrix: MountingMatrix) {
        self.inner.lock().unwrap().matrices[channel.index()] = matrix;
    }

    /// All directives recorded so far, in issue order
    pub fn directives(&self) -> Vec<Directive> {
        self.inner.lock().unwrap().directives.clone()
    }

    /// Forget recorded directives (typically after driver construction)
    pub fn clear_directives(&self) {
        self.inner.lock().unwrap().directives.clear();
    }

    fn record(&self, directive: Directive) {
        self.inner.lock().unwrap().directives.push(directive);
    }
}

impl Default for MockControl {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceControl for MockControl {
    fn probe(&mut self) -> Result<()> {
        if self.inner.lock().unwrap().detected {
            Ok(())
        } else {
            Err(Error::NoDeviceDetected)
        }
    }

    fn write_rate(&mut self, channel: SensorChannel, period_ns: i64) -> Result<()> {
        self.record(Directive::Rate(channel, period_ns));
        Ok(())
    }

    fn write_enable(&mut self, channel: SensorChannel, on: bool) -> Result<()> {
        self.record(Directive::Enable(channel, on));
        Ok(())
    }

    fn write_full_scale(&mut self, channel: SensorChannel, code: u32) -> Result<()> {
        self.record(Directive::FullScale(channel, code));
        Ok(())
    }

    fn write_batch_timeout(&mut self, timeout_ms: i64) -> Result<()> {
        self.record(Directive::BatchTimeout(timeout_ms));
        Ok(())
    }

    fn write_flush(&mut self, handle: SensorHandle) -> Result<()> {
        self.record(Directive::Flush(handle));
        Ok(())
    }

    fn read_mounting_matrix(&mut self, channel: SensorChannel) -> Result<MountingMatrix> {
        Ok(self.inner.lock().unwrap().matrices[channel.index()])
    }
}

struct MockCompassInner {
    enabled: bool,
    period_ns: i64,
    samples: VecDeque<([i32; 3], i64)>,
    matrix: MountingMatrix,
}

/// In-memory [`CompassSensor`] fed by the test
#[derive(Clone)]
pub struct MockCompass {
    inner: Arc<Mutex<MockCompassInner>>,
}

impl MockCompass {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockCompassInner {
                enabled: false,
                period_ns: 0,
                samples: VecDeque::new(),
                matrix: MountingMatrix::IDENTITY,
            })),
        }
    }

    /// Queue a raw sample to be returned by the next `read_sample`
    pub fn inject_sample(&self, axes: [i32; 3], timestamp_ns: i64) {
        self.inner.lock().unwrap().samples.push_back((axes, timestamp_ns));
    }

    pub fn set_mounting_matrix(&self, matrix: MountingMatrix) {
        self.inner.lock().unwrap().matrix = matrix;
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().unwrap().enabled
    }

    pub fn period_ns(&self) -> i64 {
        self.inner.lock().unwrap().period_ns
    }
}

impl Default for MockCompass {
    fn default() -> Self {
        Self::new()
    }
}

impl CompassSensor for MockCompass {
    fn enable(&mut self, on: bool) -> Result<()> {
        self.inner.lock().unwrap().enabled = on;
        Ok(())
    }

    fn set_rate(&mut self, period_ns: i64) -> Result<()> {
        self.inner.lock().unwrap().period_ns = period_ns;
        Ok(())
    }

    fn read_sample(&mut self) -> Result<Option<([i32; 3], i64)>> {
        Ok(self.inner.lock().unwrap().samples.pop_front())
    }

    fn mounting_matrix(&self) -> MountingMatrix {
        self.inner.lock().unwrap().matrix
    }
}
