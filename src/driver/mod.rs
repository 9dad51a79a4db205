//! Driver facade coordinating stream decoding and device control
//!
//! [`SpandaIO`] owns the sample stream, the control plane, and the optional
//! companion compass, and keeps all per-channel state (enable bits, rates,
//! cached samples, batching latencies, the flush queue). The implementation
//! is split across focused files:
//!
//! - `channels.rs`: enable and rate coordination
//! - `batching.rs`: batch timeout and flush coordination
//! - `assembly.rs`: stream polling and event assembly

use std::collections::VecDeque;
use std::os::fd::RawFd;

use log::{error, warn};
use parking_lot::Mutex;

use crate::clock::{self, ClockFn};
use crate::config::Config;
use crate::control::{CompassSensor, DeviceControl};
use crate::protocol::FrameDecoder;
use crate::transport::DeviceStream;
use crate::types::{ChannelMask, MountingMatrix, RawSample, SensorChannel, SensorHandle};

mod assembly;
mod batching;
mod channels;

pub(crate) const NS_PER_SECOND: i64 = 1_000_000_000;

/// Fastest supported gyro/accel sampling period (200 Hz)
pub(crate) const MIN_PERIOD_NS: i64 = 5_000_000;
/// Slowest supported sampling period (4 Hz)
pub(crate) const MAX_PERIOD_NS: i64 = 250_000_000;
/// Fastest supported compass sampling period (50 Hz)
pub(crate) const COMPASS_MIN_PERIOD_NS: i64 = 20_000_000;

/// Batch latency meaning "deliver immediately", restored when a channel
/// leaves batch mode so it never shortens the effective timeout
pub(crate) const BATCH_LATENCY_SENTINEL_NS: i64 = 100_000_000_000;

/// Compass scale: the companion part reports 1/2^16 µT per LSB
const COMPASS_SCALE: f32 = 1.0 / 65_536.0;

/// Motion unit driver front-end
///
/// Decodes the multiplexed sample stream, rotates raw samples into the body
/// frame, scales them to physical units, and coordinates enable, rate,
/// batching, and flush requests. Single-threaded and poll-driven: the caller
/// polls [`Self::stream_fd`] / [`Self::compass_fd`] and invokes
/// [`Self::poll_events`] / [`Self::poll_compass_events`] when data is ready.
pub struct SpandaIO<S: DeviceStream, C: DeviceControl> {
    stream: S,
    control: C,
    compass: Option<Box<dyn CompassSensor>>,
    decoder: FrameDecoder,
    detected: bool,
    clock: ClockFn,

    enabled: ChannelMask,
    enabled_time_ns: [i64; SensorChannel::COUNT],
    periods_ns: [i64; SensorChannel::COUNT],
    cached: [RawSample; SensorChannel::COUNT],
    prev_emitted_ns: [i64; SensorChannel::COUNT],
    matrices: [MountingMatrix; SensorChannel::COUNT],
    scales: [f32; SensorChannel::COUNT],

    batch_active: ChannelMask,
    batch_latency_ns: [i64; SensorChannel::COUNT],
    last_pushed_batch_ms: i64,

    // Pushed by the decode path, popped by the emission path
    flush_queue: Mutex<VecDeque<SensorHandle>>,
    compass_reserve: usize,
}

impl<S: DeviceStream, C: DeviceControl> SpandaIO<S, C> {
    /// Create the driver and bring the device into a known idle state
    ///
    /// Probes the device, loads mounting matrices, programs the configured
    /// full-scale ranges, disables every channel, and zeroes the batch
    /// timeout. A failed probe leaves the instance constructed but
    /// undetected; every subsequent channel operation fails fast.
    pub fn new(
        stream: S,
        control: C,
        compass: Option<Box<dyn CompassSensor>>,
        config: Config,
    ) -> Self {
        Self::with_clock(stream, control, compass, config, clock::monotonic_ns)
    }

    /// Like [`Self::new`] with an injected monotonic clock
    pub fn with_clock(
        stream: S,
        mut control: C,
        mut compass: Option<Box<dyn CompassSensor>>,
        config: Config,
        clock: ClockFn,
    ) -> Self {
        let mut detected = true;
        if let Err(err) = control.probe() {
            error!("Motion device probe failed: {err}");
            detected = false;
        }

        let mut matrices = [MountingMatrix::IDENTITY; SensorChannel::COUNT];
        if detected {
            for channel in [SensorChannel::Gyroscope, SensorChannel::Accelerometer] {
                match control.read_mounting_matrix(channel) {
                    Ok(matrix) => matrices[channel.index()] = matrix,
                    Err(err) => warn!("Failed to read {} mounting matrix: {err}", channel.name()),
                }
                if let Err(err) = control.write_enable(channel, false) {
                    warn!("Failed to disable {} at startup: {err}", channel.name());
                }
            }
            if let Err(err) = control.write_full_scale(SensorChannel::Gyroscope, config.gyro.fsr_code)
            {
                warn!("Failed to program gyroscope full-scale range: {err}");
            }
            if let Err(err) =
                control.write_full_scale(SensorChannel::Accelerometer, config.accel.fsr_code)
            {
                warn!("Failed to program accelerometer full-scale range: {err}");
            }
            if let Err(err) = control.write_batch_timeout(0) {
                warn!("Failed to zero batch timeout at startup: {err}");
            }
        }
        if let Some(compass) = compass.as_mut() {
            matrices[SensorChannel::Magnetometer.index()] = compass.mounting_matrix();
            if let Err(err) = compass.enable(false) {
                warn!("Failed to disable compass at startup: {err}");
            }
        }

        let scales = [config.gyro_scale(), config.accel_scale(), COMPASS_SCALE];

        Self {
            stream,
            control,
            compass,
            decoder: FrameDecoder::new(),
            detected,
            clock,
            enabled: ChannelMask::EMPTY,
            enabled_time_ns: [0; SensorChannel::COUNT],
            periods_ns: [NS_PER_SECOND; SensorChannel::COUNT],
            cached: [RawSample::default(); SensorChannel::COUNT],
            prev_emitted_ns: [0; SensorChannel::COUNT],
            matrices,
            scales,
            batch_active: ChannelMask::EMPTY,
            batch_latency_ns: [BATCH_LATENCY_SENTINEL_NS; SensorChannel::COUNT],
            last_pushed_batch_ms: 0,
            flush_queue: Mutex::new(VecDeque::new()),
            compass_reserve: config.stream.compass_event_reserve,
        }
    }

    /// True if the probe at construction succeeded
    pub fn is_detected(&self) -> bool {
        self.detected
    }

    /// File descriptor to poll for sample stream readiness, if any
    pub fn stream_fd(&self) -> Option<RawFd> {
        self.stream.readiness_fd()
    }

    /// File descriptor to poll for compass readiness, if any
    pub fn compass_fd(&self) -> Option<RawFd> {
        self.compass.as_ref().and_then(|c| c.readiness_fd())
    }

    /// Replace physical-unit scales with 1.0 so tests can assert on
    /// rotated raw values directly
    #[cfg(test)]
    pub(crate) fn set_unit_scales(&mut self) {
        self.scales = [1.0; SensorChannel::COUNT];
    }
}
