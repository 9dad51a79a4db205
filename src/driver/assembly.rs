//! Stream polling, orientation transform, and event assembly

use log::{debug, warn};

use crate::control::DeviceControl;
use crate::error::Result;
use crate::protocol::{DECODE_BUFFER_SIZE, Frame, SAMPLE_FRAME_SIZE};
use crate::transport::DeviceStream;
use crate::types::{RawSample, SampleStatus, SensorChannel, SensorEvent};

use super::SpandaIO;

impl<S: DeviceStream, C: DeviceControl> SpandaIO<S, C> {
    /// Read the sample stream and append assembled events to `out`
    ///
    /// At most `max_events` events are appended, minus the compass
    /// reservation when a compass is attached and the magnetometer is
    /// enabled. When no channel is enabled the stream is drained and
    /// discarded so stale frames never survive into the next session.
    /// Returns the number of events appended.
    pub fn poll_events(&mut self, out: &mut Vec<SensorEvent>, max_events: usize) -> Result<usize> {
        self.ensure_detected()?;

        if self.enabled.is_empty() {
            let mut scratch = [0u8; 256];
            while self.stream.read(&mut scratch)? > 0 {}
            self.decoder.reset();
            return Ok(0);
        }

        let budget = self.output_budget(max_events);
        if budget == 0 {
            return Ok(0);
        }

        // Bound the read so decoded events roughly fit the budget and the
        // reassembly buffer never overflows
        let mut chunk = [0u8; DECODE_BUFFER_SIZE];
        let want = self.decoder.free_space().min(budget.saturating_mul(SAMPLE_FRAME_SIZE));
        let n = self.stream.read(&mut chunk[..want])?;
        self.decoder.extend(&chunk[..n]);

        let mut emitted = 0;
        while let Some(frame) = self.decoder.next_frame() {
            self.apply_frame(frame);
            emitted += self.emit_events(out, budget - emitted);
        }
        Ok(emitted)
    }

    /// Pull one compass sample and append assembled events to `out`
    ///
    /// Compass data arrives out-of-band from the main stream, so its
    /// budget is the configured reservation rather than `max_events`.
    pub fn poll_compass_events(
        &mut self,
        out: &mut Vec<SensorEvent>,
        max_events: usize,
    ) -> Result<usize> {
        self.ensure_detected()?;
        let Some(compass) = self.compass.as_mut() else {
            return Ok(0);
        };
        if !self.enabled.contains(SensorChannel::Magnetometer) {
            return Ok(0);
        }
        let budget = max_events.min(self.compass_reserve);
        if budget == 0 {
            return Ok(0);
        }

        if let Some((axes, timestamp_ns)) = compass.read_sample()? {
            self.cached[SensorChannel::Magnetometer.index()] = RawSample { axes, timestamp_ns };
        }
        let mut emitted = 0;
        if let Some(event) = self.assemble(SensorChannel::Magnetometer) {
            out.push(event);
            emitted = 1;
        }
        Ok(emitted)
    }

    /// Output slots available to the main stream after the compass
    /// reservation
    fn output_budget(&self, max_events: usize) -> usize {
        let reserve = if self.compass.is_some()
            && self.enabled.contains(SensorChannel::Magnetometer)
        {
            self.compass_reserve
        } else {
            0
        };
        max_events.saturating_sub(reserve)
    }

    /// Fold one decoded frame into driver state
    fn apply_frame(&mut self, frame: Frame) {
        match frame {
            Frame::FlushMarker { handle, fifo_empty } => {
                debug!("Flush marker for handle {handle} (fifo empty: {fifo_empty})");
                self.flush_queue.lock().push_back(handle);
            }
            Frame::GyroSample { axes, timestamp_ns } => {
                self.cached[SensorChannel::Gyroscope.index()] = RawSample { axes, timestamp_ns };
            }
            Frame::AccelSample { axes, timestamp_ns } => {
                self.cached[SensorChannel::Accelerometer.index()] =
                    RawSample { axes, timestamp_ns };
            }
        }
    }

    /// One emission pass: at most one flush completion, then every enabled
    /// channel whose cached sample is fresh
    fn emit_events(&mut self, out: &mut Vec<SensorEvent>, budget: usize) -> usize {
        let mut emitted = 0;
        if emitted < budget
            && let Some(handle) = self.flush_queue.lock().pop_front()
        {
            out.push(SensorEvent::FlushComplete { handle });
            emitted += 1;
        }
        for channel in SensorChannel::ALL {
            if !self.enabled.contains(channel) {
                continue;
            }
            if let Some(event) = self.assemble(channel) {
                if emitted < budget {
                    out.push(event);
                    emitted += 1;
                } else {
                    // Cache keeps only the newest sample, so the event is lost
                    warn!("Output budget exhausted, dropping {} sample", channel.name());
                }
            }
        }
        emitted
    }

    /// Assemble the channel's cached sample into an event if it is fresh
    ///
    /// Fresh means newer than both the last assembled timestamp and the
    /// channel's enable time. The last-assembled timestamp advances even
    /// when the sample is suppressed or dropped.
    fn assemble(&mut self, channel: SensorChannel) -> Option<SensorEvent> {
        let idx = channel.index();
        let sample = self.cached[idx];
        let ts = sample.timestamp_ns;
        let fresh = ts > self.prev_emitted_ns[idx] && ts > self.enabled_time_ns[idx];
        self.prev_emitted_ns[idx] = ts;
        if !fresh {
            return None;
        }

        let rotated = self.matrices[idx].apply(sample.axes);
        let scale = self.scales[idx];
        Some(SensorEvent::Sample {
            channel,
            values: [
                rotated[0] as f32 * scale,
                rotated[1] as f32 * scale,
                rotated[2] as f32 * scale,
            ],
            timestamp_ns: ts,
            status: SampleStatus::Unreliable,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::control::{MockCompass, MockControl};
    use crate::driver::SpandaIO;
    use crate::protocol::{ACCEL_HEADER, GYRO_HEADER, encode_marker, encode_sample};
    use crate::transport::MockStream;
    use crate::types::{MountingMatrix, SampleStatus, SensorChannel, SensorEvent, SensorHandle};

    fn make_driver() -> (SpandaIO<MockStream, MockControl>, MockStream, MockControl) {
        let _ = env_logger::builder().is_test(true).try_init();
        let stream = MockStream::new();
        let control = MockControl::new();
        let mut driver = SpandaIO::with_clock(
            stream.clone(),
            control.clone(),
            None,
            Config::default(),
            || 0,
        );
        driver.set_unit_scales();
        control.clear_directives();
        (driver, stream, control)
    }

    fn poll_all(driver: &mut SpandaIO<MockStream, MockControl>, max: usize) -> Vec<SensorEvent> {
        let mut out = Vec::new();
        driver.poll_events(&mut out, max).unwrap();
        out
    }

    #[test]
    fn test_end_to_end_gyro_and_accel() {
        let (mut driver, stream, _control) = make_driver();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();
        driver.set_enabled(SensorChannel::Accelerometer.handle(), true).unwrap();

        stream.inject(&encode_sample(GYRO_HEADER, [100, 0, 0], 1000));
        stream.inject(&encode_sample(ACCEL_HEADER, [0, 0, 16384], 1000));

        let events = poll_all(&mut driver, 16);
        assert_eq!(
            events,
            vec![
                SensorEvent::Sample {
                    channel: SensorChannel::Gyroscope,
                    values: [100.0, 0.0, 0.0],
                    timestamp_ns: 1000,
                    status: SampleStatus::Unreliable,
                },
                SensorEvent::Sample {
                    channel: SensorChannel::Accelerometer,
                    values: [0.0, 0.0, 16384.0],
                    timestamp_ns: 1000,
                    status: SampleStatus::Unreliable,
                },
            ]
        );
    }

    #[test]
    fn test_channel_caches_are_isolated() {
        let (mut driver, stream, _control) = make_driver();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();
        driver.set_enabled(SensorChannel::Accelerometer.handle(), true).unwrap();

        // Only a gyro frame arrives; the accel cache stays stale
        stream.inject(&encode_sample(GYRO_HEADER, [1, 2, 3], 500));
        let events = poll_all(&mut driver, 16);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SensorEvent::Sample { channel: SensorChannel::Gyroscope, .. }
        ));
    }

    #[test]
    fn test_mounting_matrix_applied() {
        let stream = MockStream::new();
        let control = MockControl::new();
        // 90 degree rotation about z: x' = -y, y' = x
        control.set_mounting_matrix(
            SensorChannel::Gyroscope,
            MountingMatrix([0, -1, 0, 1, 0, 0, 0, 0, 1]),
        );
        let mut driver = SpandaIO::with_clock(
            stream.clone(),
            control.clone(),
            None,
            Config::default(),
            || 0,
        );
        driver.set_unit_scales();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();

        stream.inject(&encode_sample(GYRO_HEADER, [10, 20, 30], 100));
        let events = poll_all(&mut driver, 4);
        assert_eq!(
            events,
            vec![SensorEvent::Sample {
                channel: SensorChannel::Gyroscope,
                values: [-20.0, 10.0, 30.0],
                timestamp_ns: 100,
                status: SampleStatus::Unreliable,
            }]
        );
    }

    #[test]
    fn test_physical_scales() {
        let stream = MockStream::new();
        let control = MockControl::new();
        let config = Config::default();
        let mut driver =
            SpandaIO::with_clock(stream.clone(), control, None, config.clone(), || 0);
        driver.set_enabled(SensorChannel::Accelerometer.handle(), true).unwrap();

        // Half scale on z: 16384 LSB at 8 g full scale is 4 g
        stream.inject(&encode_sample(ACCEL_HEADER, [0, 0, 16384], 100));
        let events = poll_all(&mut driver, 4);
        let SensorEvent::Sample { values, .. } = events[0] else {
            panic!("expected a sample");
        };
        assert!((values[2] - 4.0 * 9.80665).abs() < 1e-3);
    }

    #[test]
    fn test_stale_timestamp_suppressed() {
        let (mut driver, stream, _control) = make_driver();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();

        stream.inject(&encode_sample(GYRO_HEADER, [1, 1, 1], 1000));
        assert_eq!(poll_all(&mut driver, 4).len(), 1);

        // Same and older timestamps never re-emit
        stream.inject(&encode_sample(GYRO_HEADER, [2, 2, 2], 1000));
        assert_eq!(poll_all(&mut driver, 4).len(), 0);
        stream.inject(&encode_sample(GYRO_HEADER, [3, 3, 3], 900));
        assert_eq!(poll_all(&mut driver, 4).len(), 0);
    }

    #[test]
    fn test_pre_enable_timestamp_suppressed() {
        let stream = MockStream::new();
        let control = MockControl::new();
        let mut driver = SpandaIO::with_clock(
            stream.clone(),
            control,
            None,
            Config::default(),
            || 500,
        );
        driver.set_unit_scales();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();

        // Timestamped before the enable instant: FIFO leftovers, not ours
        stream.inject(&encode_sample(GYRO_HEADER, [1, 1, 1], 400));
        assert_eq!(poll_all(&mut driver, 4).len(), 0);

        stream.inject(&encode_sample(GYRO_HEADER, [1, 1, 1], 600));
        assert_eq!(poll_all(&mut driver, 4).len(), 1);
    }

    #[test]
    fn test_flush_completions_fifo_ahead_of_data() {
        let (mut driver, stream, _control) = make_driver();
        let gyro = SensorChannel::Gyroscope.handle();
        let accel = SensorChannel::Accelerometer.handle();
        driver.set_enabled(gyro, true).unwrap();
        driver.set_enabled(accel, true).unwrap();

        stream.inject(&encode_marker(accel, false));
        stream.inject(&encode_marker(gyro, true));
        stream.inject(&encode_sample(GYRO_HEADER, [1, 0, 0], 1000));

        let events = poll_all(&mut driver, 16);
        assert_eq!(events[0], SensorEvent::FlushComplete { handle: accel });
        assert_eq!(events[1], SensorEvent::FlushComplete { handle: gyro });
        assert!(matches!(
            events[2],
            SensorEvent::Sample { channel: SensorChannel::Gyroscope, .. }
        ));
    }

    #[test]
    fn test_frames_split_across_reads() {
        let (mut driver, stream, _control) = make_driver();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();

        // 7-byte reads split every frame across multiple polls
        stream.set_read_limit(7);
        stream.inject(&encode_sample(GYRO_HEADER, [5, 6, 7], 1000));
        stream.inject(&encode_sample(GYRO_HEADER, [8, 9, 10], 2000));

        let mut events = Vec::new();
        for _ in 0..20 {
            driver.poll_events(&mut events, 16).unwrap();
        }
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            SensorEvent::Sample {
                channel: SensorChannel::Gyroscope,
                values: [8.0, 9.0, 10.0],
                timestamp_ns: 2000,
                status: SampleStatus::Unreliable,
            }
        );
    }

    #[test]
    fn test_drained_when_nothing_enabled() {
        let (mut driver, stream, _control) = make_driver();

        stream.inject(&encode_sample(GYRO_HEADER, [1, 1, 1], 1000));
        assert_eq!(poll_all(&mut driver, 16).len(), 0);
        assert_eq!(stream.pending(), 0);

        // The drained frame is gone even after enabling
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();
        assert_eq!(poll_all(&mut driver, 16).len(), 0);
    }

    #[test]
    fn test_budget_drops_sample_but_advances_cache() {
        let (mut driver, stream, _control) = make_driver();
        let gyro = SensorChannel::Gyroscope.handle();
        driver.set_enabled(gyro, true).unwrap();

        // Two queued flush completions soak up two budget-1 passes; the
        // sample lands in a pass whose budget is already spent
        stream.inject(&encode_marker(gyro, false));
        stream.inject(&encode_marker(gyro, false));
        stream.inject(&encode_sample(GYRO_HEADER, [1, 0, 0], 1000));

        let mut out = Vec::new();
        driver.poll_events(&mut out, 1).unwrap();
        driver.poll_events(&mut out, 1).unwrap();
        driver.poll_events(&mut out, 16).unwrap();
        assert_eq!(
            out,
            vec![
                SensorEvent::FlushComplete { handle: gyro },
                SensorEvent::FlushComplete { handle: gyro },
            ]
        );

        // The dropped sample still advanced the cache: its timestamp is
        // spent, only newer data emits
        stream.inject(&encode_sample(GYRO_HEADER, [1, 0, 0], 1000));
        driver.poll_events(&mut out, 16).unwrap();
        assert_eq!(out.len(), 2);

        stream.inject(&encode_sample(GYRO_HEADER, [2, 0, 0], 2000));
        driver.poll_events(&mut out, 16).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(
            out[2],
            SensorEvent::Sample {
                channel: SensorChannel::Gyroscope,
                values: [2.0, 0.0, 0.0],
                timestamp_ns: 2000,
                status: SampleStatus::Unreliable,
            }
        );
    }

    #[test]
    fn test_unbounded_budget_is_safe() {
        let (mut driver, stream, _control) = make_driver();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();

        stream.inject(&encode_sample(GYRO_HEADER, [1, 2, 3], 1000));
        let mut out = Vec::new();
        assert_eq!(driver.poll_events(&mut out, usize::MAX).unwrap(), 1);
    }

    #[test]
    fn test_read_error_propagates() {
        let (mut driver, stream, _control) = make_driver();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();
        stream.fail_next_read();

        let mut out = Vec::new();
        assert!(driver.poll_events(&mut out, 16).is_err());
    }

    #[test]
    fn test_unknown_handle_marker_still_surfaces() {
        let (mut driver, stream, _control) = make_driver();
        driver.set_enabled(SensorChannel::Gyroscope.handle(), true).unwrap();

        // Marker handles pass through untranslated
        stream.inject(&encode_marker(SensorHandle(7), true));
        let events = poll_all(&mut driver, 4);
        assert_eq!(events, vec![SensorEvent::FlushComplete { handle: SensorHandle(7) }]);
    }

    #[test]
    fn test_compass_events_and_reservation() {
        let stream = MockStream::new();
        let control = MockControl::new();
        let compass = MockCompass::new();
        compass.set_mounting_matrix(MountingMatrix([0, -1, 0, 1, 0, 0, 0, 0, 1]));
        let mut driver = SpandaIO::with_clock(
            stream.clone(),
            control,
            Some(Box::new(compass.clone())),
            Config::default(),
            || 0,
        );
        driver.set_unit_scales();

        let mag = SensorChannel::Magnetometer.handle();
        driver.set_enabled(mag, true).unwrap();
        assert!(compass.is_enabled());
        driver.set_rate(mag, 50_000_000).unwrap();
        assert_eq!(compass.period_ns(), 50_000_000);

        // Default reservation is 2, so a budget of 2 leaves the main
        // stream nothing
        stream.inject(&encode_sample(GYRO_HEADER, [1, 1, 1], 1000));
        let mut out = Vec::new();
        assert_eq!(driver.poll_events(&mut out, 2).unwrap(), 0);

        compass.inject_sample([10, 20, 30], 900);
        assert_eq!(driver.poll_compass_events(&mut out, 8).unwrap(), 1);
        assert_eq!(
            out,
            vec![SensorEvent::Sample {
                channel: SensorChannel::Magnetometer,
                values: [-20.0, 10.0, 30.0],
                timestamp_ns: 900,
                status: SampleStatus::Unreliable,
            }]
        );

        // No new sample means no event
        assert_eq!(driver.poll_compass_events(&mut out, 8).unwrap(), 0);
    }

    #[test]
    fn test_compass_disabled_yields_nothing() {
        let stream = MockStream::new();
        let compass = MockCompass::new();
        compass.inject_sample([1, 2, 3], 100);
        let mut driver = SpandaIO::with_clock(
            stream,
            MockControl::new(),
            Some(Box::new(compass)),
            Config::default(),
            || 0,
        );

        let mut out = Vec::new();
        assert_eq!(driver.poll_compass_events(&mut out, 8).unwrap(), 0);
        assert!(out.is_empty());
    }
}
