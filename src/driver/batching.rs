//! Batch timeout and flush coordination

use log::{debug, error};

use crate::control::DeviceControl;
use crate::error::{Error, Result};
use crate::transport::DeviceStream;
use crate::types::{SensorChannel, SensorHandle};

use super::{BATCH_LATENCY_SENTINEL_NS, SpandaIO};

impl<S: DeviceStream, C: DeviceControl> SpandaIO<S, C> {
    /// Request FIFO batching for a channel
    ///
    /// A positive `timeout_ns` marks the channel batching-active with that
    /// latency budget; zero clears the flag and restores the no-batching
    /// sentinel so the channel never shortens the effective timeout again.
    /// The device timeout is recomputed either way.
    pub fn request_batch(&mut self, handle: SensorHandle, timeout_ns: i64) -> Result<()> {
        self.ensure_detected()?;
        let channel = Self::resolve(handle)?;
        if timeout_ns < 0 {
            return Err(Error::InvalidParameter(format!(
                "batch timeout must be non-negative, got {timeout_ns} ns"
            )));
        }

        let idx = channel.index();
        if timeout_ns == 0 {
            self.batch_active.remove(channel);
            self.batch_latency_ns[idx] = BATCH_LATENCY_SENTINEL_NS;
        } else {
            self.batch_active.insert(channel);
            self.batch_latency_ns[idx] = timeout_ns;
        }
        self.update_batch_timeout();
        Ok(())
    }

    /// Recompute the device batch timeout from current channel state
    ///
    /// Effective timeout is the minimum latency over channels that are both
    /// enabled and batching-active, or zero when no such channel exists.
    /// The value is pushed in milliseconds, and only when it differs from
    /// the last value pushed.
    pub(super) fn update_batch_timeout(&mut self) {
        let mut timeout_ns = i64::MAX;
        let mut any_batching = false;
        for channel in SensorChannel::ALL {
            if self.enabled.contains(channel) && self.batch_active.contains(channel) {
                any_batching = true;
                timeout_ns = timeout_ns.min(self.batch_latency_ns[channel.index()]);
            }
        }

        let timeout_ms = if any_batching { timeout_ns / 1_000_000 } else { 0 };
        if timeout_ms == self.last_pushed_batch_ms {
            return;
        }
        debug!("Batch timeout {} -> {timeout_ms} ms", self.last_pushed_batch_ms);
        // Remembered even if the write fails, so a retry needs a real change
        self.last_pushed_batch_ms = timeout_ms;
        if let Err(err) = self.control.write_batch_timeout(timeout_ms) {
            error!("Failed to program batch timeout {timeout_ms} ms: {err}");
        }
    }

    /// Ask the device to drain its FIFO on behalf of a channel
    ///
    /// Completion is reported asynchronously: the marker frame travels
    /// through the byte stream behind any batched samples and surfaces as a
    /// [`crate::types::SensorEvent::FlushComplete`] from `poll_events`.
    pub fn flush(&mut self, handle: SensorHandle) -> Result<()> {
        self.ensure_detected()?;
        let channel = Self::resolve(handle)?;
        if !self.enabled.contains(channel) {
            return Err(Error::InvalidParameter(format!(
                "flush requested for disabled channel {}",
                channel.name()
            )));
        }
        debug!("Flush requested for {}", channel.name());
        if let Err(err) = self.control.write_flush(handle) {
            error!("Failed to request flush for {}: {err}", channel.name());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::control::{Directive, MockControl};
    use crate::driver::SpandaIO;
    use crate::transport::MockStream;
    use crate::types::SensorChannel;

    fn make_driver() -> (SpandaIO<MockStream, MockControl>, MockControl) {
        let stream = MockStream::new();
        let control = MockControl::new();
        let driver = SpandaIO::with_clock(
            stream,
            control.clone(),
            None,
            Config::default(),
            || 0,
        );
        control.clear_directives();
        (driver, control)
    }

    fn batch_timeouts(control: &MockControl) -> Vec<i64> {
        control
            .directives()
            .into_iter()
            .filter_map(|d| match d {
                Directive::BatchTimeout(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_timeout_is_min_over_enabled_batching_channels() {
        let (mut driver, control) = make_driver();
        let gyro = SensorChannel::Gyroscope.handle();
        let accel = SensorChannel::Accelerometer.handle();

        driver.request_batch(gyro, 200_000_000).unwrap(); // not enabled yet
        assert_eq!(batch_timeouts(&control), Vec::<i64>::new());

        driver.set_enabled(gyro, true).unwrap();
        assert_eq!(batch_timeouts(&control), vec![200]);

        driver.set_enabled(accel, true).unwrap();
        driver.request_batch(accel, 50_000_000).unwrap();
        assert_eq!(batch_timeouts(&control), vec![200, 50]);

        // Dropping the shorter latency lengthens the timeout again
        driver.request_batch(accel, 0).unwrap();
        assert_eq!(batch_timeouts(&control), vec![200, 50, 200]);
    }

    #[test]
    fn test_timeout_pushed_only_on_change() {
        let (mut driver, control) = make_driver();
        let gyro = SensorChannel::Gyroscope.handle();

        driver.set_enabled(gyro, true).unwrap();
        driver.request_batch(gyro, 100_000_000).unwrap();
        assert_eq!(batch_timeouts(&control), vec![100]);

        // Same effective value from several angles, no further writes
        driver.request_batch(gyro, 100_000_000).unwrap();
        driver.set_enabled(gyro, true).unwrap();
        assert_eq!(batch_timeouts(&control), vec![100]);
    }

    #[test]
    fn test_disable_clears_batching() {
        let (mut driver, control) = make_driver();
        let gyro = SensorChannel::Gyroscope.handle();

        driver.set_enabled(gyro, true).unwrap();
        driver.request_batch(gyro, 75_000_000).unwrap();
        assert_eq!(batch_timeouts(&control), vec![75]);

        driver.set_enabled(gyro, false).unwrap();
        assert_eq!(batch_timeouts(&control), vec![75, 0]);

        // Re-enabling does not resurrect the old latency
        driver.set_enabled(gyro, true).unwrap();
        assert_eq!(batch_timeouts(&control), vec![75, 0]);
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let (mut driver, _control) = make_driver();
        assert!(driver.request_batch(SensorChannel::Gyroscope.handle(), -1).is_err());
    }

    #[test]
    fn test_flush_issues_directive_only_when_enabled() {
        let (mut driver, control) = make_driver();
        let gyro = SensorChannel::Gyroscope.handle();

        assert!(driver.flush(gyro).is_err());

        driver.set_enabled(gyro, true).unwrap();
        driver.flush(gyro).unwrap();
        assert!(control.directives().contains(&Directive::Flush(gyro)));
    }
}
