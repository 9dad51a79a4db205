//! Enable and rate coordination

use log::{error, info, warn};

use crate::control::DeviceControl;
use crate::error::{Error, Result};
use crate::transport::DeviceStream;
use crate::types::{SensorChannel, SensorHandle};

use super::{COMPASS_MIN_PERIOD_NS, MAX_PERIOD_NS, MIN_PERIOD_NS, NS_PER_SECOND, SpandaIO};

impl<S: DeviceStream, C: DeviceControl> SpandaIO<S, C> {
    pub(super) fn ensure_detected(&self) -> Result<()> {
        if self.detected {
            Ok(())
        } else {
            Err(Error::NoDeviceDetected)
        }
    }

    pub(super) fn resolve(handle: SensorHandle) -> Result<SensorChannel> {
        SensorChannel::from_handle(handle).ok_or(Error::InvalidHandle(handle.raw()))
    }

    /// Turn a channel on or off
    ///
    /// Idempotent: a request matching the current state issues no device
    /// directive and leaves all timing state untouched. A real transition
    /// issues exactly one directive, stamps or clears the channel's enable
    /// time, and recomputes the batch timeout.
    pub fn set_enabled(&mut self, handle: SensorHandle, on: bool) -> Result<()> {
        self.ensure_detected()?;
        let channel = Self::resolve(handle)?;

        // Leaving a channel always takes it out of batch mode, even when
        // the enable state itself does not change
        if !on {
            self.batch_active.remove(channel);
        }

        if self.enabled.contains(channel) != on {
            if on && self.enabled.is_empty() {
                // First channel after idle: buffered carry is stale garbage
                self.decoder.reset();
            }
            self.enabled.set(channel, on);
            info!("{} {}", channel.name(), if on { "enabled" } else { "disabled" });
            self.dispatch_enable(channel, on);
            self.enabled_time_ns[channel.index()] = if on { (self.clock)() } else { 0 };
        }

        self.update_batch_timeout();
        Ok(())
    }

    fn dispatch_enable(&mut self, channel: SensorChannel, on: bool) {
        let result = match channel {
            SensorChannel::Magnetometer => match self.compass.as_mut() {
                Some(compass) => compass.enable(on),
                None => {
                    warn!("No compass attached, magnetometer enable has no effect");
                    Ok(())
                }
            },
            _ => self.control.write_enable(channel, on),
        };
        if let Err(err) = result {
            error!(
                "Failed to {} {}: {err}",
                if on { "enable" } else { "disable" },
                channel.name()
            );
        }
    }

    /// Program a channel's sampling period
    ///
    /// The period is rounded up to an integer rate in Hz and clamped to the
    /// channel's supported range before being sent to the device. Does not
    /// change enable state.
    pub fn set_rate(&mut self, handle: SensorHandle, period_ns: i64) -> Result<()> {
        self.ensure_detected()?;
        let channel = Self::resolve(handle)?;
        if period_ns <= 0 {
            return Err(Error::InvalidParameter(format!(
                "sampling period must be positive, got {period_ns} ns"
            )));
        }

        let rate_hz = (NS_PER_SECOND + period_ns - 1) / period_ns;
        let min_period = match channel {
            SensorChannel::Magnetometer => COMPASS_MIN_PERIOD_NS,
            _ => MIN_PERIOD_NS,
        };
        let period = (NS_PER_SECOND / rate_hz).clamp(min_period, MAX_PERIOD_NS);
        self.periods_ns[channel.index()] = period;
        info!("{} rate set to {period} ns ({rate_hz} Hz requested)", channel.name());

        let result = match channel {
            SensorChannel::Magnetometer => match self.compass.as_mut() {
                Some(compass) => compass.set_rate(period),
                None => Ok(()),
            },
            _ => self.control.write_rate(channel, period),
        };
        if let Err(err) = result {
            error!("Failed to program {} rate: {err}", channel.name());
        }
        Ok(())
    }

    /// Effective sampling period currently programmed for a channel
    pub fn current_period_ns(&self, handle: SensorHandle) -> Result<i64> {
        let channel = Self::resolve(handle)?;
        Ok(self.periods_ns[channel.index()])
    }
}
