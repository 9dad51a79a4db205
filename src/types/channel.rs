//! Logical sensor channels and the enable bitmask
//!
//! Each channel is addressed two ways: by an opaque [`SensorHandle`] at the
//! public API boundary (and inside stream flush markers), and by a dense
//! index used for per-channel state arrays.

/// Opaque external identifier for a logical sensor
///
/// Handle values also appear on the wire as the 4-byte payload of flush
/// marker frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorHandle(pub i32);

impl SensorHandle {
    /// Raw handle value
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical data sources multiplexed over the device stream
///
/// Handle values outside this set are reserved ("others") and rejected by
/// every channel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannel {
    /// Uncalibrated angular rate (rad/s)
    Gyroscope,
    /// Acceleration (m/s²)
    Accelerometer,
    /// Uncalibrated magnetic field (µT), served by the compass collaborator
    Magnetometer,
}

impl SensorChannel {
    /// Number of channels (size of per-channel state arrays)
    pub const COUNT: usize = 3;

    /// Fixed, stable iteration order used by event assembly
    pub const ALL: [SensorChannel; Self::COUNT] = [
        SensorChannel::Gyroscope,
        SensorChannel::Accelerometer,
        SensorChannel::Magnetometer,
    ];

    /// Dense index for per-channel state arrays
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            SensorChannel::Gyroscope => 0,
            SensorChannel::Accelerometer => 1,
            SensorChannel::Magnetometer => 2,
        }
    }

    /// External handle for this channel
    #[inline]
    pub const fn handle(self) -> SensorHandle {
        match self {
            SensorChannel::Gyroscope => SensorHandle(1),
            SensorChannel::Accelerometer => SensorHandle(2),
            SensorChannel::Magnetometer => SensorHandle(3),
        }
    }

    /// Resolve an external handle, `None` for unrecognized handles
    pub fn from_handle(handle: SensorHandle) -> Option<Self> {
        Self::ALL.into_iter().find(|ch| ch.handle() == handle)
    }

    /// Channel name for log messages
    pub const fn name(self) -> &'static str {
        match self {
            SensorChannel::Gyroscope => "gyroscope",
            SensorChannel::Accelerometer => "accelerometer",
            SensorChannel::Magnetometer => "magnetometer",
        }
    }
}

/// Bitmask over channel indices
///
/// Single source of truth for "should this channel be decoded/reported"
/// (enable state) and for the batching-active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelMask(u8);

impl ChannelMask {
    /// Empty mask
    pub const EMPTY: ChannelMask = ChannelMask(0);

    /// True if no channel is set
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if the channel's bit is set
    #[inline]
    pub const fn contains(self, channel: SensorChannel) -> bool {
        self.0 & (1 << channel.index()) != 0
    }

    /// Set the channel's bit
    #[inline]
    pub fn insert(&mut self, channel: SensorChannel) {
        self.0 |= 1 << channel.index();
    }

    /// Clear the channel's bit
    #[inline]
    pub fn remove(&mut self, channel: SensorChannel) {
        self.0 &= !(1 << channel.index());
    }

    /// Set or clear the channel's bit
    #[inline]
    pub fn set(&mut self, channel: SensorChannel, on: bool) {
        if on {
            self.insert(channel);
        } else {
            self.remove(channel);
        }
    }

    /// Raw bit pattern
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}
