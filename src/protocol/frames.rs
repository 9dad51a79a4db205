//! Wire format of the device stream
//!
//! The hardware FIFO multiplexes fixed-size frames for all channels over one
//! byte stream. Every frame starts with a 2-byte little-endian header that
//! identifies its kind; each kind has a fixed total size. There is no sync
//! pattern and no checksum: framing relies on the headers alone, so an
//! unknown header means single-byte resynchronization.
//!
//! Frame layouts (all integers little-endian):
//!
//! ```text
//! marker / empty-marker   [header u16] [pad 2] [channel handle i32]              =  8 bytes
//! raw gyro / raw accel    [header u16] [pad 2] [x i32] [y i32] [z i32] [ts i64]  = 24 bytes
//! ```

use crate::types::SensorHandle;

/// Flush marker: a requested flush drained through the FIFO
pub const MARKER_HEADER: u16 = 0x0020;
/// Flush marker variant reported when the FIFO was already empty
pub const EMPTY_MARKER_HEADER: u16 = 0x0040;
/// Raw gyroscope sample
pub const GYRO_HEADER: u16 = 0x2000;
/// Raw accelerometer sample
pub const ACCEL_HEADER: u16 = 0x4000;

/// Total size of marker frames
pub const MARKER_FRAME_SIZE: usize = 8;
/// Total size of raw sample frames
pub const SAMPLE_FRAME_SIZE: usize = 24;

/// One decoded frame from the device stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Flush completion marker carrying the flushed channel's handle
    FlushMarker { handle: SensorHandle, fifo_empty: bool },
    /// New gyroscope sample (raw LSB axes + monotonic timestamp)
    GyroSample { axes: [i32; 3], timestamp_ns: i64 },
    /// New accelerometer sample
    AccelSample { axes: [i32; 3], timestamp_ns: i64 },
}

/// Frame size for a header, `None` if the header is unknown
pub const fn frame_size(header: u16) -> Option<usize> {
    match header {
        MARKER_HEADER | EMPTY_MARKER_HEADER => Some(MARKER_FRAME_SIZE),
        GYRO_HEADER | ACCEL_HEADER => Some(SAMPLE_FRAME_SIZE),
        _ => None,
    }
}

/// Encode a marker frame (test fixture)
#[cfg(test)]
pub(crate) fn encode_marker(handle: SensorHandle, fifo_empty: bool) -> [u8; MARKER_FRAME_SIZE] {
    let header = if fifo_empty { EMPTY_MARKER_HEADER } else { MARKER_HEADER };
    let mut out = [0u8; MARKER_FRAME_SIZE];
    out[0..2].copy_from_slice(&header.to_le_bytes());
    out[4..8].copy_from_slice(&handle.raw().to_le_bytes());
    out
}

/// Encode a raw sample frame (test fixture)
#[cfg(test)]
pub(crate) fn encode_sample(header: u16, axes: [i32; 3], timestamp_ns: i64) -> [u8; SAMPLE_FRAME_SIZE] {
    let mut out = [0u8; SAMPLE_FRAME_SIZE];
    out[0..2].copy_from_slice(&header.to_le_bytes());
    out[4..8].copy_from_slice(&axes[0].to_le_bytes());
    out[8..12].copy_from_slice(&axes[1].to_le_bytes());
    out[12..16].copy_from_slice(&axes[2].to_le_bytes());
    out[16..24].copy_from_slice(&timestamp_ns.to_le_bytes());
    out
}
