//! Incremental frame decoder over the device byte stream

use log::warn;

use crate::types::SensorHandle;

use super::byte_queue::ByteQueue;
use super::frames::{
    ACCEL_HEADER, EMPTY_MARKER_HEADER, Frame, GYRO_HEADER, MARKER_HEADER, frame_size,
};

/// Capacity of the decoder's reassembly buffer
pub const DECODE_BUFFER_SIZE: usize = 2048;

/// Incremental decoder that reassembles frames from arbitrary read chunks
///
/// Bytes arrive in whatever sizes the kernel hands back, so a frame can be
/// split across any number of reads. Leftover bytes stay buffered until the
/// rest of the frame arrives. An unknown header discards exactly one byte
/// and retries, which walks the cursor back onto a frame boundary.
pub struct FrameDecoder {
    buf: ByteQueue<DECODE_BUFFER_SIZE>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buf: ByteQueue::new() }
    }

    /// Append freshly read bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes);
    }

    /// Bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Remaining buffer capacity, used to bound the next read
    pub fn free_space(&self) -> usize {
        self.buf.free_space()
    }

    /// Discard all buffered bytes
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Decode the next complete frame, `None` when more bytes are needed
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            let header = self.buf.read_u16_le(0)?;
            let Some(size) = frame_size(header) else {
                // Unknown header: resynchronize one byte at a time
                warn!("Unknown stream header {header:#06x}, skipping one byte");
                self.buf.advance(1);
                continue;
            };
            if self.buf.len() < size {
                return None;
            }
            let frame = match header {
                MARKER_HEADER | EMPTY_MARKER_HEADER => Frame::FlushMarker {
                    handle: SensorHandle(self.buf.read_i32_le(4)?),
                    fifo_empty: header == EMPTY_MARKER_HEADER,
                },
                GYRO_HEADER | ACCEL_HEADER => {
                    let axes = [
                        self.buf.read_i32_le(4)?,
                        self.buf.read_i32_le(8)?,
                        self.buf.read_i32_le(12)?,
                    ];
                    let timestamp_ns = self.buf.read_i64_le(16)?;
                    if header == GYRO_HEADER {
                        Frame::GyroSample { axes, timestamp_ns }
                    } else {
                        Frame::AccelSample { axes, timestamp_ns }
                    }
                }
                _ => unreachable!(),
            };
            self.buf.advance(size);
            return Some(frame);
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
