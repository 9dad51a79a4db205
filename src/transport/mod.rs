//! Byte stream abstraction over the sample device

use std::os::fd::RawFd;

use crate::error::Result;

mod mock;

pub use mock::MockStream;

/// Source of the multiplexed sample byte stream
///
/// Reads return whatever bytes the device has ready, with no frame
/// alignment guarantees. A read may end mid-frame; the decoder carries
/// the partial frame to the next read.
pub trait DeviceStream: Send {
    /// Read up to `buf.len()` bytes, returning how many were read
    ///
    /// Returns `Ok(0)` when no bytes are available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// File descriptor the caller can poll for read readiness, if any
    fn readiness_fd(&self) -> Option<RawFd> {
        None
    }
}
