//! Mock stream for testing

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

use super::DeviceStream;

struct MockStreamInner {
    read_buffer: VecDeque<u8>,
    read_limit: Option<usize>,
    fail_next_read: bool,
}

/// In-memory [`DeviceStream`] fed by the test
///
/// Clones share the same buffer, so a test can keep one handle for
/// injecting bytes while the driver owns another.
#[derive(Clone)]
pub struct MockStream {
    inner: Arc<Mutex<MockStreamInner>>,
}

impl MockStream {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockStreamInner {
                read_buffer: VecDeque::new(),
                read_limit: None,
                fail_next_read: false,
            })),
        }
    }

    /// Queue bytes to be returned by subsequent reads
    pub fn inject(&self, bytes: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.extend(bytes);
    }

    /// Cap how many bytes a single read may return
    pub fn set_read_limit(&self, limit: usize) {
        self.inner.lock().unwrap().read_limit = Some(limit);
    }

    /// Make the next read fail with an I/O error
    pub fn fail_next_read(&self) {
        self.inner.lock().unwrap().fail_next_read = true;
    }

    /// Bytes still queued and unread
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().read_buffer.len()
    }
}

impl Default for MockStream {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceStream for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_read {
            inner.fail_next_read = false;
            return Err(Error::Io(std::io::Error::other("mock read failure")));
        }
        let mut limit = buf.len().min(inner.read_buffer.len());
        if let Some(cap) = inner.read_limit {
            limit = limit.min(cap);
        }
        for slot in buf.iter_mut().take(limit) {
            *slot = inner.read_buffer.pop_front().unwrap();
        }
        Ok(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_returns_injected_bytes() {
        let mock = MockStream::new();
        mock.inject(&[1, 2, 3, 4]);

        let mut driver_side = mock.clone();
        let mut buf = [0u8; 8];
        assert_eq!(driver_side.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert_eq!(driver_side.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_limit_splits_data() {
        let mock = MockStream::new();
        mock.set_read_limit(3);
        mock.inject(&[1, 2, 3, 4, 5]);

        let mut driver_side = mock.clone();
        let mut buf = [0u8; 8];
        assert_eq!(driver_side.read(&mut buf).unwrap(), 3);
        assert_eq!(driver_side.read(&mut buf).unwrap(), 2);
    }

    #[test]
    fn test_failed_read() {
        let mock = MockStream::new();
        mock.inject(&[1]);
        mock.fail_next_read();

        let mut driver_side = mock.clone();
        let mut buf = [0u8; 8];
        assert!(driver_side.read(&mut buf).is_err());
        // Failure is one-shot, data is still there afterwards
        assert_eq!(driver_side.read(&mut buf).unwrap(), 1);
    }
}
