//! Fixed-capacity byte queue for stream reassembly
//!
//! Ring buffer with O(1) advance: consuming a decoded frame moves a cursor
//! instead of shifting the remaining bytes. Little-endian integer readers
//! handle values that span the wraparound point.

/// Fixed-capacity ring buffer with O(1) advance
///
/// Generic const parameter `N` sets buffer capacity.
pub struct ByteQueue<const N: usize> {
    data: [u8; N],
    head: usize, // Write position (next empty slot)
    tail: usize, // Read position (first valid byte)
    len: usize,  // Number of bytes available
}

impl<const N: usize> ByteQueue<N> {
    /// Create a new empty queue
    pub const fn new() -> Self {
        Self {
            data: [0u8; N],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Append bytes to the queue
    ///
    /// Bytes that would overflow are dropped; callers size their reads to
    /// [`Self::free_space`] so this does not happen on the normal path.
    pub fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.len < N {
                self.data[self.head] = b;
                self.head = (self.head + 1) % N;
                self.len += 1;
            }
        }
    }

    /// Consume n bytes from the front - O(1)
    #[inline]
    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.len);
        self.tail = (self.tail + n) % N;
        self.len -= n;
    }

    /// Discard all buffered bytes
    #[inline]
    pub fn clear(&mut self) {
        self.tail = self.head;
        self.len = 0;
    }

    /// Number of bytes available to read
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no bytes are buffered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remaining capacity
    #[inline]
    pub fn free_space(&self) -> usize {
        N - self.len
    }

    /// Read byte at logical index (handles wraparound)
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        if index < self.len {
            Some(self.data[(self.tail + index) % N])
        } else {
            None
        }
    }

    #[inline]
    fn byte_at(&self, index: usize) -> u8 {
        self.data[(self.tail + index) % N]
    }

    /// Read a little-endian u16 at logical offset, `None` if out of range
    pub fn read_u16_le(&self, offset: usize) -> Option<u16> {
        if offset + 2 > self.len {
            return None;
        }
        Some(u16::from_le_bytes([self.byte_at(offset), self.byte_at(offset + 1)]))
    }

    /// Read a little-endian i32 at logical offset, `None` if out of range
    pub fn read_i32_le(&self, offset: usize) -> Option<i32> {
        if offset + 4 > self.len {
            return None;
        }
        let mut raw = [0u8; 4];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = self.byte_at(offset + i);
        }
        Some(i32::from_le_bytes(raw))
    }

    /// Read a little-endian i64 at logical offset, `None` if out of range
    pub fn read_i64_le(&self, offset: usize) -> Option<i64> {
        if offset + 8 > self.len {
            return None;
        }
        let mut raw = [0u8; 8];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = self.byte_at(offset + i);
        }
        Some(i64::from_le_bytes(raw))
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
