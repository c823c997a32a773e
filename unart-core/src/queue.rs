//! Fixed-capacity byte queue
//!
//! FIFO between a bit engine and the byte-stream side. Lives inside the
//! engine's locked state, so every operation here is already serialized;
//! the queue itself only has to be bounded and constant-time per byte.
//! Writes that do not fit are truncated, never blocked.

use heapless::Deque;

/// Bounded byte FIFO
#[derive(Debug, Default)]
pub struct ByteQueue<const N: usize> {
    bytes: Deque<u8, N>,
}

impl<const N: usize> ByteQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            bytes: Deque::new(),
        }
    }

    /// Fixed capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Free space in bytes
    pub fn available(&self) -> usize {
        N - self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bytes.is_full()
    }

    /// Append one byte; returns false (byte dropped) if full
    pub fn push(&mut self, byte: u8) -> bool {
        self.bytes.push_back(byte).is_ok()
    }

    /// Append as many bytes as fit, returns how many were taken
    pub fn push_slice(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.available());
        for &byte in &data[..n] {
            // Cannot fail, space checked above
            let _ = self.bytes.push_back(byte);
        }
        n
    }

    /// Take the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }

    /// Move up to `buf.len()` bytes out, oldest first
    pub fn pop_into(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.bytes.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    /// Drop everything queued
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
