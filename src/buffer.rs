//! Buffer — the byte payload handed from one stage to the next.
//!
//! Bounded by the capture limit: one slot is reserved for a terminator,
//! so a buffer never holds more than `capture_limit - 1` bytes.
//! Content from the first NUL onwards is dropped, so the logical payload is
//! always NUL-free. Both rules truncate; neither fails.

use std::borrow::Cow;

/// Owned, bounded stage payload. Moved between controller and executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest payload a buffer may carry under `capture_limit`.
    pub fn max_len(capture_limit: usize) -> usize {
        capture_limit.saturating_sub(1)
    }

    /// Build a buffer from captured bytes, enforcing both invariants.
    pub fn from_capture(mut bytes: Vec<u8>, capture_limit: usize) -> Self {
        if let Some(nul) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(nul);
        }
        bytes.truncate(Self::max_len(capture_limit));
        Self { bytes }
    }

    /// The seed payload written once before stage 0.
    pub fn seed(text: &str, capture_limit: usize) -> Self {
        Self::from_capture(text.as_bytes().to_vec(), capture_limit)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Text view of the payload. Invalid UTF-8 is replaced, not rejected.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}
