//! Fixed-capacity output buffer.
//!
//! Workers write into an [`OutputBuffer`] whose capacity is set before the task starts. Every
//! append checks the remaining space first and fails with
//! [`EngineError::CapacityExceeded`] instead of growing, so a shard either produces complete
//! output or none at all.

use crate::errors::EngineError;

/// Append-only byte buffer that never grows past its capacity.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl OutputBuffer {
    /// Allocates a buffer holding at most `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity), capacity }
    }

    /// Appends all `parts` or nothing.
    pub fn append_all(&mut self, parts: &[&[u8]]) -> Result<(), EngineError> {
        let extra: usize = parts.iter().map(|p| p.len()).sum();
        self.reserve_check(extra)?;
        for part in parts {
            self.data.extend_from_slice(part);
        }
        Ok(())
    }

    /// Appends `bytes`.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        self.append_all(&[bytes])
    }

    /// Appends a line body followed by `\n`.
    pub fn append_line(&mut self, body: &[u8]) -> Result<(), EngineError> {
        self.append_all(&[body, b"\n"])
    }

    fn reserve_check(&self, extra: usize) -> Result<(), EngineError> {
        let needed = self.data.len() + extra;
        if needed > self.capacity {
            return Err(EngineError::CapacityExceeded { needed, capacity: self.capacity });
        }
        Ok(())
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, returning the written bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
