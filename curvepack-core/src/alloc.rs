// In: src/alloc.rs

//! Explicit buffer allocation for the codec.
//!
//! The compressor never reaches for a global allocator to produce its output
//! blob. Instead, the caller threads a `CodecAllocator` through
//! `compress_track_list`; the blob is allocated from it in one shot and the
//! caller hands the buffer back through `deallocate` once the bytes have been
//! persisted.

use crate::error::CurveCodecError;

/// A caller-supplied source of byte buffers.
pub trait CodecAllocator {
    /// Returns a zero-filled buffer of exactly `size` bytes.
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, CurveCodecError>;

    /// Takes back a buffer previously returned by `allocate`.
    fn deallocate(&mut self, buffer: Vec<u8>);
}

/// Heap-backed allocator. Uses fallible reservation so that an out-of-memory
/// condition surfaces as `CurveCodecError::Allocation` instead of aborting.
#[derive(Debug, Default)]
pub struct HeapAllocator;

impl CodecAllocator for HeapAllocator {
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, CurveCodecError> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|e| {
            CurveCodecError::Allocation(format!("failed to reserve {} bytes: {}", size, e))
        })?;
        buffer.resize(size, 0);
        Ok(buffer)
    }

    fn deallocate(&mut self, buffer: Vec<u8>) {
        drop(buffer);
    }
}

/// Heap allocator with a hard byte budget. Tracks live bytes so that a host can
/// cap how much memory a single compression pass may hold at once.
#[derive(Debug)]
pub struct BoundedAllocator {
    limit: usize,
    in_use: usize,
    inner: HeapAllocator,
}

impl BoundedAllocator {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            in_use: 0,
            inner: HeapAllocator,
        }
    }

    /// Bytes currently handed out and not yet returned.
    pub fn bytes_in_use(&self) -> usize {
        self.in_use
    }
}

impl CodecAllocator for BoundedAllocator {
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, CurveCodecError> {
        let requested = self.in_use.saturating_add(size);
        if requested > self.limit {
            return Err(CurveCodecError::Allocation(format!(
                "allocation of {} bytes exceeds budget ({} of {} bytes in use)",
                size, self.in_use, self.limit
            )));
        }
        let buffer = self.inner.allocate(size)?;
        self.in_use = requested;
        Ok(buffer)
    }

    fn deallocate(&mut self, buffer: Vec<u8>) {
        self.in_use = self.in_use.saturating_sub(buffer.len());
        self.inner.deallocate(buffer);
    }
}
