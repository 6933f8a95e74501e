// In: src/error.rs

//! This module defines the single, unified error type for the entire curvepack library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurveCodecError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to the codec's logic)
    // =========================================================================
    /// Invalid caller input: non-positive precision, zero tracks, mismatched lengths.
    /// Always raised before any buffer is allocated.
    #[error("Invalid codec configuration: {0}")]
    Configuration(String),

    /// A scratch or output buffer could not be obtained from the allocator.
    #[error("Buffer allocation failed: {0}")]
    Allocation(String),

    /// A compressed blob (or its name table) failed structural validation.
    /// The source data must be treated as corrupt and discarded.
    #[error("Corrupt compressed curve data: {0}")]
    CorruptBlob(String),

    #[error("Track index {index} out of bounds (count: {count})")]
    TrackIndexOutOfBounds { index: u32, count: u32 },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g., opening a log file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config or
    /// dumping compression statistics.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A curve name stored in a name table was not valid UTF-8.
    #[error("Invalid UTF-8 in curve name: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    #[error("Bitpack decoding failed due to truncated buffer or data corruption")]
    BitpackDecodeError,

    #[error("Bitpack encoding error: value {0} exceeds bit width {1}")]
    BitpackEncodeError(u64, u8),

    #[error("LEB128 decoding error: {0}")]
    Leb128DecodeError(String),
}

impl CurveCodecError {
    /// Returns `true` for errors that mean persisted data is unusable.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CurveCodecError::CorruptBlob(_)
                | CurveCodecError::BitpackDecodeError
                | CurveCodecError::Leb128DecodeError(_)
                | CurveCodecError::InvalidUtf8(_)
        )
    }
}
