// In: src/bridge/format.rs

//! Defines all on-disk structures and constants for the compressed track format.
//! This is the single source of truth for the blob layout shared by the
//! compressor (writer) and the decompression context (reader).
//!
//! Layout, all little-endian and 4-byte aligned:
//!
//! ```text
//! [RawHeader]                        32 bytes
//! [RawTrackEntry;   num_tracks]      24 bytes each
//! [RawSegmentEntry; num_segments]    24 bytes each
//! [packed segment data]              ceil(bit_width * num_samples / 8) bytes per segment
//! ```

use bytemuck::{Pod, Zeroable};

//==================================================================================
// I. Constants
//==================================================================================

/// The magic number to identify a compressed track blob.
pub const TRACKS_MAGIC: &[u8; 4] = b"CRVT";
/// The codec algorithm version. Any change to quantization, segmenting or layout
/// bumps this, which also invalidates every build cache key.
pub const ALGORITHM_VERSION: u16 = 1;
/// Track type tag for scalar float tracks, the only type this codec stores.
pub const TRACK_TYPE_FLOAT1: u16 = 1;

/// Set in `RawTrackEntry::flags` for tracks stored as a single value.
pub const TRACK_FLAG_CONSTANT: u32 = 1;

pub const HEADER_SIZE: usize = std::mem::size_of::<RawHeader>();
pub const TRACK_ENTRY_SIZE: usize = std::mem::size_of::<RawTrackEntry>();
pub const SEGMENT_ENTRY_SIZE: usize = std::mem::size_of::<RawSegmentEntry>();

//==================================================================================
// II. Raw Records
//==================================================================================

/// Fixed-size blob header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RawHeader {
    pub magic: [u8; 4],
    pub algorithm_version: u16,
    pub track_type: u16,
    /// Size of the whole blob, header included.
    pub total_size: u32,
    /// First four bytes of the SHA-256 of everything after the header.
    pub content_hash: u32,
    pub num_tracks: u32,
    /// Samples per track; identical for every track in a blob.
    pub num_samples: u32,
    pub sample_rate: f32,
    pub num_segments: u32,
}

/// Per-track directory entry. Gives O(1) access to a track's segment list.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RawTrackEntry {
    pub output_index: u32,
    pub flags: u32,
    pub precision: f32,
    /// The track's value when `TRACK_FLAG_CONSTANT` is set, 0 otherwise.
    pub constant_value: f32,
    /// Index of the track's first entry in the segment table.
    pub first_segment: u32,
    pub num_segments: u32,
}

impl RawTrackEntry {
    pub fn is_constant(&self) -> bool {
        self.flags & TRACK_FLAG_CONSTANT != 0
    }
}

/// A contiguous run of samples sharing one quantization range.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RawSegmentEntry {
    pub start_sample: u32,
    pub num_samples: u32,
    pub range_min: f32,
    pub range_extent: f32,
    /// Byte offset of the packed samples, relative to the data section.
    pub data_offset: u32,
    pub bit_width: u8,
    pub padding: [u8; 3],
}

//==================================================================================
// III. Layout Helpers
//==================================================================================

/// Byte offset of the track directory.
pub fn track_table_offset() -> usize {
    HEADER_SIZE
}

/// Byte offset of the segment table.
pub fn segment_table_offset(num_tracks: usize) -> usize {
    HEADER_SIZE + num_tracks * TRACK_ENTRY_SIZE
}

/// Byte offset of the packed data section.
pub fn data_section_offset(num_tracks: usize, num_segments: usize) -> usize {
    segment_table_offset(num_tracks) + num_segments * SEGMENT_ENTRY_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes_are_stable() {
        assert_eq!(HEADER_SIZE, 32);
        assert_eq!(TRACK_ENTRY_SIZE, 24);
        assert_eq!(SEGMENT_ENTRY_SIZE, 24);
    }

    #[test]
    fn test_section_offsets() {
        assert_eq!(track_table_offset(), 32);
        assert_eq!(segment_table_offset(2), 32 + 48);
        assert_eq!(data_section_offset(2, 3), 32 + 48 + 72);
    }
}
