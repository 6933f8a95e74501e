// In: src/track_pipeline/artifact.rs

//! Defines the in-memory handle for a compressed track blob.
//! This module is the single source of truth for reading the blob back: record
//! access, structural validation, content hashing and efficient metadata peeking.
//! The writer side lives in `compressor`; both share `bridge::format`.

use bytemuck::Pod;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::bridge::format::{
    data_section_offset, segment_table_offset, track_table_offset, RawHeader, RawSegmentEntry,
    RawTrackEntry, ALGORITHM_VERSION, HEADER_SIZE, SEGMENT_ENTRY_SIZE, TRACKS_MAGIC,
    TRACK_ENTRY_SIZE, TRACK_FLAG_CONSTANT, TRACK_TYPE_FLOAT1,
};
use crate::error::CurveCodecError;
use crate::kernels::{bitpack, quantize};

//==================================================================================
// Public Structs
//==================================================================================

/// The metadata held in a blob's header and tables.
/// Returned by `peek_info`, which never touches the packed sample data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderInfo {
    pub algorithm_version: u16,
    pub num_tracks: u32,
    pub num_samples: u32,
    pub sample_rate: f32,
    pub duration: f32,
    pub num_segments: u32,
    pub num_constant_tracks: u32,
    /// Header plus track and segment tables.
    pub header_size: usize,
    pub data_size: usize,
    pub total_size: usize,
}

/// Per-track storage summary, as reported by `analyze_compressed_tracks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub output_index: u32,
    pub precision: f32,
    pub is_constant: bool,
    pub num_segments: u32,
    pub data_bytes: usize,
    /// Mean bits per sample across the track's segments; 0 for constant tracks.
    pub avg_bits_per_sample: f32,
}

/// A validated, immutable compressed track blob.
///
/// Only constructible from bytes that passed structural validation, so every
/// record accessor below may index the buffer freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedTracks {
    buffer: Vec<u8>,
}

//==================================================================================
// Core Implementation
//==================================================================================

impl CompressedTracks {
    /// Wraps a buffer produced by the compressor. Validation is the caller's job.
    pub(crate) fn from_buffer_unchecked(buffer: Vec<u8>) -> Self {
        Self { buffer }
    }

    /// Copies `bytes` into a new blob after full validation, content hash included.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CurveCodecError> {
        Self::from_vec(bytes.to_vec())
    }

    /// Takes ownership of `buffer` after full validation, content hash included.
    pub fn from_vec(buffer: Vec<u8>) -> Result<Self, CurveCodecError> {
        validate_blob(&buffer, true)?;
        Ok(Self { buffer })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Releases the underlying buffer, e.g. to hand it back to its allocator.
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn header(&self) -> RawHeader {
        read_record(&self.buffer, 0)
    }

    pub fn num_tracks(&self) -> u32 {
        self.header().num_tracks
    }

    /// The directory entry of the track at compressed index `index`.
    pub fn track_entry(&self, index: u32) -> Result<RawTrackEntry, CurveCodecError> {
        let count = self.num_tracks();
        if index >= count {
            return Err(CurveCodecError::TrackIndexOutOfBounds { index, count });
        }
        Ok(BlobView::new_unchecked(&self.buffer).track(index as usize))
    }

    /// The segment entries of the track at compressed index `index`, in sample order.
    pub fn segment_entries(&self, index: u32) -> Result<Vec<RawSegmentEntry>, CurveCodecError> {
        let entry = self.track_entry(index)?;
        let view = BlobView::new_unchecked(&self.buffer);
        Ok((entry.first_segment..entry.first_segment + entry.num_segments)
            .map(|s| view.segment(s as usize))
            .collect())
    }

    /// The packed sample data of every segment.
    pub fn data_section(&self) -> &[u8] {
        BlobView::new_unchecked(&self.buffer).data()
    }

    /// Re-runs structural validation; `check_hash` additionally verifies the
    /// content hash.
    pub fn is_valid(&self, check_hash: bool) -> bool {
        validate_blob(&self.buffer, check_hash).is_ok()
    }

    /// Peeks into a serialized blob's header and tables to extract metadata
    /// without validating or reading the packed sample data.
    pub fn peek_info(bytes: &[u8]) -> Result<HeaderInfo, CurveCodecError> {
        let header = check_header(bytes)?;
        let num_tracks = header.num_tracks as usize;
        let num_segments = header.num_segments as usize;
        let header_size = checked_data_offset(num_tracks, num_segments)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| corrupt("track and segment tables exceed the buffer"))?;

        let view = BlobView::new_unchecked(bytes);
        let num_constant_tracks = (0..num_tracks)
            .filter(|&i| view.track(i).is_constant())
            .count() as u32;

        Ok(HeaderInfo {
            algorithm_version: header.algorithm_version,
            num_tracks: header.num_tracks,
            num_samples: header.num_samples,
            sample_rate: header.sample_rate,
            duration: duration_of(&header),
            num_segments: header.num_segments,
            num_constant_tracks,
            header_size,
            data_size: bytes.len() - header_size,
            total_size: bytes.len(),
        })
    }

    /// Storage summary of every track, in compressed order.
    pub fn track_summaries(&self) -> Vec<TrackSummary> {
        let view = BlobView::new_unchecked(&self.buffer);
        (0..view.num_tracks())
            .map(|i| {
                let entry = view.track(i);
                let segments: Vec<RawSegmentEntry> = (entry.first_segment
                    ..entry.first_segment + entry.num_segments)
                    .map(|s| view.segment(s as usize))
                    .collect();
                let total_bits: u64 = segments
                    .iter()
                    .map(|s| s.num_samples as u64 * s.bit_width as u64)
                    .sum();
                let data_bytes = segments
                    .iter()
                    .map(|s| bitpack::packed_len(s.num_samples as usize, s.bit_width))
                    .sum();
                let num_samples = view.header().num_samples.max(1);
                TrackSummary {
                    output_index: entry.output_index,
                    precision: entry.precision,
                    is_constant: entry.is_constant(),
                    num_segments: entry.num_segments,
                    data_bytes,
                    avg_bits_per_sample: if entry.is_constant() {
                        0.0
                    } else {
                        total_bits as f32 / num_samples as f32
                    },
                }
            })
            .collect()
    }
}

//==================================================================================
// Record Access
//==================================================================================

/// A borrowed, record-level view of blob bytes.
///
/// Construct it only over bytes that passed `validate_blob`; accessors index the
/// tables without bounds checks beyond the slice's own.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlobView<'a> {
    bytes: &'a [u8],
    header: RawHeader,
}

impl<'a> BlobView<'a> {
    pub(crate) fn new_unchecked(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            header: read_record(bytes, 0),
        }
    }

    pub(crate) fn header(&self) -> &RawHeader {
        &self.header
    }

    pub(crate) fn num_tracks(&self) -> usize {
        self.header.num_tracks as usize
    }

    pub(crate) fn track(&self, index: usize) -> RawTrackEntry {
        read_record(self.bytes, track_table_offset() + index * TRACK_ENTRY_SIZE)
    }

    pub(crate) fn segment(&self, index: usize) -> RawSegmentEntry {
        let base = segment_table_offset(self.num_tracks());
        read_record(self.bytes, base + index * SEGMENT_ENTRY_SIZE)
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        let start = data_section_offset(self.num_tracks(), self.header.num_segments as usize);
        &self.bytes[start..]
    }

    pub(crate) fn duration(&self) -> f32 {
        duration_of(&self.header)
    }
}

fn read_record<T: Pod>(bytes: &[u8], offset: usize) -> T {
    bytemuck::pod_read_unaligned(&bytes[offset..offset + std::mem::size_of::<T>()])
}

fn duration_of(header: &RawHeader) -> f32 {
    header.num_samples.saturating_sub(1) as f32 / header.sample_rate
}

//==================================================================================
// Validation
//==================================================================================

/// First four bytes (little-endian) of the SHA-256 of `payload`.
pub(crate) fn compute_content_hash(payload: &[u8]) -> u32 {
    let digest = Sha256::digest(payload);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

fn corrupt(message: impl Into<String>) -> CurveCodecError {
    CurveCodecError::CorruptBlob(message.into())
}

fn checked_data_offset(num_tracks: usize, num_segments: usize) -> Option<usize> {
    let tables = num_tracks
        .checked_mul(TRACK_ENTRY_SIZE)?
        .checked_add(num_segments.checked_mul(SEGMENT_ENTRY_SIZE)?)?;
    HEADER_SIZE.checked_add(tables)
}

/// Validates the fixed header: magic, version, track type, declared size, counts.
fn check_header(bytes: &[u8]) -> Result<RawHeader, CurveCodecError> {
    if bytes.len() < HEADER_SIZE {
        return Err(corrupt(format!(
            "blob is too small to be valid. Minimum size: {}, got: {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }
    let header: RawHeader = read_record(bytes, 0);
    if header.magic != *TRACKS_MAGIC {
        return Err(corrupt("invalid magic number"));
    }
    if header.algorithm_version != ALGORITHM_VERSION {
        return Err(corrupt(format!(
            "unsupported algorithm version: expected {}, got {}",
            ALGORITHM_VERSION, header.algorithm_version
        )));
    }
    if header.track_type != TRACK_TYPE_FLOAT1 {
        return Err(corrupt(format!("unsupported track type {}", header.track_type)));
    }
    if header.total_size as usize != bytes.len() {
        return Err(corrupt(format!(
            "declared size {} does not match buffer length {}",
            header.total_size,
            bytes.len()
        )));
    }
    if header.num_tracks == 0 || header.num_samples == 0 {
        return Err(corrupt("blob declares no tracks or no samples"));
    }
    if !(header.sample_rate.is_finite() && header.sample_rate > 0.0) {
        return Err(corrupt(format!("invalid sample rate {}", header.sample_rate)));
    }
    Ok(header)
}

/// Full structural validation of a blob.
///
/// Beyond the header this checks that the tables fit the buffer, that tracks own
/// consecutive runs of the segment table, that every animated track's segments
/// tile `[0, num_samples)` in order with legal bit widths and finite ranges, and
/// that each segment's packed data lies inside the data section.
pub(crate) fn validate_blob(bytes: &[u8], check_hash: bool) -> Result<(), CurveCodecError> {
    let header = check_header(bytes)?;
    let num_tracks = header.num_tracks as usize;
    let num_segments = header.num_segments as usize;

    let data_start = checked_data_offset(num_tracks, num_segments)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| corrupt("track and segment tables exceed the buffer"))?;
    let data_len = bytes.len() - data_start;
    let view = BlobView::new_unchecked(bytes);

    let mut next_segment = 0u64;
    for t in 0..num_tracks {
        let track = view.track(t);
        if track.flags & !TRACK_FLAG_CONSTANT != 0 {
            return Err(corrupt(format!("track {} has unknown flags {:#x}", t, track.flags)));
        }
        if !(track.precision.is_finite() && track.precision > 0.0) {
            return Err(corrupt(format!("track {} has invalid precision", t)));
        }
        if track.first_segment as u64 != next_segment {
            return Err(corrupt(format!("track {} segment list is out of order", t)));
        }

        if track.is_constant() {
            if track.num_segments != 0 || !track.constant_value.is_finite() {
                return Err(corrupt(format!("constant track {} is malformed", t)));
            }
            continue;
        }

        if track.num_segments == 0 {
            return Err(corrupt(format!("animated track {} has no segments", t)));
        }
        next_segment += track.num_segments as u64;
        if next_segment > num_segments as u64 {
            return Err(corrupt(format!("track {} segments exceed the segment table", t)));
        }

        let mut expected_start = 0u64;
        for s in track.first_segment as usize..next_segment as usize {
            let seg = view.segment(s);
            if seg.start_sample as u64 != expected_start || seg.num_samples == 0 {
                return Err(corrupt(format!(
                    "track {} segment {} breaks sample contiguity",
                    t, s
                )));
            }
            expected_start += seg.num_samples as u64;
            if !quantize::is_valid_bit_width(seg.bit_width) {
                return Err(corrupt(format!(
                    "segment {} has invalid bit width {}",
                    s, seg.bit_width
                )));
            }
            if !(seg.range_min.is_finite() && seg.range_extent.is_finite() && seg.range_extent >= 0.0) {
                return Err(corrupt(format!("segment {} has an invalid range", s)));
            }
            let packed = bitpack::packed_len(seg.num_samples as usize, seg.bit_width);
            if seg.data_offset as usize + packed > data_len {
                return Err(corrupt(format!("segment {} data exceeds the data section", s)));
            }
        }
        if expected_start != header.num_samples as u64 {
            return Err(corrupt(format!(
                "track {} segments cover {} of {} samples",
                t, expected_start, header.num_samples
            )));
        }
    }
    if next_segment != num_segments as u64 {
        return Err(corrupt(format!(
            "{} segments referenced, {} declared",
            next_segment, num_segments
        )));
    }

    if check_hash && compute_content_hash(&bytes[HEADER_SIZE..]) != header.content_hash {
        return Err(corrupt("content hash mismatch"));
    }
    Ok(())
}
