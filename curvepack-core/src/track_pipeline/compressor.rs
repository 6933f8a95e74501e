// In: src/track_pipeline/compressor.rs

//! The compressor: the writer side of the blob format.
//!
//! `compress_track_list` plans every track, quantizes and bit-packs the
//! segments into scratch streams, sizes the blob, then obtains the output
//! buffer from the caller's allocator in one allocation and fills it. Every
//! failure path returns before a blob is handed out; the caller never sees a
//! partially written buffer.

use bytemuck::Pod;
use serde::Serialize;

use crate::alloc::CodecAllocator;
use crate::bridge::format::{
    data_section_offset, segment_table_offset, track_table_offset, RawHeader, RawSegmentEntry,
    RawTrackEntry, ALGORITHM_VERSION, HEADER_SIZE, SEGMENT_ENTRY_SIZE, TRACKS_MAGIC,
    TRACK_ENTRY_SIZE, TRACK_FLAG_CONSTANT, TRACK_TYPE_FLOAT1,
};
use crate::config::{CodecConfig, SegmentingProfile};
use crate::error::CurveCodecError;
use crate::kernels::{bitpack, quantize};
use crate::track_pipeline::artifact::{compute_content_hash, CompressedTracks};
use crate::track_pipeline::builder::TrackArray;
use crate::track_pipeline::error_metric::{calculate_compression_error, TrackError};
use crate::track_pipeline::planner::{plan_track, PlannedSegment, TrackPlan};

//==================================================================================
// 1. Settings & Stats
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub profile: SegmentingProfile,
    /// Measure the reconstruction error after compression.
    pub compute_error: bool,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            profile: SegmentingProfile::default(),
            compute_error: true,
        }
    }
}

impl From<&CodecConfig> for CompressionSettings {
    fn from(config: &CodecConfig) -> Self {
        Self {
            profile: config.profile,
            compute_error: config.compute_error_diagnostics,
        }
    }
}

/// A summary of one compression pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompressionStats {
    pub total_size: usize,
    /// Header plus track and segment tables.
    pub header_size: usize,
    pub data_size: usize,
    pub num_tracks: u32,
    pub num_constant_tracks: u32,
    pub num_animated_tracks: u32,
    pub num_segments: u32,
    /// Present when `CompressionSettings::compute_error` was set.
    pub error: Option<TrackError>,
}

impl CompressionStats {
    pub fn to_json(&self) -> Result<String, CurveCodecError> {
        Ok(serde_json::to_string(self)?)
    }
}

//==================================================================================
// 2. Public Entry Point
//==================================================================================

/// Compresses `tracks` into a single blob allocated from `allocator`.
///
/// Ownership of the returned blob's buffer passes to the caller, who gives it
/// back through `CodecAllocator::deallocate` (via `CompressedTracks::into_buffer`)
/// once the bytes have been persisted.
pub fn compress_track_list<A>(
    allocator: &mut A,
    tracks: &TrackArray,
    settings: &CompressionSettings,
) -> Result<(CompressedTracks, CompressionStats), CurveCodecError>
where
    A: CodecAllocator + ?Sized,
{
    tracks.validate()?;

    // --- Plan and pack into scratch streams ---
    let mut encoded = Vec::with_capacity(tracks.len());
    for track in tracks.tracks() {
        let plan = plan_track(&track.samples, &track.descriptor, settings.profile);
        let streams = match &plan {
            TrackPlan::Constant { .. } => Vec::new(),
            TrackPlan::Animated { segments } => segments
                .iter()
                .map(|seg| pack_segment(&track.samples, seg))
                .collect::<Result<Vec<_>, _>>()?,
        };
        encoded.push((plan, streams));
    }

    // --- Size the blob ---
    let num_tracks = tracks.len();
    let num_segments: usize = encoded.iter().map(|(plan, _)| plan.num_segments()).sum();
    let header_size = data_section_offset(num_tracks, num_segments);
    let data_size: usize = encoded
        .iter()
        .flat_map(|(_, streams)| streams.iter().map(Vec::len))
        .sum();
    let total_size = header_size + data_size;
    if total_size > u32::MAX as usize {
        return Err(CurveCodecError::Configuration(format!(
            "compressed size {} exceeds the format's u32 limit",
            total_size
        )));
    }

    // --- Fill the single output allocation ---
    let mut buffer = allocator.allocate(total_size)?;
    if buffer.len() != total_size {
        let got = buffer.len();
        allocator.deallocate(buffer);
        return Err(CurveCodecError::Allocation(format!(
            "allocator returned {} bytes, {} requested",
            got, total_size
        )));
    }

    let seg_table = segment_table_offset(num_tracks);
    let mut segment_cursor = 0usize;
    let mut data_cursor = 0usize;
    let mut num_constant_tracks = 0u32;

    for (t, (track, (plan, streams))) in tracks.tracks().iter().zip(&encoded).enumerate() {
        let desc = &track.descriptor;
        let entry = match plan {
            TrackPlan::Constant { value } => {
                num_constant_tracks += 1;
                RawTrackEntry {
                    output_index: desc.output_index,
                    flags: TRACK_FLAG_CONSTANT,
                    precision: desc.precision,
                    constant_value: *value,
                    first_segment: segment_cursor as u32,
                    num_segments: 0,
                }
            }
            TrackPlan::Animated { segments } => {
                let first_segment = segment_cursor as u32;
                for (seg, stream) in segments.iter().zip(streams) {
                    let record = RawSegmentEntry {
                        start_sample: seg.start_sample,
                        num_samples: seg.num_samples,
                        range_min: seg.range_min,
                        range_extent: seg.range_extent,
                        data_offset: data_cursor as u32,
                        bit_width: seg.bit_width,
                        padding: [0; 3],
                    };
                    write_record(&mut buffer, seg_table + segment_cursor * SEGMENT_ENTRY_SIZE, &record);
                    let start = header_size + data_cursor;
                    buffer[start..start + stream.len()].copy_from_slice(stream);
                    data_cursor += stream.len();
                    segment_cursor += 1;
                }
                RawTrackEntry {
                    output_index: desc.output_index,
                    flags: 0,
                    precision: desc.precision,
                    constant_value: 0.0,
                    first_segment,
                    num_segments: segments.len() as u32,
                }
            }
        };
        write_record(&mut buffer, track_table_offset() + t * TRACK_ENTRY_SIZE, &entry);
    }

    let mut header = RawHeader {
        magic: *TRACKS_MAGIC,
        algorithm_version: ALGORITHM_VERSION,
        track_type: TRACK_TYPE_FLOAT1,
        total_size: total_size as u32,
        content_hash: 0,
        num_tracks: num_tracks as u32,
        num_samples: tracks.num_samples_per_track() as u32,
        sample_rate: tracks.sample_rate(),
        num_segments: num_segments as u32,
    };
    header.content_hash = compute_content_hash(&buffer[HEADER_SIZE..]);
    write_record(&mut buffer, 0, &header);

    let blob = CompressedTracks::from_buffer_unchecked(buffer);
    if !blob.is_valid(true) {
        allocator.deallocate(blob.into_buffer());
        return Err(CurveCodecError::CorruptBlob(
            "compressor produced a blob that fails validation".into(),
        ));
    }

    // --- Diagnostics ---
    let error = if settings.compute_error {
        match calculate_compression_error(tracks, &blob) {
            Ok(error) => Some(error),
            Err(e) => {
                allocator.deallocate(blob.into_buffer());
                return Err(e);
            }
        }
    } else {
        None
    };

    let stats = CompressionStats {
        total_size,
        header_size,
        data_size,
        num_tracks: num_tracks as u32,
        num_constant_tracks,
        num_animated_tracks: num_tracks as u32 - num_constant_tracks,
        num_segments: num_segments as u32,
        error,
    };

    log::debug!(
        "Compressed {} curve tracks ({} constant, {} segments) into {} bytes",
        stats.num_tracks,
        stats.num_constant_tracks,
        stats.num_segments,
        stats.total_size
    );
    if let Some(err) = &stats.error {
        log::debug!(
            "Max compression error: {} (curve {} @ {:.3})",
            err.error,
            err.output_index,
            err.sample_time
        );
        if err.exceeds_precision() {
            let breach = &err.worst_relative;
            log::warn!(
                "Compression error {} on curve {} @ {:.3} exceeds its precision {}",
                breach.error,
                breach.output_index,
                breach.sample_time,
                breach.precision
            );
        }
    }

    Ok((blob, stats))
}

//==================================================================================
// 3. Internal Helpers
//==================================================================================

/// Quantizes and bit-packs one planned segment. Zero-width segments carry no data.
fn pack_segment(samples: &[f32], seg: &PlannedSegment) -> Result<Vec<u8>, CurveCodecError> {
    let mut stream = Vec::new();
    if seg.bit_width == 0 {
        return Ok(stream);
    }
    let quantized: Vec<u32> = samples[seg.sample_range()]
        .iter()
        .map(|&v| quantize::quantize(v, seg.range_min, seg.range_extent, seg.bit_width))
        .collect();
    bitpack::encode(&quantized, &mut stream, seg.bit_width)?;
    Ok(stream)
}

fn write_record<T: Pod>(buffer: &mut [u8], offset: usize, record: &T) {
    let bytes = bytemuck::bytes_of(record);
    buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
}
