// In: src/track_pipeline/planner.rs

//! The segment planner.
//!
//! For each track this module decides how it will be stored:
//! 1. Constant detection: a track whose samples span no more than its constant
//!    threshold is stored as one value.
//! 2. Partitioning: the samples of an animated track are split into contiguous
//!    segments. Each segment is quantized over its own `[min, min + extent]`
//!    range, so a segment covering a quiet stretch of the curve needs far fewer
//!    bits than one spanning a large swing.
//! 3. Bit-width selection and verification: the analytic width is checked
//!    against the real decoder arithmetic and raised until every sample of the
//!    segment reconstructs within the track precision.
//!
//! How boundaries are chosen depends on the `SegmentingProfile`.

use crate::bridge::format::SEGMENT_ENTRY_SIZE;
use crate::config::SegmentingProfile;
use crate::kernels::quantize::{self, MAX_QUANTIZED_BIT_WIDTH, RAW_BIT_WIDTH};
use crate::track_pipeline::builder::TrackDescriptor;

/// Segment length used by the `Fast` profile.
pub const FAST_SEGMENT_SAMPLES: usize = 16;
const BALANCED_MAX_SEGMENT_SAMPLES: usize = 64;
const HIGH_COMPRESSION_MAX_SEGMENT_SAMPLES: usize = 256;

/// Approximate storage cost of a segment's directory entry, in bits.
const SEGMENT_OVERHEAD_BITS: u64 = (SEGMENT_ENTRY_SIZE * 8) as u64;

//==================================================================================
// 1. Plan Types
//==================================================================================

/// The final encoding decision for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedSegment {
    pub start_sample: u32,
    pub num_samples: u32,
    pub range_min: f32,
    pub range_extent: f32,
    pub bit_width: u8,
}

impl PlannedSegment {
    pub fn sample_range(&self) -> std::ops::Range<usize> {
        let start = self.start_sample as usize;
        start..start + self.num_samples as usize
    }
}

/// The storage decision for one track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackPlan {
    Constant { value: f32 },
    Animated { segments: Vec<PlannedSegment> },
}

impl TrackPlan {
    pub fn num_segments(&self) -> usize {
        match self {
            TrackPlan::Constant { .. } => 0,
            TrackPlan::Animated { segments } => segments.len(),
        }
    }
}

//==================================================================================
// 2. Public Planning Entry Point
//==================================================================================

/// Plans the storage of one track's samples.
pub fn plan_track(samples: &[f32], descriptor: &TrackDescriptor, profile: SegmentingProfile) -> TrackPlan {
    if let Some(value) = detect_constant(samples, descriptor.constant_threshold) {
        log_metric!(
            "event" = "plan_track",
            "output_index" = descriptor.output_index,
            "outcome" = "constant"
        );
        return TrackPlan::Constant { value };
    }

    let boundaries = match profile {
        SegmentingProfile::Fast => partition_fixed(samples.len(), FAST_SEGMENT_SAMPLES),
        SegmentingProfile::Balanced => {
            partition_min_bits(samples, descriptor.precision, BALANCED_MAX_SEGMENT_SAMPLES)
        }
        SegmentingProfile::HighCompression => {
            partition_min_bits(samples, descriptor.precision, HIGH_COMPRESSION_MAX_SEGMENT_SAMPLES)
        }
    };

    let segments: Vec<PlannedSegment> = boundaries
        .into_iter()
        .map(|(start, len)| finalize_segment(samples, start, len, descriptor.precision))
        .collect();

    log_metric!(
        "event" = "plan_track",
        "output_index" = descriptor.output_index,
        "outcome" = "animated",
        "segments" = segments.len(),
        "data_bits" = segments
            .iter()
            .map(|s| s.num_samples as u64 * s.bit_width as u64)
            .sum::<u64>()
    );

    TrackPlan::Animated { segments }
}

//==================================================================================
// 3. Internal Helpers
//==================================================================================

/// Returns the value a track collapses to, if its samples span no more than
/// `threshold`. The midpoint of the span is used, which is exact for
/// zero-variance tracks.
pub(crate) fn detect_constant(samples: &[f32], threshold: f32) -> Option<f32> {
    let (min, max) = min_max(samples)?;
    if max - min <= threshold {
        Some(min + (max - min) * 0.5)
    } else {
        None
    }
}

fn min_max(samples: &[f32]) -> Option<(f32, f32)> {
    let first = *samples.first()?;
    Some(
        samples
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Splits `num_samples` into `(start, len)` windows of `segment_len`.
pub(crate) fn partition_fixed(num_samples: usize, segment_len: usize) -> Vec<(usize, usize)> {
    let segment_len = segment_len.max(1);
    (0..num_samples)
        .step_by(segment_len)
        .map(|start| (start, segment_len.min(num_samples - start)))
        .collect()
}

#[inline]
fn segment_cost_bits(num_samples: usize, bit_width: u8) -> u64 {
    SEGMENT_OVERHEAD_BITS + num_samples as u64 * bit_width as u64
}

/// Partitions `samples` into segments of at most `max_len` samples, minimizing
/// the estimated total size (segment overhead plus packed bits).
///
/// Dynamic programming over segment end positions: `best[e]` is the cheapest
/// encoding of `samples[..e]`, extended backwards one start position at a time
/// while the running min/max of the candidate segment is maintained.
pub(crate) fn partition_min_bits(samples: &[f32], precision: f32, max_len: usize) -> Vec<(usize, usize)> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let max_len = max_len.max(1);

    let mut best_cost = vec![u64::MAX; n + 1];
    let mut best_start = vec![0usize; n + 1];
    best_cost[0] = 0;

    for end in 1..=n {
        let mut lo = samples[end - 1];
        let mut hi = lo;
        let first_start = end.saturating_sub(max_len);
        for start in (first_start..end).rev() {
            let v = samples[start];
            lo = lo.min(v);
            hi = hi.max(v);

            let bits = quantize::estimate_bit_width(hi - lo, precision);
            let cost = best_cost[start].saturating_add(segment_cost_bits(end - start, bits));
            if cost < best_cost[end] {
                best_cost[end] = cost;
                best_start[end] = start;
            }
        }
    }

    // Walk the chosen boundaries back from the end.
    let mut boundaries = Vec::new();
    let mut end = n;
    while end > 0 {
        let start = best_start[end];
        boundaries.push((start, end - start));
        end = start;
    }
    boundaries.reverse();
    boundaries
}

/// Computes the range of a segment and the smallest bit width that keeps every
/// sample within `precision` under the decoder's own arithmetic.
pub(crate) fn finalize_segment(samples: &[f32], start: usize, len: usize, precision: f32) -> PlannedSegment {
    let values = &samples[start..start + len];
    let (range_min, range_max) = min_max(values).unwrap_or((0.0, 0.0));
    let range_extent = range_max - range_min;
    if !range_extent.is_finite() {
        // Span overflows f32; only raw storage can represent it.
        return PlannedSegment {
            start_sample: start as u32,
            num_samples: len as u32,
            range_min,
            range_extent: 0.0,
            bit_width: RAW_BIT_WIDTH,
        };
    }

    let mut bit_width = quantize::estimate_bit_width(range_extent, precision);
    while bit_width != RAW_BIT_WIDTH
        && quantize::max_reconstruction_error(values, range_min, range_extent, bit_width) > precision
    {
        bit_width = if bit_width >= MAX_QUANTIZED_BIT_WIDTH {
            RAW_BIT_WIDTH
        } else {
            bit_width + 1
        };
    }

    PlannedSegment {
        start_sample: start as u32,
        num_samples: len as u32,
        range_min,
        range_extent,
        bit_width,
    }
}
