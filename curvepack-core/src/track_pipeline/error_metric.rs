// In: src/track_pipeline/error_metric.rs

//! Post-compression error diagnostics.
//!
//! The blob is decoded sample by sample through a regular
//! `DecompressionContext`, so the measured error is exactly what playback sees.

use serde::Serialize;

use crate::decompression::{DecompressionContext, SampleRoundingPolicy, ScalarCurveWriter};
use crate::error::CurveCodecError;
use crate::track_pipeline::artifact::CompressedTracks;
use crate::track_pipeline::builder::TrackArray;

/// The worst reconstruction error of a compressed track list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrackError {
    pub error: f32,
    /// Output index of the track where `error` occurred.
    pub output_index: u32,
    pub sample_time: f32,
    /// Precision that track was compressed with.
    pub precision: f32,
    /// Largest error over every track, measured against that track's own precision.
    pub worst_relative: RelativeError,
}

/// An error paired with the precision of the track it occurred on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RelativeError {
    pub error: f32,
    pub output_index: u32,
    pub sample_time: f32,
    pub precision: f32,
}

impl RelativeError {
    pub fn ratio(&self) -> f32 {
        self.error / self.precision
    }
}

impl TrackError {
    /// True when any track breaks its own precision, not only the one with the
    /// largest absolute error.
    pub fn exceeds_precision(&self) -> bool {
        self.worst_relative.error > self.worst_relative.precision
    }
}

/// Measures the largest absolute difference between every original sample in
/// `tracks` and its decoded counterpart in `compressed`.
///
/// `tracks` must be the list `compressed` was built from, in the same order.
pub fn calculate_compression_error(
    tracks: &TrackArray,
    compressed: &CompressedTracks,
) -> Result<TrackError, CurveCodecError> {
    let mut context = DecompressionContext::initialize(compressed)?;
    if context.num_tracks() as usize != tracks.len() {
        return Err(CurveCodecError::Configuration(format!(
            "compressed blob holds {} tracks, {} raw tracks supplied",
            context.num_tracks(),
            tracks.len()
        )));
    }

    let inv_sample_rate = 1.0 / context.sample_rate();
    let mut worst = TrackError::default();
    let mut worst_ratio = 0.0f32;
    for sample in 0..tracks.num_samples_per_track() {
        let sample_time = sample as f32 * inv_sample_rate;
        context.seek(sample_time, SampleRoundingPolicy::Nearest);

        for (index, track) in tracks.tracks().iter().enumerate() {
            let mut writer = ScalarCurveWriter::new();
            context.decompress_track(index as u32, &mut writer)?;
            let error = (writer.value() - track.samples[sample]).abs();
            let precision = track.descriptor.precision;
            if error > worst.error {
                worst.error = error;
                worst.output_index = track.descriptor.output_index;
                worst.sample_time = sample_time;
                worst.precision = precision;
            }
            // Precisions are validated positive before compression.
            let ratio = error / precision;
            if ratio > worst_ratio {
                worst_ratio = ratio;
                worst.worst_relative = RelativeError {
                    error,
                    output_index: track.descriptor.output_index,
                    sample_time,
                    precision,
                };
            }
        }
    }
    Ok(worst)
}
