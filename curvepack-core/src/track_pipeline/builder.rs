// In: src/track_pipeline/builder.rs

//! Turns arbitrary curves into uniformly sampled tracks ready for compression.

use crate::error::CurveCodecError;
use crate::track_pipeline::precision::PrecisionSpec;
use crate::traits::CurveEvaluator;

/// Sample rate used when a sequence has no meaningful duration (a static pose,
/// or a single frame). The format still needs one.
pub const FALLBACK_SAMPLE_RATE: f32 = 30.0;
/// Sequences shorter than this are treated as static.
pub const MIN_SEQUENCE_LENGTH: f32 = 0.0001;

/// Where a track's decoded values go, and how precisely it must be stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackDescriptor {
    /// Index handed to the track writer on decompression; lets the caller map
    /// compressed tracks back onto its own curve ordering.
    pub output_index: u32,
    pub precision: f32,
    pub constant_threshold: f32,
}

impl TrackDescriptor {
    pub fn new(output_index: u32, spec: PrecisionSpec) -> Self {
        Self {
            output_index,
            precision: spec.precision,
            constant_threshold: spec.constant_threshold,
        }
    }
}

/// One curve resampled at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTrack {
    pub descriptor: TrackDescriptor,
    pub sample_rate: f32,
    pub samples: Vec<f32>,
}

impl UniformTrack {
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }
}

/// Sample rate for `num_samples` frames spread over `sequence_length` seconds.
pub fn compute_sample_rate(num_samples: usize, sequence_length: f32) -> f32 {
    let is_static_pose = num_samples <= 1 || sequence_length < MIN_SEQUENCE_LENGTH;
    if is_static_pose {
        FALLBACK_SAMPLE_RATE
    } else {
        (num_samples - 1) as f32 / sequence_length
    }
}

/// Samples `evaluator` at `num_samples` uniformly spaced times over
/// `[0, sequence_length]`.
pub fn build_uniform_track<E>(
    evaluator: &E,
    descriptor: TrackDescriptor,
    num_samples: usize,
    sequence_length: f32,
) -> UniformTrack
where
    E: CurveEvaluator + ?Sized,
{
    let sample_rate = compute_sample_rate(num_samples, sequence_length);
    let inv_sample_rate = 1.0 / sample_rate;
    let max_time = sequence_length.max(0.0);

    let samples = (0..num_samples)
        .map(|i| {
            let sample_time = (i as f32 * inv_sample_rate).clamp(0.0, max_time);
            evaluator.eval(sample_time)
        })
        .collect();

    UniformTrack {
        descriptor,
        sample_rate,
        samples,
    }
}

/// A set of uniform tracks compressed together into one blob.
#[derive(Debug, Clone, Default)]
pub struct TrackArray {
    tracks: Vec<UniformTrack>,
}

impl TrackArray {
    pub fn new(tracks: Vec<UniformTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[UniformTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Samples per track. Only meaningful once `validate` has passed.
    pub fn num_samples_per_track(&self) -> usize {
        self.tracks.first().map_or(0, |t| t.num_samples())
    }

    pub fn sample_rate(&self) -> f32 {
        self.tracks.first().map_or(FALLBACK_SAMPLE_RATE, |t| t.sample_rate)
    }

    /// Checks the structural requirements of the compressor: at least one track,
    /// identical non-zero sample counts and sample rates, positive tolerances,
    /// finite samples and output indices that fit the format.
    pub fn validate(&self) -> Result<(), CurveCodecError> {
        let first = self.tracks.first().ok_or_else(|| {
            CurveCodecError::Configuration("cannot compress an empty track list".into())
        })?;

        let num_samples = first.num_samples();
        if num_samples == 0 {
            return Err(CurveCodecError::Configuration(
                "tracks must contain at least one sample".into(),
            ));
        }
        if num_samples > u32::MAX as usize || self.tracks.len() > u32::MAX as usize {
            return Err(CurveCodecError::Configuration(
                "track list exceeds the format's u32 limits".into(),
            ));
        }
        if !(first.sample_rate.is_finite() && first.sample_rate > 0.0) {
            return Err(CurveCodecError::Configuration(format!(
                "invalid sample rate {}",
                first.sample_rate
            )));
        }

        for (index, track) in self.tracks.iter().enumerate() {
            if track.num_samples() != num_samples {
                return Err(CurveCodecError::Configuration(format!(
                    "track {} has {} samples, expected {}",
                    index,
                    track.num_samples(),
                    num_samples
                )));
            }
            if track.sample_rate != first.sample_rate {
                return Err(CurveCodecError::Configuration(format!(
                    "track {} has sample rate {}, expected {}",
                    index, track.sample_rate, first.sample_rate
                )));
            }
            let desc = &track.descriptor;
            crate::config::check_positive("precision", desc.precision)?;
            crate::config::check_positive("constant_threshold", desc.constant_threshold)?;
            if let Some(i) = track.samples.iter().position(|v| !v.is_finite()) {
                return Err(CurveCodecError::Configuration(format!(
                    "track {} sample {} is not finite",
                    index, i
                )));
            }
        }
        Ok(())
    }
}
