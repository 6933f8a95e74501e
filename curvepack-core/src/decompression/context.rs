// In: src/decompression/context.rs

//! Random-access decoding of a compressed blob.
//!
//! A `DecompressionContext` borrows one validated blob and is positioned with
//! `seek`. Seeking resolves the two samples bracketing the requested time, the
//! interpolation factor between them, and, for every animated track, the segment
//! holding each of those samples. Decoding then costs two bit-unpacks and one
//! lerp per track, no matter where or in which order the caller seeks.

use serde::{Deserialize, Serialize};

use crate::bridge::format::{RawSegmentEntry, RawTrackEntry};
use crate::decompression::writer::TrackWriter;
use crate::error::CurveCodecError;
use crate::kernels::{bitpack, quantize};
use crate::track_pipeline::artifact::{validate_blob, BlobView, CompressedTracks};

/// How a seek time between two samples is resolved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SampleRoundingPolicy {
    /// Interpolate linearly between the bracketing samples.
    #[default]
    None,
    /// Snap to the earlier sample.
    Floor,
    /// Snap to the later sample.
    Ceil,
    /// Snap to the closer sample.
    Nearest,
}

/// The segments holding the two bracketing samples of one animated track.
#[derive(Debug, Clone, Copy, Default)]
struct ActiveSegments {
    key0: u32,
    key1: u32,
}

pub struct DecompressionContext<'a> {
    view: BlobView<'a>,
    time: f32,
    key0: u32,
    key1: u32,
    alpha: f32,
    /// Indexed by compressed track index. Unused for constant tracks.
    active: Vec<ActiveSegments>,
}

impl<'a> DecompressionContext<'a> {
    /// Binds a context to `tracks`, positioned at time 0.
    pub fn initialize(tracks: &'a CompressedTracks) -> Result<Self, CurveCodecError> {
        Self::from_bytes(tracks.as_bytes())
    }

    /// Binds a context to raw blob bytes. The blob is validated structurally
    /// (the content hash is not checked) and rejected with `CorruptBlob` on any
    /// inconsistency.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, CurveCodecError> {
        validate_blob(bytes, false)?;
        let view = BlobView::new_unchecked(bytes);
        let mut context = Self {
            view,
            time: 0.0,
            key0: 0,
            key1: 0,
            alpha: 0.0,
            active: vec![ActiveSegments::default(); view.num_tracks()],
        };
        context.seek(0.0, SampleRoundingPolicy::None);
        Ok(context)
    }

    pub fn num_tracks(&self) -> u32 {
        self.view.header().num_tracks
    }

    pub fn num_samples(&self) -> u32 {
        self.view.header().num_samples
    }

    pub fn sample_rate(&self) -> f32 {
        self.view.header().sample_rate
    }

    /// Time of the last sample, in seconds.
    pub fn duration(&self) -> f32 {
        self.view.duration()
    }

    /// The clamped time of the last seek.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Output index of the track at compressed index `track_index`.
    pub fn output_index(&self, track_index: u32) -> Option<u32> {
        (track_index < self.num_tracks()).then(|| self.view.track(track_index as usize).output_index)
    }

    /// Compressed index of the track with this output index.
    pub fn find_track(&self, output_index: u32) -> Option<u32> {
        (0..self.view.num_tracks())
            .find(|&i| self.view.track(i).output_index == output_index)
            .map(|i| i as u32)
    }

    /// Positions the context at `time`, clamped to `[0, duration]`.
    pub fn seek(&mut self, time: f32, policy: SampleRoundingPolicy) {
        let duration = self.duration();
        // `max` discards NaN.
        let time = time.max(0.0).min(duration);
        let last_sample = self.num_samples() - 1;

        let position = time * self.sample_rate();
        let key0 = (position.floor() as u32).min(last_sample);
        let key1 = (key0 + 1).min(last_sample);
        let raw_alpha = if key0 == key1 {
            0.0
        } else {
            (position - key0 as f32).clamp(0.0, 1.0)
        };
        let alpha = match policy {
            SampleRoundingPolicy::None => raw_alpha,
            SampleRoundingPolicy::Floor => 0.0,
            SampleRoundingPolicy::Ceil => {
                if raw_alpha > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            SampleRoundingPolicy::Nearest => raw_alpha.round(),
        };

        self.time = time;
        self.key0 = key0;
        self.key1 = key1;
        self.alpha = alpha;

        for (t, active) in self.active.iter_mut().enumerate() {
            let entry = self.view.track(t);
            if entry.is_constant() {
                continue;
            }
            active.key0 = find_segment(&self.view, &entry, key0);
            active.key1 = if key1 == key0 {
                active.key0
            } else {
                find_segment(&self.view, &entry, key1)
            };
        }
    }

    /// Decodes every track at the current position.
    pub fn decompress_tracks<W: TrackWriter + ?Sized>(&self, writer: &mut W) -> Result<(), CurveCodecError> {
        for t in 0..self.view.num_tracks() {
            let entry = self.view.track(t);
            let value = self.decode(t, &entry)?;
            writer.write_float1(entry.output_index, value);
        }
        Ok(())
    }

    /// Decodes the track at compressed index `track_index` at the current position.
    pub fn decompress_track<W: TrackWriter + ?Sized>(
        &self,
        track_index: u32,
        writer: &mut W,
    ) -> Result<(), CurveCodecError> {
        let count = self.num_tracks();
        if track_index >= count {
            return Err(CurveCodecError::TrackIndexOutOfBounds {
                index: track_index,
                count,
            });
        }
        let entry = self.view.track(track_index as usize);
        let value = self.decode(track_index as usize, &entry)?;
        writer.write_float1(entry.output_index, value);
        Ok(())
    }

    fn decode(&self, track: usize, entry: &RawTrackEntry) -> Result<f32, CurveCodecError> {
        if entry.is_constant() {
            return Ok(entry.constant_value);
        }
        let active = self.active[track];
        let v0 = self.sample_value(active.key0, self.key0)?;
        if self.alpha == 0.0 {
            return Ok(v0);
        }
        let v1 = self.sample_value(active.key1, self.key1)?;
        if self.alpha == 1.0 {
            return Ok(v1);
        }
        Ok(v0 + (v1 - v0) * self.alpha)
    }

    fn sample_value(&self, segment_index: u32, sample: u32) -> Result<f32, CurveCodecError> {
        let seg: RawSegmentEntry = self.view.segment(segment_index as usize);
        let local = (sample - seg.start_sample) as usize;
        let packed = &self.view.data()[seg.data_offset as usize..];
        let quantized = bitpack::read_one(packed, local, seg.bit_width)?;
        Ok(quantize::dequantize(
            quantized,
            seg.range_min,
            seg.range_extent,
            seg.bit_width,
        ))
    }
}

/// Absolute index of the segment of `entry` that holds `sample`.
///
/// Segments are sorted by start sample and the first starts at 0, so this is the
/// last segment whose start does not exceed `sample`.
fn find_segment(view: &BlobView<'_>, entry: &RawTrackEntry, sample: u32) -> u32 {
    let mut lo = entry.first_segment;
    let mut hi = entry.first_segment + entry.num_segments;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if view.segment(mid as usize).start_sample <= sample {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}
