// In: src/bridge/stateless_api.rs

use serde::Serialize;

use crate::alloc::{CodecAllocator, HeapAllocator};
use crate::bridge::codec::{CompressedCurveSequence, CompressibleCurveData};
use crate::config::CodecConfig;
use crate::decompression::{DecompressionContext, NamedCurveWriter, SampleRoundingPolicy, ScalarCurveWriter};
use crate::error::CurveCodecError;
use crate::track_pipeline::artifact::{CompressedTracks, HeaderInfo, TrackSummary};
use crate::track_pipeline::builder::{build_uniform_track, TrackArray, TrackDescriptor};
use crate::track_pipeline::compressor::{compress_track_list, CompressionSettings};
use crate::track_pipeline::precision::resolve_curve_precisions;
use crate::traits::MorphTargetSource;
use crate::types::{BlendedCurves, CurveName, CurveUid, TrackNameTable};

/// Result of `analyze_compressed_tracks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlobAnalysis {
    pub info: HeaderInfo,
    pub tracks: Vec<TrackSummary>,
}

/// Compresses a set of named curves into a blob plus its track name table.
///
/// Curve `i` becomes the track with output index `i`. An empty curve set yields
/// an empty sequence. The whole set succeeds or fails together.
pub fn compress_curves(
    data: &CompressibleCurveData,
    config: &CodecConfig,
    morph_targets: Option<&dyn MorphTargetSource>,
) -> Result<CompressedCurveSequence, CurveCodecError> {
    if data.curves.is_empty() {
        return Ok(CompressedCurveSequence::default());
    }
    config.validate()?;

    // 1. Resolve a tolerance per curve.
    let names: Vec<&CurveName> = data.curves.iter().map(|c| &c.name).collect();
    let overrides: Vec<Option<f32>> = data.curves.iter().map(|c| c.precision_override).collect();
    let precisions = resolve_curve_precisions(&names, &overrides, morph_targets, config)?;

    // 2. Resample every curve onto the shared uniform grid.
    let tracks = data
        .curves
        .iter()
        .zip(precisions)
        .enumerate()
        .map(|(i, (curve, spec))| {
            build_uniform_track(
                curve.evaluator.as_ref(),
                TrackDescriptor::new(i as u32, spec),
                data.num_frames,
                data.sequence_length,
            )
        })
        .collect();

    // 3. Compress, copy the bytes out and hand the buffer back.
    let mut allocator = HeapAllocator;
    let (blob, stats) = compress_track_list(&mut allocator, &TrackArray::new(tracks), &CompressionSettings::from(config))?;
    let compressed_bytes = blob.as_bytes().to_vec();
    allocator.deallocate(blob.into_buffer());

    log::debug!(
        "Compressed {} curves over {} frames: {} bytes",
        data.curves.len(),
        data.num_frames,
        stats.total_size
    );

    Ok(CompressedCurveSequence {
        compressed_bytes,
        curve_names: TrackNameTable::new(names.into_iter().cloned().collect()),
    })
}

/// Decodes every curve at `time` into `curves`, skipping curves it has not enabled.
/// An empty name table is a no-op. A blob that does not match a non-empty name
/// table, including a missing blob, is `CorruptBlob`.
pub fn decompress_all(
    compressed_bytes: &[u8],
    names: &TrackNameTable,
    time: f32,
    curves: &mut BlendedCurves,
) -> Result<(), CurveCodecError> {
    if names.is_empty() {
        return Ok(());
    }
    let mut context = bind_context(compressed_bytes, names)?;
    context.seek(time, SampleRoundingPolicy::None);
    context.decompress_tracks(&mut NamedCurveWriter::new(names, curves))
}

/// Decodes the curve `uid` at `time`. Returns 0.0 when the curve was not compressed.
///
/// The blob is bound and checked against `names` before the lookup, so a corrupt
/// blob is reported even when `uid` is absent.
pub fn decompress_one(
    compressed_bytes: &[u8],
    names: &TrackNameTable,
    uid: CurveUid,
    time: f32,
) -> Result<f32, CurveCodecError> {
    if names.is_empty() {
        return Ok(0.0);
    }
    let mut context = bind_context(compressed_bytes, names)?;
    let Some(track_index) = names.find(uid).and_then(|index| context.find_track(index)) else {
        return Ok(0.0);
    };
    context.seek(time, SampleRoundingPolicy::None);
    let mut writer = ScalarCurveWriter::new();
    context.decompress_track(track_index, &mut writer)?;
    Ok(writer.value())
}

/// Validates a blob, content hash included, and summarizes its contents
/// without decoding any samples.
pub fn analyze_compressed_tracks(compressed_bytes: &[u8]) -> Result<BlobAnalysis, CurveCodecError> {
    let blob = CompressedTracks::from_bytes(compressed_bytes)?;
    Ok(BlobAnalysis {
        info: CompressedTracks::peek_info(blob.as_bytes())?,
        tracks: blob.track_summaries(),
    })
}

/// Opens a context and checks that `names` describes exactly the blob's tracks:
/// same count, every output index in range and used once.
fn bind_context<'a>(
    compressed_bytes: &'a [u8],
    names: &TrackNameTable,
) -> Result<DecompressionContext<'a>, CurveCodecError> {
    let context = DecompressionContext::from_bytes(compressed_bytes)?;
    let num_tracks = context.num_tracks() as usize;
    if num_tracks != names.len() {
        return Err(CurveCodecError::CorruptBlob(format!(
            "blob holds {} tracks but the name table lists {} curves",
            num_tracks,
            names.len()
        )));
    }

    let mut seen = vec![false; num_tracks];
    for track in 0..context.num_tracks() {
        let output_index = context.output_index(track).unwrap_or(u32::MAX) as usize;
        match seen.get_mut(output_index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(CurveCodecError::CorruptBlob(format!(
                    "track {} has invalid or duplicate output index {}",
                    track, output_index
                )))
            }
        }
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::codec::RawCurve;

    #[test]
    fn test_analyze_after_compression() {
        // 1. Arrange: two curves, one of them constant.
        let data = CompressibleCurveData {
            curves: vec![
                RawCurve::new(CurveName::new(1, "wave"), |t: f32| (t * 4.0).sin()),
                RawCurve::new(CurveName::new(2, "flat"), |_t: f32| 1.0),
            ],
            num_frames: 91,
            sequence_length: 3.0,
        };

        // 2. Act: compress, then analyze the raw bytes.
        let sequence = compress_curves(&data, &CodecConfig::default(), None).unwrap();
        let analysis = analyze_compressed_tracks(&sequence.compressed_bytes).unwrap();

        // 3. Assert: the summary matches what went in.
        assert_eq!(analysis.info.total_size, sequence.compressed_bytes.len());
        assert_eq!(analysis.info.header_size + analysis.info.data_size, analysis.info.total_size);
        assert_eq!(analysis.info.num_tracks, 2);
        assert_eq!(analysis.info.num_samples, 91);
        assert_eq!(analysis.info.num_constant_tracks, 1);
        assert!((analysis.info.duration - 3.0).abs() < 1.0e-5);
        assert!(!analysis.tracks[0].is_constant);
        assert!(analysis.tracks[0].avg_bits_per_sample > 0.0);
        assert!(analysis.tracks[1].is_constant);
        assert_eq!(analysis.tracks[1].data_bytes, 0);
    }

    #[test]
    fn test_name_table_mismatch_is_corruption() {
        let data = CompressibleCurveData {
            curves: vec![RawCurve::new(CurveName::new(1, "a"), |t: f32| t)],
            num_frames: 10,
            sequence_length: 1.0,
        };
        let sequence = compress_curves(&data, &CodecConfig::default(), None).unwrap();
        let wrong_names = TrackNameTable::new(vec![CurveName::new(1, "a"), CurveName::new(2, "b")]);

        let mut curves = BlendedCurves::new();
        let result = decompress_all(&sequence.compressed_bytes, &wrong_names, 0.5, &mut curves);
        assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));
        assert!(curves.is_empty());
    }

    #[test]
    fn test_missing_or_corrupt_blob_with_names_is_corruption() {
        let data = CompressibleCurveData {
            curves: vec![
                RawCurve::new(CurveName::new(1, "a"), |t: f32| t),
                RawCurve::new(CurveName::new(2, "b"), |t: f32| 1.0 - t),
            ],
            num_frames: 10,
            sequence_length: 1.0,
        };
        let sequence = compress_curves(&data, &CodecConfig::default(), None).unwrap();
        let names = &sequence.curve_names;

        // Names without a blob.
        let mut curves = BlendedCurves::new();
        let result = decompress_all(&[], names, 0.5, &mut curves);
        assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));
        assert!(curves.is_empty());
        let result = decompress_one(&[], names, CurveUid(1), 0.5);
        assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));

        // A damaged blob fails even for a curve that was never compressed.
        let mut damaged = sequence.compressed_bytes.clone();
        damaged[0] ^= 0xFF;
        let result = decompress_one(&damaged, names, CurveUid(999), 0.5);
        assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));

        // An intact blob still answers absent curves with 0.0.
        assert_eq!(decompress_one(&sequence.compressed_bytes, names, CurveUid(999), 0.5).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_name_table_is_a_no_op() {
        let empty = TrackNameTable::default();
        let mut curves = BlendedCurves::new();
        decompress_all(&[], &empty, 0.5, &mut curves).unwrap();
        assert!(curves.is_empty());
        assert_eq!(decompress_one(&[], &empty, CurveUid(1), 0.5).unwrap(), 0.0);
    }
}
