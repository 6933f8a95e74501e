use super::*;
use crate::config::{CodecConfig, SegmentingProfile};
use crate::decompression::{DecompressionContext, SampleRoundingPolicy, ScalarCurveWriter};
use crate::error::CurveCodecError;
use crate::traits::CurveEvaluator;
use crate::types::{BlendedCurves, CurveKey, CurveName, CurveUid, KeyframedCurve, MorphTargetSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const NUM_FRAMES: usize = 61;
const SEQUENCE_LENGTH: f32 = 2.0;

// Test Helpers
fn sine(t: f32) -> f32 {
    (t * 5.0).sin() * 2.0
}

fn step(t: f32) -> f32 {
    if t < 1.0 {
        -0.5
    } else {
        0.75
    }
}

fn test_curves() -> Vec<RawCurve> {
    vec![
        RawCurve::new(CurveName::new(100, "sine"), sine),
        RawCurve::new(CurveName::new(200, "step"), step),
        RawCurve::new(CurveName::new(300, "constant"), |_t: f32| 0.3),
    ]
}

fn curve_data(curves: Vec<RawCurve>) -> CompressibleCurveData {
    CompressibleCurveData {
        curves,
        num_frames: NUM_FRAMES,
        sequence_length: SEQUENCE_LENGTH,
    }
}

fn codec_with_precision(precision: f32) -> CurveCompressionCodec {
    CurveCompressionCodec::new(Arc::new(CodecConfig {
        curve_precision: precision,
        ..CodecConfig::default()
    }))
}

/// Sample times exactly as the track builder computes them.
fn sample_times(num_frames: usize, sequence_length: f32) -> Vec<f32> {
    let inv_sample_rate = 1.0 / ((num_frames - 1) as f32 / sequence_length);
    (0..num_frames)
        .map(|i| (i as f32 * inv_sample_rate).min(sequence_length))
        .collect()
}

fn slack(value: f32) -> f32 {
    1.0e-5 * value.abs().max(1.0)
}

#[test]
fn test_round_trip_within_precision_at_samples_and_between() {
    let times = sample_times(NUM_FRAMES, SEQUENCE_LENGTH);
    let evaluators: [(u32, fn(f32) -> f32); 3] = [(100, sine), (200, step), (300, |_| 0.3)];

    for precision in [0.01f32, 0.001, 0.0001] {
        for profile in [
            SegmentingProfile::Fast,
            SegmentingProfile::Balanced,
            SegmentingProfile::HighCompression,
        ] {
            let codec = CurveCompressionCodec::new(Arc::new(CodecConfig {
                curve_precision: precision,
                profile,
                ..CodecConfig::default()
            }));
            let sequence = codec.compress(&curve_data(test_curves())).unwrap();

            for (uid, f) in evaluators {
                // At every sample.
                for &t in &times {
                    let decoded = codec.decompress_curve(&sequence, CurveUid(uid), t).unwrap();
                    let raw = f(t);
                    assert!(
                        (decoded - raw).abs() <= precision + slack(raw),
                        "curve {} at {} ({:?}, precision {}): {} vs {}",
                        uid, t, profile, precision, decoded, raw
                    );
                }
                // Halfway between samples, against the interpolated raw samples.
                for pair in times.windows(2) {
                    let t = (pair[0] + pair[1]) * 0.5;
                    let decoded = codec.decompress_curve(&sequence, CurveUid(uid), t).unwrap();
                    let expected = (f(pair[0]) + f(pair[1])) * 0.5;
                    assert!(
                        (decoded - expected).abs() <= precision + slack(expected),
                        "curve {} between samples at {}: {} vs {}",
                        uid, t, decoded, expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_constant_curves_collapse_and_decode_exactly() {
    for precision in [0.1f32, 0.001, 1.0e-6] {
        for profile in [
            SegmentingProfile::Fast,
            SegmentingProfile::Balanced,
            SegmentingProfile::HighCompression,
        ] {
            let codec = CurveCompressionCodec::new(Arc::new(CodecConfig {
                curve_precision: precision,
                profile,
                ..CodecConfig::default()
            }));
            let curves = vec![
                RawCurve::new(CurveName::new(1, "flat"), |_t: f32| 0.5),
                RawCurve::new(CurveName::new(2, "flat_odd"), |_t: f32| -0.123_456_7),
            ];
            let sequence = codec.compress(&curve_data(curves)).unwrap();

            let analysis = analyze_compressed_tracks(&sequence.compressed_bytes).unwrap();
            assert_eq!(analysis.info.num_constant_tracks, 2, "{:?} precision {}", profile, precision);
            assert_eq!(analysis.info.num_segments, 0);
            assert_eq!(analysis.info.data_size, 0);

            for t in [0.0, 0.37, 1.5, 2.0] {
                assert_eq!(codec.decompress_curve(&sequence, CurveUid(1), t).unwrap(), 0.5);
                assert_eq!(codec.decompress_curve(&sequence, CurveUid(2), t).unwrap(), -0.123_456_7);
            }
        }
    }

    // Wobbling by less than the precision also collapses.
    let codec = codec_with_precision(0.001);
    let curves = vec![RawCurve::new(CurveName::new(1, "wobble"), |t: f32| 0.5 + 0.0004 * t.sin())];
    let sequence = codec.compress(&curve_data(curves)).unwrap();
    let analysis = analyze_compressed_tracks(&sequence.compressed_bytes).unwrap();
    assert_eq!(analysis.info.num_constant_tracks, 1);
    for t in [0.0, 0.37, 1.5, 2.0] {
        let wobble = codec.decompress_curve(&sequence, CurveUid(1), t).unwrap();
        assert!((wobble - (0.5 + 0.0004 * t.sin())).abs() <= 0.001);
    }
}

#[test]
fn test_morph_target_precision_scaling() {
    let mut targets = MorphTargetSet::new(Some([9; 16]));
    targets.insert("jaw_open", vec![[0.0, 3.0, 4.0], [1.0, 0.0, 0.0]]);
    targets.insert("still", vec![[0.0, 0.0, 0.0]]);

    let codec = CurveCompressionCodec::new(Arc::new(CodecConfig::default()))
        .with_morph_target_source(Arc::new(targets));
    let curves = vec![
        RawCurve::new(CurveName::new(1, "jaw_open"), sine),
        RawCurve::new(CurveName::new(2, "still"), sine),
        RawCurve::new(CurveName::new(3, "jaw_open_pinned"), sine).with_precision(0.05),
    ];
    let sequence = codec.compress(&curve_data(curves)).unwrap();
    let analysis = analyze_compressed_tracks(&sequence.compressed_bytes).unwrap();

    // 0.01 world units over a 5 unit delta.
    assert!((analysis.tracks[0].precision - 0.002).abs() < 1.0e-7);
    // Zero displacement falls back to the flat precision.
    assert_eq!(analysis.tracks[1].precision, 0.001);
    assert_eq!(analysis.tracks[2].precision, 0.05);
}

#[test]
fn test_degenerate_sequences_produce_valid_blobs() {
    let codec = codec_with_precision(0.001);

    // A single frame.
    let single = CompressibleCurveData {
        curves: vec![RawCurve::new(CurveName::new(1, "ramp"), |t: f32| 1.0 + t)],
        num_frames: 1,
        sequence_length: 1.0,
    };
    let sequence = codec.compress(&single).unwrap();
    let analysis = analyze_compressed_tracks(&sequence.compressed_bytes).unwrap();
    assert_eq!(analysis.info.sample_rate, 30.0);
    assert_eq!(analysis.info.num_samples, 1);
    assert_eq!(codec.decompress_curve(&sequence, CurveUid(1), 0.7).unwrap(), 1.0);

    // A sequence too short to have a duration.
    let tiny = CompressibleCurveData {
        curves: vec![RawCurve::new(CurveName::new(1, "ramp"), |t: f32| 1.0 + t)],
        num_frames: 10,
        sequence_length: 0.00001,
    };
    let sequence = codec.compress(&tiny).unwrap();
    let analysis = analyze_compressed_tracks(&sequence.compressed_bytes).unwrap();
    assert_eq!(analysis.info.sample_rate, 30.0);
    assert_eq!(analysis.info.num_constant_tracks, 1);
    let value = codec.decompress_curve(&sequence, CurveUid(1), 0.0).unwrap();
    assert!((value - 1.0).abs() <= 0.001);
}

#[test]
fn test_seek_order_does_not_change_results() {
    let sequence = codec_with_precision(0.001).compress(&curve_data(test_curves())).unwrap();
    let mut context = DecompressionContext::from_bytes(&sequence.compressed_bytes).unwrap();
    let times = [0.0f32, 0.41, 1.0, 1.73, 2.0, 0.05];

    let decode_at = |context: &mut DecompressionContext<'_>, t: f32| {
        context.seek(t, SampleRoundingPolicy::None);
        let mut values = vec![0.0f32; 3];
        context
            .decompress_tracks(&mut |index: u32, value: f32| values[index as usize] = value)
            .unwrap();
        values
    };

    let forward: Vec<Vec<f32>> = times.iter().map(|&t| decode_at(&mut context, t)).collect();
    let backward: Vec<Vec<f32>> = times.iter().rev().map(|&t| decode_at(&mut context, t)).collect();
    for (f, b) in forward.iter().zip(backward.iter().rev()) {
        assert_eq!(f, b);
    }
    // Repeated seeks to the same time are idempotent.
    assert_eq!(decode_at(&mut context, 1.73), decode_at(&mut context, 1.73));
}

#[test]
fn test_decompress_curves_respects_enabled_set() {
    let codec = codec_with_precision(0.001);
    let sequence = codec.compress(&curve_data(test_curves())).unwrap();

    let mut all = BlendedCurves::new();
    codec.decompress_curves(&sequence, &mut all, 1.5).unwrap();
    assert_eq!(all.len(), 3);
    assert!((all.get(CurveUid(200)).unwrap() - 0.75).abs() <= 0.001);
    assert!((all.get(CurveUid(300)).unwrap() - 0.3).abs() <= 0.001);

    let mut only_step = BlendedCurves::with_enabled([CurveUid(200)]);
    codec.decompress_curves(&sequence, &mut only_step, 1.5).unwrap();
    assert_eq!(only_step.len(), 1);
    assert_eq!(only_step.get(CurveUid(200)), all.get(CurveUid(200)));
}

#[test]
fn test_missing_curve_reads_zero() {
    let codec = codec_with_precision(0.001);
    let sequence = codec.compress(&curve_data(test_curves())).unwrap();
    assert_eq!(codec.decompress_curve(&sequence, CurveUid(999), 1.0).unwrap(), 0.0);
}

#[test]
fn test_empty_input_is_a_no_op() {
    let codec = codec_with_precision(0.001);
    let sequence = codec.compress(&curve_data(Vec::new())).unwrap();
    assert!(sequence.is_empty());
    assert!(sequence.curve_names.is_empty());

    let mut curves = BlendedCurves::new();
    codec.decompress_curves(&sequence, &mut curves, 0.5).unwrap();
    assert!(curves.is_empty());
    assert_eq!(codec.decompress_curve(&sequence, CurveUid(1), 0.5).unwrap(), 0.0);
}

#[test]
fn test_invalid_precision_is_a_configuration_error() {
    let codec = codec_with_precision(-1.0);
    let result = codec.compress(&curve_data(test_curves()));
    assert!(matches!(result, Err(CurveCodecError::Configuration(_))));

    let codec = codec_with_precision(0.001);
    let curves = vec![RawCurve::new(CurveName::new(1, "a"), sine).with_precision(0.0)];
    let result = codec.compress(&curve_data(curves));
    assert!(matches!(result, Err(CurveCodecError::Configuration(_))));
}

#[test]
fn test_corrupt_blobs_are_rejected() {
    let codec = codec_with_precision(0.001);
    let sequence = codec.compress(&curve_data(test_curves())).unwrap();
    let mut curves = BlendedCurves::new();

    // Flipped payload byte: structurally fine, caught by the content hash.
    let mut flipped = sequence.clone();
    let last = flipped.compressed_bytes.len() - 1;
    flipped.compressed_bytes[last] ^= 0xFF;
    assert!(matches!(
        analyze_compressed_tracks(&flipped.compressed_bytes),
        Err(CurveCodecError::CorruptBlob(_))
    ));

    // Bad magic.
    let mut bad_magic = sequence.clone();
    bad_magic.compressed_bytes[0] = b'X';
    let result = codec.decompress_curves(&bad_magic, &mut curves, 0.5);
    assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));

    // Truncated.
    let mut truncated = sequence.clone();
    truncated.compressed_bytes.truncate(40);
    let result = codec.decompress_curve(&truncated, CurveUid(100), 0.5);
    assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));

    // Unsupported algorithm version.
    let mut future = sequence.clone();
    future.compressed_bytes[4] = future.compressed_bytes[4].wrapping_add(1);
    let result = codec.decompress_curves(&future, &mut curves, 0.5);
    assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));

    // Bad magic is reported even when the requested curve is absent.
    let result = codec.decompress_curve(&bad_magic, CurveUid(999), 0.5);
    assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));

    // A name table whose blob went missing.
    let mut no_blob = sequence.clone();
    no_blob.compressed_bytes.clear();
    let result = codec.decompress_curves(&no_blob, &mut curves, 0.5);
    assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));
    let result = codec.decompress_curve(&no_blob, CurveUid(100), 0.5);
    assert!(matches!(result, Err(CurveCodecError::CorruptBlob(_))));

    assert!(curves.is_empty());
}

#[test]
fn test_sequence_persistence_round_trip() {
    let sequence = codec_with_precision(0.001).compress(&curve_data(test_curves())).unwrap();
    let bytes = sequence.to_bytes().unwrap();
    let restored = CompressedCurveSequence::from_bytes(&bytes).unwrap();
    assert_eq!(restored, sequence);

    assert!(CompressedCurveSequence::from_bytes(&bytes[..bytes.len() / 2]).is_err());
}

#[test]
fn test_concurrent_contexts_over_one_blob() {
    let sequence = codec_with_precision(0.001).compress(&curve_data(test_curves())).unwrap();
    let bytes = &sequence.compressed_bytes;
    let names = &sequence.curve_names;
    let times: Vec<f32> = (0..40).map(|i| i as f32 * 0.05).collect();

    let expected: Vec<f32> = times
        .iter()
        .map(|&t| decompress_one(bytes, names, CurveUid(100), t).unwrap())
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let times = &times;
                scope.spawn(move || {
                    let mut context = DecompressionContext::from_bytes(bytes).unwrap();
                    times
                        .iter()
                        .map(|&t| {
                            context.seek(t, SampleRoundingPolicy::None);
                            let mut writer = ScalarCurveWriter::new();
                            context.decompress_track(0, &mut writer).unwrap();
                            writer.value()
                        })
                        .collect::<Vec<f32>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_noisy_curves_stay_within_precision() {
    let mut rng = StdRng::seed_from_u64(42);
    let noise: Vec<f32> = (0..NUM_FRAMES).map(|_| rng.random_range(-10.0f32..10.0)).collect();
    let rate = (NUM_FRAMES - 1) as f32 / SEQUENCE_LENGTH;
    let lookup = noise.clone();
    let noisy = move |t: f32| lookup[((t * rate).round() as usize).min(NUM_FRAMES - 1)];

    let times = sample_times(NUM_FRAMES, SEQUENCE_LENGTH);
    for precision in [0.1f32, 0.001] {
        let codec = codec_with_precision(precision);
        let curves = vec![RawCurve::new(CurveName::new(7, "noise"), noisy.clone())];
        let sequence = codec.compress(&curve_data(curves)).unwrap();
        let mut context = DecompressionContext::from_bytes(&sequence.compressed_bytes).unwrap();
        for &t in &times {
            let raw = noisy(t);
            context.seek(t, SampleRoundingPolicy::Nearest);
            let mut writer = ScalarCurveWriter::new();
            context.decompress_track(0, &mut writer).unwrap();
            let decoded = writer.value();
            assert!(
                (decoded - raw).abs() <= precision + slack(raw),
                "noise at {}: {} vs {}",
                t,
                decoded,
                raw
            );
        }
    }
}

#[test]
fn test_keyframed_curve_round_trip() {
    let curve = KeyframedCurve::new(vec![
        CurveKey::linear(0.0, 0.0),
        CurveKey::linear(0.8, 1.0),
        CurveKey::constant(1.2, 0.25),
        CurveKey::linear(2.0, -1.0),
    ]);
    let codec = codec_with_precision(0.001);
    let curves = vec![RawCurve::new(CurveName::new(5, "keyed"), curve.clone())];
    let sequence = codec.compress(&curve_data(curves)).unwrap();

    for t in sample_times(NUM_FRAMES, SEQUENCE_LENGTH) {
        let decoded = codec.decompress_curve(&sequence, CurveUid(5), t).unwrap();
        assert!((decoded - curve.eval(t)).abs() <= 0.001 + slack(curve.eval(t)));
    }
}

#[test]
fn test_cache_key_tracks_settings_and_morph_source() {
    let config = Arc::new(CodecConfig::default());
    let plain = CurveCompressionCodec::new(config.clone());
    assert_eq!(plain.cache_key(), CurveCompressionCodec::new(config.clone()).cache_key());

    let with_mesh = CurveCompressionCodec::new(config.clone())
        .with_morph_target_source(Arc::new(MorphTargetSet::new(Some([1; 16]))));
    assert_ne!(plain.cache_key(), with_mesh.cache_key());

    let rebuilt = CurveCompressionCodec::new(Arc::new(CodecConfig {
        force_rebuild_version: 2,
        ..CodecConfig::default()
    }));
    assert_ne!(plain.cache_key(), rebuilt.cache_key());
}
