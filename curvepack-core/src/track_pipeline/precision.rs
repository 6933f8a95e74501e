// In: src/track_pipeline/precision.rs

//! Per-curve error tolerance.
//!
//! Curves driving a morph target are blended as
//! `result_vtx = ref_vtx + vtx_delta * weight`, so an error in the weight moves
//! every vertex by `vtx_delta * weight_error`. Dividing a world-space precision
//! by the largest displacement of the target yields the weight precision that
//! keeps every vertex within that world-space tolerance:
//! 0.01cm over a 3cm delta needs a weight precision of 0.0033, over 50cm 0.0002.
//!
//! Curves with no morph target (or a target that never moves a vertex) use the
//! flat curve precision.

use crate::config::{check_positive, CodecConfig};
use crate::error::CurveCodecError;
use crate::traits::MorphTargetSource;
use crate::types::CurveName;

/// Tolerances for one curve. Both are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionSpec {
    pub precision: f32,
    /// Tracks whose samples span no more than this collapse to a constant.
    pub constant_threshold: f32,
}

impl PrecisionSpec {
    pub fn new(precision: f32) -> Result<Self, CurveCodecError> {
        check_positive("precision", precision)?;
        Ok(Self {
            precision,
            constant_threshold: precision,
        })
    }
}

/// Resolves the tolerance of one curve.
///
/// `morph_max_delta > 0` selects `world_precision / morph_max_delta`, anything
/// else selects `flat_precision`.
pub fn resolve_precision(
    morph_max_delta: f32,
    flat_precision: f32,
    world_precision: f32,
) -> Result<PrecisionSpec, CurveCodecError> {
    let precision = if morph_max_delta > 0.0 {
        check_positive("morph_target_position_precision", world_precision)?;
        world_precision / morph_max_delta
    } else {
        check_positive("curve_precision", flat_precision)?;
        flat_precision
    };
    PrecisionSpec::new(precision)
}

/// Largest vertex displacement length of a morph target; 0 for no deltas.
pub fn morph_target_max_position_delta(position_deltas: &[[f32; 3]]) -> f32 {
    position_deltas
        .iter()
        .map(|[x, y, z]| (x * x + y * y + z * z).sqrt())
        .fold(0.0f32, f32::max)
}

/// Per-curve largest displacement of the morph target sharing the curve's
/// display name, or 0 for curves that drive no morph target.
pub fn morph_target_max_position_deltas(
    names: &[&CurveName],
    source: Option<&dyn MorphTargetSource>,
) -> Vec<f32> {
    match source {
        None => vec![0.0; names.len()],
        Some(source) => names
            .iter()
            .map(|name| {
                source
                    .position_deltas(&name.display_name)
                    .map(morph_target_max_position_delta)
                    .unwrap_or(0.0)
            })
            .collect(),
    }
}

/// Resolves every curve of a compression pass. A `Some` override wins over both
/// the morph-derived and the flat precision.
pub fn resolve_curve_precisions(
    names: &[&CurveName],
    overrides: &[Option<f32>],
    source: Option<&dyn MorphTargetSource>,
    config: &CodecConfig,
) -> Result<Vec<PrecisionSpec>, CurveCodecError> {
    if overrides.len() != names.len() {
        return Err(CurveCodecError::Configuration(format!(
            "{} precision overrides supplied for {} curves",
            overrides.len(),
            names.len()
        )));
    }

    let max_deltas = morph_target_max_position_deltas(names, source);
    names
        .iter()
        .zip(overrides)
        .zip(max_deltas)
        .map(|((name, override_precision), max_delta)| {
            let spec = match override_precision {
                Some(p) => PrecisionSpec::new(*p),
                None => resolve_precision(
                    max_delta,
                    config.curve_precision,
                    config.morph_target_position_precision,
                ),
            }?;
            log::trace!(
                "Curve '{}' ({}) resolved precision {} (max morph delta {})",
                name.display_name,
                name.uid,
                spec.precision,
                max_delta
            );
            Ok(spec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MorphTargetSet;

    #[test]
    fn test_world_precision_scaled_by_max_delta() {
        let spec = resolve_precision(5.0, 0.001, 0.01).unwrap();
        assert!((spec.precision - 0.002).abs() < 1.0e-9);
        assert_eq!(spec.constant_threshold, spec.precision);
    }

    #[test]
    fn test_zero_delta_falls_back_to_flat_precision() {
        let spec = resolve_precision(0.0, 0.001, 0.01).unwrap();
        assert_eq!(spec.precision, 0.001);
        assert_eq!(spec.constant_threshold, 0.001);
    }

    #[test]
    fn test_non_positive_precision_is_rejected() {
        assert!(matches!(
            resolve_precision(0.0, 0.0, 0.01),
            Err(CurveCodecError::Configuration(_))
        ));
        assert!(matches!(
            resolve_precision(2.0, 0.001, -0.01),
            Err(CurveCodecError::Configuration(_))
        ));
        assert!(PrecisionSpec::new(f32::NAN).is_err());
    }

    #[test]
    fn test_max_position_delta_is_longest_vector() {
        let deltas = [[1.0, 0.0, 0.0], [0.0, 3.0, 4.0], [-2.0, 0.0, 0.0]];
        assert_eq!(morph_target_max_position_delta(&deltas), 5.0);
        assert_eq!(morph_target_max_position_delta(&[]), 0.0);
    }

    #[test]
    fn test_resolve_curve_precisions_with_source_and_override() {
        let mut source = MorphTargetSet::new(None);
        source.insert("smile", vec![[0.0, 0.0, 5.0]]);
        source.insert("flat", vec![[0.0, 0.0, 0.0]]);

        let smile = CurveName::new(1, "smile");
        let flat = CurveName::new(2, "flat");
        let material = CurveName::new(3, "emissive");
        let pinned = CurveName::new(4, "smile");
        let names = [&smile, &flat, &material, &pinned];
        let overrides = [None, None, None, Some(0.5)];

        let config = CodecConfig::default();
        let specs = resolve_curve_precisions(&names, &overrides, Some(&source as &dyn MorphTargetSource), &config).unwrap();

        assert!((specs[0].precision - 0.002).abs() < 1.0e-9);
        assert_eq!(specs[1].precision, 0.001);
        assert_eq!(specs[2].precision, 0.001);
        assert_eq!(specs[3].precision, 0.5);
    }

    #[test]
    fn test_resolve_curve_precisions_length_mismatch() {
        let a = CurveName::new(1, "a");
        let result = resolve_curve_precisions(&[&a], &[], None, &CodecConfig::default());
        assert!(matches!(result, Err(CurveCodecError::Configuration(_))));
    }
}
