// In: src/config.rs

//! The single source of truth for all curvepack compression configuration.
//!
//! `CodecConfig` is created once at the application boundary (e.g., from a JSON
//! asset setting) and then passed down through the system via a shared,
//! read-only `Arc<CodecConfig>`.

use serde::{Deserialize, Serialize};

use crate::error::CurveCodecError;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// Defines the trade-off between compression speed and final blob size.
///
/// This enum is the primary input to the segment `planner`. It selects how
/// aggressively the planner searches for segment boundaries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentingProfile {
    /// Fixed-size segments, no search. Fastest to compress.
    Fast,

    /// Bit-cost minimizing partition with segments of moderate length.
    /// This is the recommended default.
    #[default]
    Balanced,

    /// Same search as `Balanced` but allows much longer segments, which pays off
    /// for long, slowly varying curves at the cost of CPU time.
    HighCompression,
}

impl SegmentingProfile {
    /// Stable tag folded into build cache keys.
    pub fn tag(self) -> u8 {
        match self {
            SegmentingProfile::Fast => 0,
            SegmentingProfile::Balanced => 1,
            SegmentingProfile::HighCompression => 2,
        }
    }
}

//==================================================================================
// II. The Unified CodecConfig
//==================================================================================

/// The single, unified configuration for curve compression.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Flat precision used for curves that do not drive a morph target.
    #[serde(default = "default_curve_precision")]
    pub curve_precision: f32,

    /// World-space precision for curves driving morph targets. 0.01cm is
    /// conservative enough for cinematographic quality.
    #[serde(default = "default_morph_target_position_precision")]
    pub morph_target_position_precision: f32,

    /// The profile guiding segment planning.
    #[serde(default)]
    pub profile: SegmentingProfile,

    /// If true, the compressor measures the reconstruction error of every sample
    /// after compression and reports it in the stats.
    #[serde(default = "default_true")]
    pub compute_error_diagnostics: bool,

    /// Bumped by hand to invalidate every cached blob without a format change.
    #[serde(default)]
    pub force_rebuild_version: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            curve_precision: default_curve_precision(),
            morph_target_position_precision: default_morph_target_position_precision(),
            profile: SegmentingProfile::default(),
            compute_error_diagnostics: true,
            force_rebuild_version: 0,
        }
    }
}

impl CodecConfig {
    /// Parses a config from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, CurveCodecError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that both precision values are strictly positive and finite.
    pub fn validate(&self) -> Result<(), CurveCodecError> {
        check_positive("curve_precision", self.curve_precision)?;
        check_positive(
            "morph_target_position_precision",
            self.morph_target_position_precision,
        )
    }
}

pub(crate) fn check_positive(label: &str, value: f32) -> Result<(), CurveCodecError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CurveCodecError::Configuration(format!(
            "{} must be strictly positive and finite, got {}",
            label, value
        )))
    }
}

fn default_curve_precision() -> f32 {
    0.001
}

fn default_morph_target_position_precision() -> f32 {
    0.01
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}
