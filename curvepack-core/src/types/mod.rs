//! This module defines the data model shared between the codec and its host:
//! curve identifiers, keyframed curves, morph target data and the destination
//! value set for decoded curves.

pub mod blended_curves;
pub mod curve_name;
pub mod keyframed_curve;
pub mod morph_target;

pub use blended_curves::BlendedCurves;
pub use curve_name::{CurveName, CurveUid, TrackNameTable};
pub use keyframed_curve::{CurveKey, KeyInterpolation, KeyframedCurve};
pub use morph_target::MorphTargetSet;
