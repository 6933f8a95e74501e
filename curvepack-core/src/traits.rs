//! This module defines the capability traits the codec uses to talk to the host's
//! data without depending on its concrete curve or mesh types.

/// Anything that can produce a curve value at an arbitrary playback time.
///
/// The track builder only ever sees this trait, so hosts can hand in their own
/// curve representation, a `KeyframedCurve`, or a plain closure.
pub trait CurveEvaluator {
    fn eval(&self, time: f32) -> f32;
}

impl<F> CurveEvaluator for F
where
    F: Fn(f32) -> f32,
{
    fn eval(&self, time: f32) -> f32 {
        self(time)
    }
}

/// A source of morph-target displacement data, used to derive world-space
/// precision for curves that drive vertex deformation.
pub trait MorphTargetSource {
    /// Position deltas of the morph target with this name, or `None` when no
    /// morph target is driven by a curve of that name.
    fn position_deltas(&self, target_name: &str) -> Option<&[[f32; 3]]>;

    /// Identifier of the source content (e.g. a mesh GUID). Folded into the
    /// build cache key so that edits to the mesh invalidate cached blobs.
    fn content_guid(&self) -> Option<[u8; 16]>;
}
