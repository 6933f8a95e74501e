//! The caller-side value store that decoded curve values are routed into.

use hashbrown::{HashMap, HashSet};

use crate::types::curve_name::CurveUid;

/// A sparse, uid-indexed set of curve values for one evaluated pose.
///
/// When an enabled-set is installed, only those curves accept writes; this lets
/// a host skip curves that no consumer reads this frame.
#[derive(Debug, Clone, Default)]
pub struct BlendedCurves {
    values: HashMap<CurveUid, f32>,
    enabled: Option<HashSet<CurveUid>>,
}

impl BlendedCurves {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts writes to the given curves.
    pub fn with_enabled(enabled: impl IntoIterator<Item = CurveUid>) -> Self {
        Self {
            values: HashMap::new(),
            enabled: Some(enabled.into_iter().collect()),
        }
    }

    pub fn is_enabled(&self, uid: CurveUid) -> bool {
        self.enabled.as_ref().map_or(true, |set| set.contains(&uid))
    }

    /// Stores `value` for `uid`. Ignored for disabled curves.
    pub fn set(&mut self, uid: CurveUid, value: f32) {
        if self.is_enabled(uid) {
            self.values.insert(uid, value);
        }
    }

    pub fn get(&self, uid: CurveUid) -> Option<f32> {
        self.values.get(&uid).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CurveUid, f32)> + '_ {
        self.values.iter().map(|(&uid, &v)| (uid, v))
    }

    /// Drops all values, keeping the enabled-set.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
