//! A minimal keyframed scalar curve, the typical raw input to the codec.

use serde::{Deserialize, Serialize};

use crate::traits::CurveEvaluator;

/// How the segment leaving a key is evaluated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyInterpolation {
    #[default]
    Linear,
    /// Hold the key's value until the next key.
    Constant,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub interpolation: KeyInterpolation,
}

impl CurveKey {
    pub fn linear(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            interpolation: KeyInterpolation::Linear,
        }
    }

    pub fn constant(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            interpolation: KeyInterpolation::Constant,
        }
    }
}

/// An ordered sequence of keys. Evaluation clamps to the first/last key outside
/// the keyed range; an empty curve evaluates to 0.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct KeyframedCurve {
    keys: Vec<CurveKey>,
}

impl KeyframedCurve {
    /// Builds a curve, sorting keys by time.
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }
}

impl CurveEvaluator for KeyframedCurve {
    fn eval(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; guaranteed to be in 1..len here.
        let next = self.keys.partition_point(|k| k.time <= time);
        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];
        match k0.interpolation {
            KeyInterpolation::Constant => k0.value,
            KeyInterpolation::Linear => {
                let span = k1.time - k0.time;
                if span <= 0.0 {
                    return k1.value;
                }
                let alpha = (time - k0.time) / span;
                k0.value + (k1.value - k0.value) * alpha
            }
        }
    }
}
