// In: src/decompression/writer.rs

//! Destinations for decoded track values.
//!
//! The decompression context hands every decoded value to a `TrackWriter`
//! together with the track's output index. Writers only route values; they never
//! buffer or transform them.

use crate::types::{BlendedCurves, TrackNameTable};

pub trait TrackWriter {
    fn write_float1(&mut self, track_index: u32, value: f32);
}

impl<F> TrackWriter for F
where
    F: FnMut(u32, f32),
{
    fn write_float1(&mut self, track_index: u32, value: f32) {
        self(track_index, value)
    }
}

/// Routes values into a `BlendedCurves` through the name table persisted with
/// the blob. Curves the destination has not enabled are skipped.
pub struct NamedCurveWriter<'a> {
    names: &'a TrackNameTable,
    curves: &'a mut BlendedCurves,
}

impl<'a> NamedCurveWriter<'a> {
    pub fn new(names: &'a TrackNameTable, curves: &'a mut BlendedCurves) -> Self {
        Self { names, curves }
    }
}

impl TrackWriter for NamedCurveWriter<'_> {
    fn write_float1(&mut self, track_index: u32, value: f32) {
        if let Some(name) = self.names.get(track_index) {
            if self.curves.is_enabled(name.uid) {
                self.curves.set(name.uid, value);
            }
        }
    }
}

/// Captures the value of a single decoded track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScalarCurveWriter {
    value: f32,
}

impl ScalarCurveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last value written, or 0.0 when nothing was.
    pub fn value(&self) -> f32 {
        self.value
    }
}

impl TrackWriter for ScalarCurveWriter {
    fn write_float1(&mut self, _track_index: u32, value: f32) {
        self.value = value;
    }
}
