//! Playback-side decoding: a seekable context over a compressed blob and the
//! writers that receive its decoded values.

pub mod context;
pub mod writer;

pub use context::{DecompressionContext, SampleRoundingPolicy};
pub use writer::{NamedCurveWriter, ScalarCurveWriter, TrackWriter};
