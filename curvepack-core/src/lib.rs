//! This file is the root of the `curvepack` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`track_pipeline`, `kernels`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types that make up the public surface of the codec.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod alloc;
pub mod bridge;
pub mod config;
pub mod decompression;
pub mod error;
pub mod kernels;
pub mod track_pipeline;
pub mod traits;
pub mod types;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use alloc::{BoundedAllocator, CodecAllocator, HeapAllocator};
pub use bridge::cache_key::CacheKey;
pub use bridge::codec::{CompressedCurveSequence, CompressibleCurveData, CurveCompressionCodec, RawCurve};
pub use bridge::format::ALGORITHM_VERSION;
pub use bridge::stateless_api::{analyze_compressed_tracks, compress_curves, decompress_all, decompress_one};
pub use config::{CodecConfig, SegmentingProfile};
pub use decompression::{DecompressionContext, NamedCurveWriter, SampleRoundingPolicy, ScalarCurveWriter, TrackWriter};
pub use error::CurveCodecError;
pub use observability::enable_verbose_logging;
pub use track_pipeline::artifact::CompressedTracks;
pub use track_pipeline::compressor::{compress_track_list, CompressionSettings, CompressionStats};
pub use traits::{CurveEvaluator, MorphTargetSource};
pub use types::{BlendedCurves, CurveName, CurveUid, KeyframedCurve, MorphTargetSet, TrackNameTable};
