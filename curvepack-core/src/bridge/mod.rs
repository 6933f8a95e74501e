// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing API of the curvepack library. It turns named,
// host-owned curves into the pure track representation the `track_pipeline` works
// on, and routes decoded track values back onto curve names.
//
// Data Flow (Compression):
//
//   1. [Stateful Facade (CurveCompressionCodec)] -> Receives `CompressibleCurveData`
//         |
//         `-> forwards config + morph target source ->
//
//   2. [Stateless API (compress_curves)]
//         |
//         `-> a. `precision` resolves one tolerance per curve
//         |
//         `-> b. `builder` resamples every curve into a `UniformTrack`
//         |
//         `-> c. `compressor` writes the blob through a `CodecAllocator`
//
//   3. [Result] -> `CompressedCurveSequence { compressed_bytes, curve_names }`
//
//
// Data Flow (Decompression):
//
//   1. [Stateless API (decompress_all / decompress_one)] -> Receives bytes + name table
//         |
//         `-> a. Binds a `DecompressionContext`, validating blob and name table
//         |
//         `-> b. Seeks and decodes into a `NamedCurveWriter` / `ScalarCurveWriter`
//
//   2. [Stateful Facade] -> Values land in the caller's `BlendedCurves`
//
// ====================================================================================
pub mod cache_key;
pub mod codec;
pub mod format;
pub mod stateless_api;

pub use cache_key::CacheKey;
pub use codec::{CompressedCurveSequence, CompressibleCurveData, CurveCompressionCodec, RawCurve};
pub use stateless_api::{analyze_compressed_tracks, compress_curves, decompress_all, decompress_one, BlobAnalysis};

#[cfg(test)]
mod tests;
