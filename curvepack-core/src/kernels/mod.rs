//! Pure, stateless kernels shared by the compressor and the decompression context.
//!
//! Nothing in here knows about tracks, segments or blobs: each kernel works on
//! plain slices and scalars and is tested in isolation.

pub mod bitpack;
pub mod leb128;
pub mod quantize;
