// In: src/bridge/codec.rs

//! The stateful codec facade hosts hold on to: one configuration, an optional
//! morph target source, and the compress / decompress / cache-key operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use crate::bridge::cache_key::{compute_cache_key, CacheKey};
use crate::bridge::stateless_api;
use crate::config::CodecConfig;
use crate::error::CurveCodecError;
use crate::kernels::leb128;
use crate::traits::{CurveEvaluator, MorphTargetSource};
use crate::types::{BlendedCurves, CurveName, CurveUid, TrackNameTable};

//==================================================================================
// 1. Input & Output Types
//==================================================================================

/// One curve to compress.
pub struct RawCurve {
    pub name: CurveName,
    pub evaluator: Box<dyn CurveEvaluator + Send + Sync>,
    /// Replaces the resolved precision of this curve when set.
    pub precision_override: Option<f32>,
}

impl RawCurve {
    pub fn new<E>(name: CurveName, evaluator: E) -> Self
    where
        E: CurveEvaluator + Send + Sync + 'static,
    {
        Self {
            name,
            evaluator: Box::new(evaluator),
            precision_override: None,
        }
    }

    pub fn with_precision(mut self, precision: f32) -> Self {
        self.precision_override = Some(precision);
        self
    }
}

impl fmt::Debug for RawCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCurve")
            .field("name", &self.name)
            .field("precision_override", &self.precision_override)
            .finish_non_exhaustive()
    }
}

/// A set of curves sampled over one sequence.
#[derive(Debug)]
pub struct CompressibleCurveData {
    pub curves: Vec<RawCurve>,
    /// Number of uniformly spaced samples taken from each curve.
    pub num_frames: usize,
    /// Length of the sequence in seconds.
    pub sequence_length: f32,
}

/// Compressed curves and the name table mapping their tracks back to curves.
/// Both halves are persisted together.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedCurveSequence {
    pub compressed_bytes: Vec<u8>,
    pub curve_names: TrackNameTable,
}

impl CompressedCurveSequence {
    pub fn is_empty(&self) -> bool {
        self.compressed_bytes.is_empty()
    }

    /// Serializes both halves: LEB128 blob length, blob, name table.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CurveCodecError> {
        let names = self.curve_names.to_bytes()?;
        let mut buffer = Vec::with_capacity(10 + self.compressed_bytes.len() + names.len());
        leb128::write_len(self.compressed_bytes.len(), &mut buffer);
        buffer.extend_from_slice(&self.compressed_bytes);
        buffer.extend_from_slice(&names);
        Ok(buffer)
    }

    /// Reads a sequence written by `to_bytes`. The blob itself is validated
    /// later, when a decompression context binds to it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CurveCodecError> {
        let mut cursor = Cursor::new(bytes);
        let blob_len = leb128::read_len(&mut cursor)?;
        let start = cursor.position() as usize;
        let compressed_bytes = start
            .checked_add(blob_len)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| CurveCodecError::CorruptBlob("compressed curve sequence is truncated".into()))?
            .to_vec();
        let curve_names = TrackNameTable::from_bytes(&bytes[start + blob_len..])?;
        Ok(Self {
            compressed_bytes,
            curve_names,
        })
    }
}

//==================================================================================
// 2. The Codec
//==================================================================================

#[derive(Clone)]
pub struct CurveCompressionCodec {
    config: Arc<CodecConfig>,
    morph_targets: Option<Arc<dyn MorphTargetSource + Send + Sync>>,
}

impl fmt::Debug for CurveCompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveCompressionCodec")
            .field("config", &self.config)
            .field("has_morph_targets", &self.morph_targets.is_some())
            .finish()
    }
}

impl CurveCompressionCodec {
    pub fn new(config: Arc<CodecConfig>) -> Self {
        Self {
            config,
            morph_targets: None,
        }
    }

    /// Derives precision for curves that drive morph targets of `source`.
    pub fn with_morph_target_source(mut self, source: Arc<dyn MorphTargetSource + Send + Sync>) -> Self {
        self.morph_targets = Some(source);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Compresses `data`. Failures are logged and returned; nothing partial is
    /// produced.
    pub fn compress(&self, data: &CompressibleCurveData) -> Result<CompressedCurveSequence, CurveCodecError> {
        let source = self
            .morph_targets
            .as_deref()
            .map(|s| s as &dyn MorphTargetSource);
        stateless_api::compress_curves(data, &self.config, source).map_err(|e| {
            log::warn!("Failed to compress {} curves: {}", data.curves.len(), e);
            e
        })
    }

    /// Decodes every curve of `sequence` at `time` into `curves`.
    pub fn decompress_curves(
        &self,
        sequence: &CompressedCurveSequence,
        curves: &mut BlendedCurves,
        time: f32,
    ) -> Result<(), CurveCodecError> {
        stateless_api::decompress_all(&sequence.compressed_bytes, &sequence.curve_names, time, curves)
    }

    /// Decodes one curve at `time`; 0.0 when it is not part of `sequence`.
    pub fn decompress_curve(
        &self,
        sequence: &CompressedCurveSequence,
        uid: CurveUid,
        time: f32,
    ) -> Result<f32, CurveCodecError> {
        stateless_api::decompress_one(&sequence.compressed_bytes, &sequence.curve_names, uid, time)
    }

    /// Fingerprint of every setting that affects the compressed output.
    pub fn cache_key(&self) -> CacheKey {
        let guid = self.morph_targets.as_ref().and_then(|s| s.content_guid());
        compute_cache_key(&self.config, guid)
    }
}
