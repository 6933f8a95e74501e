// In: src/bridge/cache_key.rs

//! Build cache key for compressed curve data.
//!
//! Hosts cache compressed sequences keyed by this fingerprint. Anything that
//! changes the bytes the codec would produce for the same input curves must be
//! folded in here, or stale blobs get served after a settings change.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::bridge::format::ALGORITHM_VERSION;
use crate::config::CodecConfig;

/// SHA-256 fingerprint of the settings that determine compressed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fingerprints `config` together with the morph source's content GUID, if any.
pub fn compute_cache_key(config: &CodecConfig, morph_source_guid: Option<[u8; 16]>) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(b"curvepack");
    hasher.update(ALGORITHM_VERSION.to_le_bytes());
    hasher.update(config.curve_precision.to_le_bytes());
    hasher.update(config.morph_target_position_precision.to_le_bytes());
    hasher.update([config.profile.tag()]);
    match morph_source_guid {
        Some(guid) => {
            hasher.update([1u8]);
            hasher.update(guid);
        }
        None => hasher.update([0u8]),
    }
    hasher.update(config.force_rebuild_version.to_le_bytes());
    CacheKey(hasher.finalize().into())
}
