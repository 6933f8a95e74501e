//! Curve identifiers and the track name table persisted next to a compressed blob.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

use crate::error::CurveCodecError;
use crate::kernels::leb128;

/// The magic number opening a serialized track name table.
pub const NAME_TABLE_MAGIC: &[u8; 4] = b"CRVN";
/// A reasonable limit to prevent OOM from malformed name lengths. (64KB)
const MAX_REASONABLE_NAME_LEN: usize = 64 * 1024;

/// Stable numeric identifier of a curve, unique within one skeleton/asset.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurveUid(pub u32);

impl fmt::Display for CurveUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A curve's stable identifier plus its human-readable name. The display name is
/// what morph targets are matched against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurveName {
    pub uid: CurveUid,
    pub display_name: String,
}

impl CurveName {
    pub fn new(uid: u32, display_name: impl Into<String>) -> Self {
        Self {
            uid: CurveUid(uid),
            display_name: display_name.into(),
        }
    }
}

/// Ordered mapping from a compressed track's output index to the curve it feeds.
///
/// The table is persisted together with the compressed bytes: the blob alone
/// knows only output indices, not which named curve slot they belong to.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackNameTable {
    names: Vec<CurveName>,
}

impl TrackNameTable {
    pub fn new(names: Vec<CurveName>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The curve fed by the track with this output index.
    pub fn get(&self, output_index: u32) -> Option<&CurveName> {
        self.names.get(output_index as usize)
    }

    /// Output index of the curve with this uid, if it was compressed.
    pub fn find(&self, uid: CurveUid) -> Option<u32> {
        self.names.iter().position(|n| n.uid == uid).map(|i| i as u32)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurveName> {
        self.names.iter()
    }

    /// Serializes the table: magic, LEB128 count, then per curve a LEB128 uid,
    /// a LEB128 name length and the UTF-8 name bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CurveCodecError> {
        let mut buffer = Vec::with_capacity(8 + self.names.len() * 16);
        buffer.extend_from_slice(NAME_TABLE_MAGIC);
        leb128::write_len(self.names.len(), &mut buffer);
        for name in &self.names {
            leb128::write_u32(name.uid.0, &mut buffer);
            leb128::write_len(name.display_name.len(), &mut buffer);
            buffer.extend_from_slice(name.display_name.as_bytes());
        }
        Ok(buffer)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CurveCodecError> {
        if bytes.len() < NAME_TABLE_MAGIC.len() || &bytes[..4] != NAME_TABLE_MAGIC {
            return Err(CurveCodecError::CorruptBlob(
                "Invalid track name table magic number".into(),
            ));
        }

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(4);

        let count = leb128::read_len(&mut cursor)?;
        // Every entry takes at least two bytes, which bounds a sane count.
        if count > bytes.len() {
            return Err(CurveCodecError::CorruptBlob(format!(
                "Track name table claims {} entries in {} bytes",
                count,
                bytes.len()
            )));
        }

        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            let uid = leb128::read_u32(&mut cursor)?;
            let len = leb128::read_len(&mut cursor)?;
            if len > MAX_REASONABLE_NAME_LEN {
                return Err(CurveCodecError::CorruptBlob(format!(
                    "Curve name length {} exceeds limit",
                    len
                )));
            }
            let start = cursor.position() as usize;
            let end = start + len;
            let raw = bytes.get(start..end).ok_or_else(|| {
                CurveCodecError::CorruptBlob("Track name table is truncated".into())
            })?;
            let display_name = String::from_utf8(raw.to_vec())?;
            cursor.set_position(end as u64);
            names.push(CurveName {
                uid: CurveUid(uid),
                display_name,
            });
        }

        if cursor.position() as usize != bytes.len() {
            return Err(CurveCodecError::CorruptBlob(
                "Trailing bytes after track name table".into(),
            ));
        }
        Ok(Self { names })
    }
}

impl FromIterator<CurveName> for TrackNameTable {
    fn from_iter<I: IntoIterator<Item = CurveName>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
