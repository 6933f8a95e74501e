//! An in-memory `MorphTargetSource`: named morph targets with their vertex
//! position deltas.

use hashbrown::HashMap;

use crate::traits::MorphTargetSource;

#[derive(Debug, Clone, Default)]
pub struct MorphTargetSet {
    targets: HashMap<String, Vec<[f32; 3]>>,
    guid: Option<[u8; 16]>,
}

impl MorphTargetSet {
    pub fn new(guid: Option<[u8; 16]>) -> Self {
        Self {
            targets: HashMap::new(),
            guid,
        }
    }

    /// Registers (or replaces) a morph target's per-vertex position deltas.
    pub fn insert(&mut self, name: impl Into<String>, position_deltas: Vec<[f32; 3]>) {
        self.targets.insert(name.into(), position_deltas);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl MorphTargetSource for MorphTargetSet {
    fn position_deltas(&self, target_name: &str) -> Option<&[[f32; 3]]> {
        self.targets.get(target_name).map(|d| d.as_slice())
    }

    fn content_guid(&self) -> Option<[u8; 16]> {
        self.guid
    }
}
