//! Group handles: an index into the input list plus the generator data
//! needed to reconstruct the group.

use serde::{Deserialize, Serialize};

/// Position of a group in the input list.
///
/// Indices are 0-based internally; reports use 1-based labels to match the
/// upstream enumeration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupIndex(pub usize);

impl GroupIndex {
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for GroupIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a group's generators are stored.
///
/// `Images` holds one image list per generator, 1-based, in the convention of
/// the upstream enumeration files: a permutation moving points `1..=k` may be
/// written with only `k` entries even when the ambient degree is larger, and
/// trailing fixed points are implied. `Words` holds cycle-notation strings
/// such as `"(1,2)(3,4)"`; the oracle parses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorSpec {
    Images(Vec<Vec<u16>>),
    Words(Vec<String>),
}

impl GeneratorSpec {
    /// Number of generators.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Images(v) => v.len(),
            Self::Words(v) => v.len(),
        }
    }

    /// True for the trivial group's empty generator list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable reference to one input group.
///
/// The handle owns its generator spec; the oracle's internal representation
/// is reconstructed on demand and may be evicted at any time, since
/// reconstruction is a pure function of the stored generators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupHandle {
    pub index: GroupIndex,
    /// Ambient degree: the group permutes points `1..=degree`.
    pub degree: u16,
    pub generators: GeneratorSpec,
}

impl GroupHandle {
    #[must_use]
    pub fn new(index: usize, degree: u16, generators: GeneratorSpec) -> Self {
        Self {
            index: GroupIndex(index),
            degree,
            generators,
        }
    }

    /// Handle with image-list generators.
    #[must_use]
    pub fn from_images(index: usize, degree: u16, images: Vec<Vec<u16>>) -> Self {
        Self::new(index, degree, GeneratorSpec::Images(images))
    }

    /// A derived handle (same input position, different generator set), used
    /// for direct factors extracted from this group.
    #[must_use]
    pub fn derived(&self, images: Vec<Vec<u16>>) -> Self {
        Self {
            index: self.index,
            degree: self.degree,
            generators: GeneratorSpec::Images(images),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_spec_len_counts_generators() {
        let spec = GeneratorSpec::Images(vec![vec![2, 1], vec![1, 2]]);
        assert_eq!(spec.len(), 2);
        assert!(!spec.is_empty());
        assert!(GeneratorSpec::Images(vec![]).is_empty());
    }

    #[test]
    fn handle_roundtrips_through_json() {
        let h = GroupHandle::from_images(3, 4, vec![vec![2, 3, 4, 1]]);
        let json = serde_json::to_string(&h).unwrap();
        let back: GroupHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
        assert_eq!(back.index.as_usize(), 3);
    }

    #[test]
    fn derived_handle_keeps_index_and_degree() {
        let h = GroupHandle::from_images(7, 6, vec![vec![2, 1]]);
        let f = h.derived(vec![vec![1, 2, 4, 3]]);
        assert_eq!(f.index, h.index);
        assert_eq!(f.degree, 6);
        assert_ne!(f.generators, h.generators);
    }
}
