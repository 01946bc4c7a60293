//! Input file loading and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use isoclass_core::{GeneratorSpec, GroupHandle, ProofRecord};

/// Schema version accepted by the current binary.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors raised while loading input files.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported schema version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("empty group set")]
    Empty,
}

/// A batch of permutation groups sharing one ambient degree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSet {
    /// Schema version.
    pub version: u32,
    /// Ambient permutation degree for every group in the set.
    pub degree: u16,
    /// Generator lists, one entry per group, indexed by position.
    pub groups: Vec<GeneratorSpec>,
}

impl GroupSet {
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let set: Self = serde_json::from_str(json)?;
        set.check()?;
        Ok(set)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn check(&self) -> Result<(), InputError> {
        if self.version != SCHEMA_VERSION {
            return Err(InputError::Version {
                found: self.version,
                expected: SCHEMA_VERSION,
            });
        }
        if self.groups.is_empty() {
            return Err(InputError::Empty);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Materialize handles, assigning indices by position in the file.
    pub fn handles(&self) -> Vec<GroupHandle> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, spec)| GroupHandle::new(i, self.degree, spec.clone()))
            .collect()
    }
}

/// A batch of isomorphism certificates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofSet {
    /// Schema version.
    pub version: u32,
    /// Certificates in submission order.
    pub proofs: Vec<ProofRecord>,
}

impl ProofSet {
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            proofs: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let set: Self = serde_json::from_str(json)?;
        if set.version != SCHEMA_VERSION {
            return Err(InputError::Version {
                found: set.version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(set)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
