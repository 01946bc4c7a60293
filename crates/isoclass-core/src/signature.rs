//! Signature keys for bucketing.

use serde::{Deserialize, Serialize};

use crate::fingerprint::{Fingerprint, Solvability};

/// The cheap invariant sub-tuple used to bucket candidates.
///
/// Distinct keys guarantee non-isomorphism; equal keys are only a candidacy
/// signal. This is a structural composite key, never a stringified one.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SignatureKey {
    pub order: u64,
    pub derived_size: u64,
    pub class_count: u64,
    pub solvability: Solvability,
    pub abelian_invariants: Vec<u64>,
}

impl SignatureKey {
    /// The fields a fingerprint must carry to yield a key.
    ///
    /// Returns `None` when the record was built without all five key
    /// fields, which is an input-integrity problem for the caller.
    #[must_use]
    pub fn from_fingerprint(fp: &Fingerprint) -> Option<Self> {
        Some(Self {
            order: fp.order,
            derived_size: fp.derived_size?,
            class_count: fp.class_count?,
            solvability: fp.solvability?,
            abelian_invariants: fp.abelian_invariants.clone()?,
        })
    }
}

impl std::fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dl = match self.solvability {
            Solvability::Solvable { derived_length } => derived_length as i64,
            Solvability::NonSolvable => -1,
        };
        write!(
            f,
            "({}, {}, {}, {}, {:?})",
            self.order, self.derived_size, self.class_count, dl, self.abelian_invariants
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;

    fn fp(order: u64, derived: u64, classes: u64, dl: u32, ab: &[u64]) -> Fingerprint {
        Fingerprint {
            order,
            derived_size: Some(derived),
            class_count: Some(classes),
            solvability: Some(Solvability::Solvable { derived_length: dl }),
            abelian_invariants: Some(ab.to_vec()),
            ..Fingerprint::default()
        }
    }

    #[test]
    fn cyclic_and_klein_four_get_distinct_keys() {
        // C4 and C2 x C2 agree on everything cheap except the abelian
        // invariants.
        let c4 = SignatureKey::from_fingerprint(&fp(4, 1, 4, 1, &[4])).unwrap();
        let v4 = SignatureKey::from_fingerprint(&fp(4, 1, 4, 1, &[2, 2])).unwrap();
        assert_ne!(c4, v4);
    }

    #[test]
    fn dihedral_and_quaternion_share_a_key() {
        // D4 and Q8: both have derived size 2, 5 classes, derived length 2,
        // abelianization C2 x C2. The key cannot separate them.
        let d4 = SignatureKey::from_fingerprint(&fp(8, 2, 5, 2, &[2, 2])).unwrap();
        let q8 = SignatureKey::from_fingerprint(&fp(8, 2, 5, 2, &[2, 2])).unwrap();
        assert_eq!(d4, q8);
    }

    #[test]
    fn key_requires_all_five_fields() {
        let mut partial = fp(6, 3, 3, 2, &[2]);
        partial.class_count = None;
        assert!(SignatureKey::from_fingerprint(&partial).is_none());
    }

    #[test]
    fn display_uses_minus_one_for_non_solvable() {
        let a5 = SignatureKey {
            order: 60,
            derived_size: 60,
            class_count: 5,
            solvability: Solvability::NonSolvable,
            abelian_invariants: vec![],
        };
        assert!(a5.to_string().contains("-1"));
    }
}
