//! The non-isomorphism cascade.
//!
//! Two groups that share a bucket and have no canonical identifiers are
//! walked through the configured invariant order, cheapest first. The first
//! disagreeing field proves non-isomorphism; the direct isomorphism test is
//! simply the most expensive rung of the same list. A pair that exhausts
//! the list without either a difference or a witness is `Unresolved`, which
//! callers must treat as fatal.

use crate::config::CascadeConfig;
use crate::fingerprint::{Fingerprint, InvariantField};
use crate::handle::GroupHandle;
use crate::oracle::{AlgebraOracle, GeneratorMap, IsoAnswer, OracleError};

/// Record-level comparison outcome; no oracle involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Distinguished { field: InvariantField },
    Indistinguishable,
}

/// Full cascade outcome for a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// Non-isomorphic, proved by one field (or by the direct test).
    Distinguished { field: InvariantField },
    /// The direct test found a witness map. It still goes through the
    /// certificate path before any merge.
    ProvedIsomorphic { witness: GeneratorMap },
    /// Every configured rung agreed and no direct test ran. Fatal for the
    /// caller.
    Unresolved,
}

/// Walk `order` over two records, reporting the first field whose recorded
/// values differ. Fields absent from either record are skipped, as is the
/// direct-test rung; this is the pure-record prefix of the full cascade.
#[must_use]
pub fn compare_records(
    a: &Fingerprint,
    b: &Fingerprint,
    order: &[InvariantField],
) -> RecordOutcome {
    for &field in order {
        if field == InvariantField::DirectIsomorphismTest {
            continue;
        }
        if let (Some(va), Some(vb)) = (a.field(field), b.field(field)) {
            if va != vb {
                return RecordOutcome::Distinguished { field };
            }
        }
    }
    RecordOutcome::Indistinguishable
}

/// Cascade runner binding an oracle to a configured order.
pub struct NonIsoCascade<'a, O: AlgebraOracle> {
    oracle: &'a O,
    config: &'a CascadeConfig,
}

impl<'a, O: AlgebraOracle> NonIsoCascade<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a O, config: &'a CascadeConfig) -> Self {
        Self { oracle, config }
    }

    /// Resolve one pair. The records must have been built with every field
    /// the configured order walks; both-absent fields are skipped silently
    /// since a thinner record only makes the cascade reach further.
    pub fn run(
        &self,
        a: (&GroupHandle, &Fingerprint),
        b: (&GroupHandle, &Fingerprint),
    ) -> Result<CascadeOutcome, OracleError> {
        for &field in &self.config.order {
            if field == InvariantField::DirectIsomorphismTest {
                return Ok(match self.oracle.isomorphism(a.0, b.0)? {
                    IsoAnswer::Isomorphic(witness) => CascadeOutcome::ProvedIsomorphic { witness },
                    IsoAnswer::NonIsomorphic => CascadeOutcome::Distinguished { field },
                });
            }
            if let (Some(va), Some(vb)) = (a.1.field(field), b.1.field(field)) {
                if va != vb {
                    return Ok(CascadeOutcome::Distinguished { field });
                }
            }
        }
        Ok(CascadeOutcome::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Solvability;

    fn base() -> Fingerprint {
        Fingerprint {
            order: 16,
            derived_size: Some(2),
            class_count: Some(10),
            solvability: Some(Solvability::Solvable { derived_length: 2 }),
            abelian_invariants: Some(vec![2, 4]),
            exponent: Some(8),
            center_size: Some(4),
            ..Fingerprint::default()
        }
    }

    #[test]
    fn first_differing_field_wins() {
        let a = base();
        let mut b = base();
        b.class_count = Some(7);
        b.center_size = Some(2);
        let out = compare_records(&a, &b, &CascadeConfig::default().order);
        assert_eq!(
            out,
            RecordOutcome::Distinguished {
                field: InvariantField::ClassCount
            }
        );
    }

    #[test]
    fn center_size_rung_fires_when_cheaper_rungs_agree() {
        // Modular group of order 16 vs C4 : C4 both have center of order 4;
        // synthetic records here differ only at the center rung.
        let a = base();
        let mut b = base();
        b.center_size = Some(8);
        let out = compare_records(&a, &b, &CascadeConfig::default().order);
        assert_eq!(
            out,
            RecordOutcome::Distinguished {
                field: InvariantField::CenterSize
            }
        );
    }

    #[test]
    fn identical_records_are_indistinguishable() {
        let a = base();
        let b = base();
        assert_eq!(
            compare_records(&a, &b, &CascadeConfig::default().order),
            RecordOutcome::Indistinguishable
        );
    }

    #[test]
    fn absent_fields_are_skipped_not_compared() {
        let a = base();
        let mut b = base();
        b.center_size = None;
        // the one differing field is absent on one side, so the records
        // cannot be separated
        let mut a2 = a.clone();
        a2.center_size = Some(2);
        assert_eq!(
            compare_records(&a2, &b, &CascadeConfig::default().order),
            RecordOutcome::Indistinguishable
        );
    }

    #[test]
    fn custom_order_is_respected() {
        let a = base();
        let mut b = base();
        b.exponent = Some(4);
        b.class_count = Some(7);
        let order = vec![InvariantField::Exponent, InvariantField::ClassCount];
        assert_eq!(
            compare_records(&a, &b, &order),
            RecordOutcome::Distinguished {
                field: InvariantField::Exponent
            }
        );
    }
}
