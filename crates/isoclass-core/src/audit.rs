//! Minimal audit fingerprints.
//!
//! For each isomorphism type the report keeps only the cheapest fields
//! needed to distinguish its representative from every other type of the
//! same order, walking the cascade order. The verification phase later
//! recomputes exactly those fields from stored generators and compares.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::fingerprint::{Fingerprint, FingerprintBuilder, InvariantField};
use crate::handle::{GroupHandle, GroupIndex};
use crate::oracle::AlgebraOracle;

/// One type's audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAudit {
    /// 1-based type label.
    pub type_index: usize,
    pub representative: GroupIndex,
    pub order: u64,
    /// Fields the thinned fingerprint retains, in cascade order.
    pub needed_fields: Vec<InvariantField>,
    /// The representative's record thinned to `needed_fields`.
    pub fingerprint: Fingerprint,
    /// True when at least one same-order peer could not be separated by any
    /// record field; those pairs rest on verified certificates or direct
    /// tests instead.
    pub directly_certified: bool,
}

/// Build one audit record per type.
///
/// `reps` carries one `(representative, full fingerprint)` entry per type
/// in type-index order; `cascade_order` is walked cheapest first for each
/// same-order peer and the first separating field is retained.
#[must_use]
pub fn build_audit_fingerprints(
    reps: &[(GroupIndex, Fingerprint)],
    cascade_order: &[InvariantField],
) -> Vec<TypeAudit> {
    reps.iter()
        .enumerate()
        .map(|(pos, (rep, fp))| {
            let mut needed: Vec<InvariantField> = Vec::new();
            let mut directly_certified = false;
            for (peer_pos, (_, peer)) in reps.iter().enumerate() {
                if peer_pos == pos || peer.order != fp.order {
                    continue;
                }
                match first_separating_field(fp, peer, cascade_order) {
                    Some(field) => {
                        if !needed.contains(&field) {
                            needed.push(field);
                        }
                    }
                    None => directly_certified = true,
                }
            }
            // keep the retained list in cascade order for stable output
            needed.sort_by_key(|f| cascade_order.iter().position(|o| o == f));
            TypeAudit {
                type_index: pos + 1,
                representative: *rep,
                order: fp.order,
                fingerprint: fp.retain(&needed),
                needed_fields: needed,
                directly_certified,
            }
        })
        .collect()
}

fn first_separating_field(
    a: &Fingerprint,
    b: &Fingerprint,
    order: &[InvariantField],
) -> Option<InvariantField> {
    order.iter().copied().find(|&field| {
        field != InvariantField::DirectIsomorphismTest
            && matches!(
                (a.field(field), b.field(field)),
                (Some(va), Some(vb)) if va != vb
            )
    })
}

/// Recompute every retained field from the representatives' stored
/// generators and compare against the recorded values.
///
/// Any disagreement means the classification was built on incorrect data
/// and is reported as a fatal invariant mismatch.
pub fn verify_audit_fingerprints<O: AlgebraOracle>(
    oracle: &O,
    handles: &[GroupHandle],
    audits: &[TypeAudit],
) -> Result<(), EngineError> {
    let builder = FingerprintBuilder::new(oracle);
    for audit in audits {
        let i = audit.representative.as_usize();
        let handle = handles.get(i).ok_or_else(|| {
            EngineError::InputIntegrity(format!(
                "audit for type {} references missing group {}",
                audit.type_index, audit.representative
            ))
        })?;
        let recomputed = builder.build(handle, &audit.needed_fields)?;
        if recomputed.order != audit.order {
            return Err(EngineError::InputIntegrity(format!(
                "group {} has order {}, audit recorded {}",
                audit.representative, recomputed.order, audit.order
            )));
        }
        for &field in &audit.needed_fields {
            if recomputed.field(field) != audit.fingerprint.field(field) {
                return Err(EngineError::InvariantMismatch {
                    index: audit.representative,
                    field,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CascadeConfig;
    use crate::fingerprint::Solvability;
    use std::collections::BTreeMap;

    fn fp(order: u64, classes: u64, hist: &[(u64, u64)]) -> Fingerprint {
        Fingerprint {
            order,
            derived_size: Some(2),
            class_count: Some(classes),
            solvability: Some(Solvability::Solvable { derived_length: 2 }),
            abelian_invariants: Some(vec![2, 2]),
            element_order_histogram: Some(hist.iter().copied().collect::<BTreeMap<_, _>>()),
            ..Fingerprint::default()
        }
    }

    #[test]
    fn retained_fields_are_the_cheapest_separators() {
        // D4 and Q8: same class count, separated by the order histogram
        // (five involutions vs one).
        let d4 = fp(8, 5, &[(1, 1), (2, 5), (4, 2)]);
        let q8 = fp(8, 5, &[(1, 1), (2, 1), (4, 6)]);
        let audits = build_audit_fingerprints(
            &[(GroupIndex(0), d4), (GroupIndex(1), q8)],
            &CascadeConfig::default().order,
        );
        assert_eq!(audits.len(), 2);
        for audit in &audits {
            assert_eq!(
                audit.needed_fields,
                vec![InvariantField::ElementOrderHistogram]
            );
            assert!(!audit.directly_certified);
            // the thinned record drops everything else
            assert_eq!(audit.fingerprint.derived_size, None);
            assert!(audit.fingerprint.element_order_histogram.is_some());
        }
    }

    #[test]
    fn different_orders_need_no_fields_at_all() {
        let a = fp(8, 5, &[(1, 1), (2, 5), (4, 2)]);
        let b = fp(16, 10, &[(1, 1), (2, 3), (4, 12)]);
        let audits = build_audit_fingerprints(
            &[(GroupIndex(0), a), (GroupIndex(1), b)],
            &CascadeConfig::default().order,
        );
        assert!(audits.iter().all(|t| t.needed_fields.is_empty()));
    }

    #[test]
    fn inseparable_peers_are_flagged_directly_certified() {
        let a = fp(8, 5, &[(1, 1), (2, 5), (4, 2)]);
        let twin = a.clone();
        let audits = build_audit_fingerprints(
            &[(GroupIndex(0), a), (GroupIndex(1), twin)],
            &CascadeConfig::default().order,
        );
        assert!(audits[0].directly_certified);
        assert!(audits[1].directly_certified);
    }

    #[test]
    fn type_indices_are_one_based() {
        let audits = build_audit_fingerprints(
            &[(GroupIndex(3), fp(8, 5, &[(1, 1)]))],
            &CascadeConfig::default().order,
        );
        assert_eq!(audits[0].type_index, 1);
        assert_eq!(audits[0].representative, GroupIndex(3));
    }
}
