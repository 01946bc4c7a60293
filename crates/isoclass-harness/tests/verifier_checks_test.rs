//! Integration test: individual verifier checks against real groups.
//!
//! Validates that:
//! 1. A proof linking groups of different order is rejected at check 1,
//!    before the map itself is inspected.
//! 2. A proposed generator list that spans only a proper subgroup is
//!    rejected at check 4.
//!
//! Run: cargo test -p isoclass-harness --test verifier_checks_test

use isoclass_core::{
    CertificateVerifier, CheckFailure, GeneratorMap, GeneratorSpec, GroupHandle, ProofMap, Verdict,
};
use isoclass_oracle::NaiveOracle;

fn c4() -> GroupHandle {
    GroupHandle::new(0, 4, GeneratorSpec::Words(vec!["(1,2,3,4)".into()]))
}

fn d4() -> GroupHandle {
    GroupHandle::new(1, 4, GeneratorSpec::Words(vec!["(1,2,3,4)".into(), "(1,3)".into()]))
}

#[test]
fn order_mismatch_is_rejected_before_the_map_is_read() {
    let oracle = NaiveOracle::default();
    let verifier = CertificateVerifier::new(&oracle);
    // The map is garbage on purpose: check 1 must fire first, so the
    // verifier never looks at it.
    let map = ProofMap::Flat(GeneratorMap::new(vec![vec![9, 9]], vec![]));
    let verdict = verifier.verify(&c4(), &d4(), &map).unwrap();
    let Verdict::Rejected(failure) = verdict else {
        panic!("a C4 -> D4 proof must be rejected");
    };
    assert_eq!(failure, CheckFailure::OrderMismatch { left: 4, right: 8 });
    assert!(failure.to_string().starts_with("check 1"));
}

#[test]
fn non_generating_set_is_rejected_at_the_spanning_check() {
    let oracle = NaiveOracle::default();
    let verifier = CertificateVerifier::new(&oracle);
    // The rotation alone spans C4 inside D4: a valid self-embedding of the
    // subgroup, but not a certificate for the whole group.
    let rotation = vec![2, 3, 4, 1];
    let map = ProofMap::Flat(GeneratorMap::new(
        vec![rotation.clone()],
        vec![rotation],
    ));
    let verdict = verifier.verify(&d4(), &d4(), &map).unwrap();
    assert_eq!(
        verdict,
        Verdict::Rejected(CheckFailure::NotGenerating {
            generated: 4,
            expected: 8,
        })
    );
}
