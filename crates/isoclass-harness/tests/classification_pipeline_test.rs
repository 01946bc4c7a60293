//! Integration test: full classification pipeline.
//!
//! Validates that:
//! 1. Isomorphic copies beyond catalog range merge through verified
//!    per-factor certificates.
//! 2. Groups with equal signature keys but mismatched factor shapes are
//!    distinguished without a direct test.
//! 3. Catalog-covered groups settle by canonical identifier alone.
//! 4. Audit records survive independent re-verification.
//!
//! Run: cargo test -p isoclass-harness --test classification_pipeline_test

use isoclass_core::{
    AlgebraOracle, CertificateVerifier, EngineConfig, FingerprintBuilder, GeneratorSpec,
    GroupIndex, InvariantField, IsoAnswer, MergeEvidence, ProofMap, ProofRecord, Verdict,
};
use isoclass_harness::{GroupSet, ProofSet, RunOptions, Runner, SCHEMA_VERSION};
use isoclass_oracle::NaiveOracle;

/// Five groups on 11 points:
/// - index 0: C3 x D4 (one dihedral copy inside Sym{4..7})
/// - index 1: C3 x Q8 (quaternion in its regular representation on 8 points)
/// - index 2: C3 x D4 again, through a different dihedral copy
/// - index 3: D4 alone
/// - index 4: Q8 alone
///
/// Indices 0..=2 share order 24, derived size 2, 15 classes, and
/// abelianization C2 x C2 x C3, so they land in one signature bucket. The
/// order-8 pair shares a bucket too but is settled by the catalog.
fn mixed_set() -> GroupSet {
    GroupSet {
        version: SCHEMA_VERSION,
        degree: 11,
        groups: vec![
            GeneratorSpec::Words(vec!["(1,2,3)".into(), "(4,5,6,7)".into(), "(4,6)".into()]),
            GeneratorSpec::Words(vec![
                "(1,2,3)".into(),
                "(4,6,5,7)(8,11,9,10)".into(),
                "(4,8,5,9)(6,10,7,11)".into(),
            ]),
            GeneratorSpec::Words(vec!["(1,2,3)".into(), "(4,6,5,7)".into(), "(4,5)".into()]),
            GeneratorSpec::Words(vec!["(4,5,6,7)".into(), "(4,6)".into()]),
            GeneratorSpec::Words(vec![
                "(4,6,5,7)(8,11,9,10)".into(),
                "(4,8,5,9)(6,10,7,11)".into(),
            ]),
        ],
    }
}

#[test]
fn five_groups_collapse_to_four_types() {
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();
    let runner = Runner::new(&oracle, &config);
    let result = runner
        .classify_shard(
            &mixed_set(),
            &ProofSet::empty(),
            &RunOptions::default(),
            &mut None,
        )
        .unwrap();

    assert_eq!(result.type_count, 4);
    assert_eq!(
        result.type_labels[0], result.type_labels[2],
        "the two C3 x D4 copies must share a type"
    );
    assert_ne!(result.type_labels[0], result.type_labels[1]);
    assert_ne!(result.type_labels[3], result.type_labels[4]);
}

#[test]
fn factor_mismatch_is_counted_without_direct_tests() {
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();
    let runner = Runner::new(&oracle, &config);
    let result = runner
        .classify_shard(
            &mixed_set(),
            &ProofSet::empty(),
            &RunOptions::default(),
            &mut None,
        )
        .unwrap();

    // (0,1) and (1,2) fail the complete factor matching on the D4/Q8
    // slot even though the C3 factors pair up fine.
    assert_eq!(result.stats.factor_distinguished, 2);
    assert_eq!(
        result.stats.direct_tests, 0,
        "no pair should fall through to a whole-group test"
    );
}

#[test]
fn isomorphic_copies_merge_through_a_verified_factor_certificate() {
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();
    let runner = Runner::new(&oracle, &config);
    let result = runner
        .classify_shard(
            &mixed_set(),
            &ProofSet::empty(),
            &RunOptions::default(),
            &mut None,
        )
        .unwrap();

    assert_eq!(result.generated_proofs.len(), 1);
    assert!(matches!(
        result.generated_proofs[0].map,
        ProofMap::PerFactor(_)
    ));
    assert_eq!(result.stats.certificate_merges, 1);
}

#[test]
fn catalog_settles_small_orders_without_pair_work() {
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();
    let runner = Runner::new(&oracle, &config);
    // Two distinct copies of C4 inside Sym{1..4}: same canonical id.
    let set = GroupSet {
        version: SCHEMA_VERSION,
        degree: 4,
        groups: vec![
            GeneratorSpec::Words(vec!["(1,2,3,4)".into()]),
            GeneratorSpec::Words(vec!["(1,3,2,4)".into()]),
        ],
    };
    let result = runner
        .classify_shard(&set, &ProofSet::empty(), &RunOptions::default(), &mut None)
        .unwrap();

    assert_eq!(result.type_count, 1);
    assert_eq!(result.stats.catalog_merges, 1);
    assert_eq!(result.stats.catalog_resolved, 2);
    assert_eq!(result.stats.direct_tests, 0);
}

#[test]
fn merge_evidence_names_its_source() {
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();
    let runner = Runner::new(&oracle, &config);
    let result = runner
        .classify_shard(
            &mixed_set(),
            &ProofSet::empty(),
            &RunOptions::default(),
            &mut None,
        )
        .unwrap();

    // The only merge is the C3 x D4 pair, backed by generated proof 0.
    let audits_orders: Vec<u64> = result.audits.iter().map(|a| a.order).collect();
    assert_eq!(audits_orders.iter().filter(|&&o| o == 24).count(), 2);
    assert_eq!(audits_orders.iter().filter(|&&o| o == 8).count(), 2);
    assert_eq!(result.generated_proofs.len(), 1);
    // With no supplied proofs the generated certificate gets index 0.
    let set = mixed_set();
    let handles = set.handles();
    let classifier = isoclass_core::Classifier::new(&oracle, &config);
    let classification = classifier.run(&handles, &[]).unwrap();
    assert!(classification.merges.iter().any(|m| matches!(
        m.evidence,
        MergeEvidence::VerifiedCertificate { proof_index: 0 }
    )));
}

#[test]
fn supplied_certificate_short_circuits_the_pair() {
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();
    let runner = Runner::new(&oracle, &config);

    // First run produces the factor certificate; feed it back as a
    // supplied proof and the second run merges without redoing the
    // factor search.
    let first = runner
        .classify_shard(
            &mixed_set(),
            &ProofSet::empty(),
            &RunOptions::default(),
            &mut None,
        )
        .unwrap();
    let proof_set = ProofSet {
        version: SCHEMA_VERSION,
        proofs: first.generated_proofs.clone(),
    };
    let second = runner
        .classify_shard(&mixed_set(), &proof_set, &RunOptions::default(), &mut None)
        .unwrap();

    assert_eq!(second.type_count, 4);
    assert_eq!(second.stats.certificate_merges, 1);
    assert!(second.generated_proofs.is_empty());
}

#[test]
fn generated_certificates_replay_against_their_recorded_endpoints() {
    let oracle = NaiveOracle::default();
    let config = EngineConfig::default();
    let set = mixed_set();
    let handles = set.handles();
    let classifier = isoclass_core::Classifier::new(&oracle, &config);
    let classification = classifier.run(&handles, &[]).unwrap();
    assert!(!classification.generated_proofs.is_empty());

    // A proof record must verify in its own stated direction: generators
    // in the duplicate group, images in the representative. The two
    // C3 x D4 copies use different dihedral presentations, so a proof
    // recorded the wrong way round fails the membership check here.
    let verifier = CertificateVerifier::new(&oracle);
    for proof in &classification.generated_proofs {
        let verdict = verifier
            .verify(
                &handles[proof.duplicate.as_usize()],
                &handles[proof.representative.as_usize()],
                &proof.map,
            )
            .unwrap();
        assert_eq!(verdict, Verdict::Accepted);
    }
}

#[test]
fn fingerprints_are_deterministic_across_oracle_instances() {
    let set = mixed_set();
    let handles = set.handles();
    // Fresh oracles so the second pass cannot ride the first one's cache.
    let first_oracle = NaiveOracle::default();
    let second_oracle = NaiveOracle::default();
    let first = FingerprintBuilder::new(&first_oracle);
    let second = FingerprintBuilder::new(&second_oracle);
    for handle in &handles {
        let a = first.build_full(handle).unwrap();
        let b = second.build_full(handle).unwrap();
        assert_eq!(a, b, "fingerprint of group {} must be stable", handle.index);
    }
}

/// Five groups, three kinds of merge evidence, three final types:
/// - indices 0 and 1 are C4 copies settled by a shared canonical id;
/// - indices 2 and 3 generate the same D4 and are linked by a supplied,
///   verified certificate (order 8 is excluded from the catalog here, so
///   the certificate is the only thing merging them);
/// - index 4 is Q8, split from the D4 pair at the element-order-histogram
///   rung of the cascade.
#[test]
fn mixed_evidence_partitions_five_groups_into_three_types() {
    let oracle = NaiveOracle::default();
    let mut config = EngineConfig::default();
    config.catalog.excluded.insert(8);
    let runner = Runner::new(&oracle, &config);

    let set = GroupSet {
        version: SCHEMA_VERSION,
        degree: 8,
        groups: vec![
            GeneratorSpec::Words(vec!["(1,2,3,4)".into()]),
            GeneratorSpec::Words(vec!["(1,3,2,4)".into()]),
            GeneratorSpec::Words(vec!["(1,2,3,4)".into(), "(1,3)".into()]),
            GeneratorSpec::Words(vec!["(1,2,3,4)".into(), "(1,2)(3,4)".into()]),
            GeneratorSpec::Words(vec![
                "(1,3,2,4)(5,8,6,7)".into(),
                "(1,5,2,6)(3,7,4,8)".into(),
            ]),
        ],
    };
    let handles = set.handles();
    let IsoAnswer::Isomorphic(map) = oracle.isomorphism(&handles[3], &handles[2]).unwrap() else {
        panic!("the two D4 generator lists span the same subgroup");
    };
    let proof_set = ProofSet {
        version: SCHEMA_VERSION,
        proofs: vec![ProofRecord {
            duplicate: GroupIndex(3),
            representative: GroupIndex(2),
            map: ProofMap::Flat(map),
        }],
    };

    let result = runner
        .classify_shard(&set, &proof_set, &RunOptions::default(), &mut None)
        .unwrap();

    assert_eq!(result.type_count, 3);
    assert_eq!(result.type_labels, vec![1, 1, 2, 2, 3]);
    assert_eq!(result.stats.catalog_merges, 1);
    assert_eq!(result.stats.certificate_merges, 1);
    // D4 vs Q8 twice: same derived size, class count, abelianization, and
    // exponent, but five involutions against one.
    assert_eq!(
        result
            .stats
            .distinguished_by
            .get(&InvariantField::ElementOrderHistogram)
            .copied(),
        Some(2)
    );
    assert_eq!(result.stats.direct_tests, 0);
    assert!(result.generated_proofs.is_empty());
}
