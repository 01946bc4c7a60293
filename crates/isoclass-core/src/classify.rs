//! Classification orchestration.
//!
//! Fingerprints feed buckets; buckets feed the catalog adapter, the factor
//! fast path, and the cascade; every merge flows through the disjoint-set
//! forest with evidence attached. The final root count is the answer; the
//! audit records and merge log are its proof.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::audit::{TypeAudit, build_audit_fingerprints};
use crate::bucket::BucketIndex;
use crate::cascade::{CascadeOutcome, NonIsoCascade};
use crate::certificate::{CertificateVerifier, ProofMap, ProofRecord, Verdict};
use crate::config::EngineConfig;
use crate::dsu::{DisjointSet, MergeEvidence};
use crate::error::EngineError;
use crate::factors::{FactorComparison, FactorDecomposer};
use crate::fingerprint::{Fingerprint, FingerprintBuilder, InvariantField};
use crate::handle::{GroupHandle, GroupIndex};
use crate::oracle::{AlgebraOracle, CanonicalId, CatalogAnswer};
use crate::signature::SignatureKey;

/// One merge with its evidence, in the order merges happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub a: GroupIndex,
    pub b: GroupIndex,
    pub evidence: MergeEvidence,
}

/// Funnel counters for one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub groups: usize,
    pub buckets: usize,
    pub singleton_buckets: usize,
    /// Groups that resolved to a canonical identifier.
    pub catalog_resolved: usize,
    pub catalog_merges: usize,
    pub certificate_merges: usize,
    /// Pairs settled by factor-shape comparison alone.
    pub factor_distinguished: u64,
    /// Pairs settled by one cascade rung, per field.
    pub distinguished_by: BTreeMap<InvariantField, u64>,
    pub direct_tests: u64,
}

/// The classification result with everything needed to audit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub type_count: usize,
    /// 1-based type label per input index.
    pub type_labels: Vec<usize>,
    pub fingerprints: Vec<Fingerprint>,
    pub merges: Vec<MergeRecord>,
    pub audits: Vec<TypeAudit>,
    /// Witness certificates the cascade produced and the verifier accepted,
    /// appended after the supplied proofs in evidence numbering. The
    /// harness stages these into the master proof set.
    pub generated_proofs: Vec<ProofRecord>,
    pub stats: RunStats,
}

/// The engine's front door.
pub struct Classifier<'a, O: AlgebraOracle> {
    oracle: &'a O,
    config: &'a EngineConfig,
}

impl<'a, O: AlgebraOracle> Classifier<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a O, config: &'a EngineConfig) -> Self {
        Self { oracle, config }
    }

    /// Classify `handles` into isomorphism types, consuming `proofs` as
    /// untrusted merge candidates.
    pub fn run(
        &self,
        handles: &[GroupHandle],
        proofs: &[ProofRecord],
    ) -> Result<Classification, EngineError> {
        let n = handles.len();
        for (pi, proof) in proofs.iter().enumerate() {
            if proof.duplicate.as_usize() >= n || proof.representative.as_usize() >= n {
                return Err(EngineError::InputIntegrity(format!(
                    "proof {pi} references {} -> {} but only {n} groups were loaded",
                    proof.duplicate, proof.representative
                )));
            }
        }

        let mut stats = RunStats {
            groups: n,
            ..RunStats::default()
        };

        // Phase 1: fingerprints and keys.
        let builder = FingerprintBuilder::new(self.oracle);
        let mut fingerprints = Vec::with_capacity(n);
        let mut keys = Vec::with_capacity(n);
        for handle in handles {
            let fp = builder.build_full(handle)?;
            let key = SignatureKey::from_fingerprint(&fp).ok_or_else(|| {
                EngineError::InputIntegrity(format!(
                    "fingerprint for group {} is missing a signature field",
                    handle.index
                ))
            })?;
            fingerprints.push(fp);
            keys.push(key);
        }

        let buckets = BucketIndex::build(
            handles
                .iter()
                .zip(&keys)
                .map(|(h, k)| (h.index, k.clone())),
        );
        stats.buckets = buckets.bucket_count();
        stats.singleton_buckets = buckets.singleton_count();

        let mut dsu = DisjointSet::new(n);
        let verifier = CertificateVerifier::new(self.oracle);
        let mut decomposer = FactorDecomposer::new(self.oracle);
        let cascade = NonIsoCascade::new(self.oracle, &self.config.cascade);

        // Phase 2: canonical identifiers. Every member of a bucket has the
        // same order, so catalog coverage is uniform per bucket.
        let mut catalog_ids: HashMap<usize, CanonicalId> = HashMap::new();
        for (key, members) in buckets.multi_buckets() {
            if !self.config.catalog.covers(key.order) {
                continue;
            }
            let mut by_id: BTreeMap<CanonicalId, Vec<usize>> = BTreeMap::new();
            for &m in members {
                let i = m.as_usize();
                match self.oracle.canonical_id(&handles[i])? {
                    CatalogAnswer::Id(id) => {
                        catalog_ids.insert(i, id);
                        by_id.entry(id).or_default().push(i);
                    }
                    CatalogAnswer::NotApplicable => {}
                }
            }
            for (id, same) in &by_id {
                for &other in &same[1..] {
                    if dsu.union(same[0], other, MergeEvidence::SharedCanonicalId { id: *id }) {
                        stats.catalog_merges += 1;
                    }
                }
            }
        }
        stats.catalog_resolved = catalog_ids.len();

        // Phase 3: supplied certificates. A single rejection fails the run.
        for (pi, proof) in proofs.iter().enumerate() {
            let g = &handles[proof.duplicate.as_usize()];
            let h = &handles[proof.representative.as_usize()];
            match verifier.verify(g, h, &proof.map)? {
                Verdict::Accepted => {
                    if dsu.union(
                        proof.duplicate.as_usize(),
                        proof.representative.as_usize(),
                        MergeEvidence::VerifiedCertificate { proof_index: pi },
                    ) {
                        stats.certificate_merges += 1;
                    }
                }
                Verdict::Rejected(failure) => {
                    return Err(EngineError::CertificateRejected { proof: pi, failure });
                }
            }
        }

        // Phase 4: residual pairs. A pair where both sides hold a canonical
        // identifier is already settled (equal id merged in phase 2, unequal
        // id proves non-isomorphism); everything else reaches the factor
        // path and the cascade.
        let mut generated_proofs: Vec<ProofRecord> = Vec::new();
        for (key, members) in buckets.multi_buckets() {
            for (pa, &ma) in members.iter().enumerate() {
                for &mb in members.iter().skip(pa + 1) {
                    let (a, b) = (ma.as_usize(), mb.as_usize());
                    if dsu.find(a) == dsu.find(b) {
                        continue;
                    }
                    if catalog_ids.contains_key(&a) && catalog_ids.contains_key(&b) {
                        continue;
                    }
                    self.resolve_pair(
                        handles,
                        &fingerprints,
                        key,
                        (a, b),
                        proofs.len(),
                        &verifier,
                        &mut decomposer,
                        &cascade,
                        &mut dsu,
                        &mut generated_proofs,
                        &mut stats,
                    )?;
                }
            }
        }

        // Phase 5: labels and audits.
        let type_labels = dsu.type_labels();
        let roots = dsu.roots();
        let reps: Vec<(GroupIndex, Fingerprint)> = roots
            .iter()
            .map(|&r| (GroupIndex(r), fingerprints[r].clone()))
            .collect();
        let audits = build_audit_fingerprints(&reps, &self.config.cascade.order);
        let merges = dsu
            .merge_log()
            .iter()
            .map(|(a, b, e)| MergeRecord {
                a: *a,
                b: *b,
                evidence: e.clone(),
            })
            .collect();

        Ok(Classification {
            type_count: roots.len(),
            type_labels,
            fingerprints,
            merges,
            audits,
            generated_proofs,
            stats,
        })
    }

    /// Settle one same-bucket pair: factor fast path first, then the
    /// cascade. An isomorphism witness from either path becomes a proof
    /// record and must pass the verifier before it merges anything.
    #[allow(clippy::too_many_arguments)]
    fn resolve_pair(
        &self,
        handles: &[GroupHandle],
        fingerprints: &[Fingerprint],
        key: &SignatureKey,
        (a, b): (usize, usize),
        supplied_proofs: usize,
        verifier: &CertificateVerifier<'a, O>,
        decomposer: &mut FactorDecomposer<'a, O>,
        cascade: &NonIsoCascade<'a, O>,
        dsu: &mut DisjointSet,
        generated_proofs: &mut Vec<ProofRecord>,
        stats: &mut RunStats,
    ) -> Result<(), EngineError> {
        let ga = &handles[a];
        let gb = &handles[b];

        let fa = decomposer.decompose(ga)?.cloned();
        if let Some(fa) = fa {
            if let Some(fb) = decomposer.decompose(gb)?.cloned() {
                match decomposer.compare(ga, &fa, gb, &fb)? {
                    FactorComparison::Matched { witnesses, .. } => {
                        // The witness maps read left to right, so the pair's
                        // first group is the one replayed as the source.
                        let proof = ProofRecord {
                            duplicate: GroupIndex(a),
                            representative: GroupIndex(b),
                            map: ProofMap::PerFactor(witnesses),
                        };
                        return self.merge_with_proof(
                            ga,
                            gb,
                            proof,
                            supplied_proofs,
                            verifier,
                            dsu,
                            generated_proofs,
                            stats,
                        );
                    }
                    FactorComparison::CountMismatch
                    | FactorComparison::OrderMismatch
                    | FactorComparison::NoCompleteMatching => {
                        stats.factor_distinguished += 1;
                        return Ok(());
                    }
                }
            }
        }

        match cascade.run((ga, &fingerprints[a]), (gb, &fingerprints[b]))? {
            CascadeOutcome::Distinguished { field } => {
                if field == InvariantField::DirectIsomorphismTest {
                    stats.direct_tests += 1;
                }
                *stats.distinguished_by.entry(field).or_insert(0) += 1;
                Ok(())
            }
            CascadeOutcome::ProvedIsomorphic { witness } => {
                stats.direct_tests += 1;
                let proof = ProofRecord {
                    duplicate: GroupIndex(a),
                    representative: GroupIndex(b),
                    map: ProofMap::Flat(witness),
                };
                self.merge_with_proof(
                    ga,
                    gb,
                    proof,
                    supplied_proofs,
                    verifier,
                    dsu,
                    generated_proofs,
                    stats,
                )
            }
            CascadeOutcome::Unresolved => Err(EngineError::NotDistinguished {
                a: GroupIndex(a),
                b: GroupIndex(b),
                key: key.clone(),
            }),
        }
    }

    /// Verify a cascade- or factor-produced proof and merge on acceptance.
    /// A rejection here means the oracle's witness did not survive
    /// independent checking, which is fatal.
    #[allow(clippy::too_many_arguments)]
    fn merge_with_proof(
        &self,
        g: &GroupHandle,
        h: &GroupHandle,
        proof: ProofRecord,
        supplied_proofs: usize,
        verifier: &CertificateVerifier<'a, O>,
        dsu: &mut DisjointSet,
        generated_proofs: &mut Vec<ProofRecord>,
        stats: &mut RunStats,
    ) -> Result<(), EngineError> {
        let proof_index = supplied_proofs + generated_proofs.len();
        match verifier.verify(g, h, &proof.map)? {
            Verdict::Accepted => {
                if dsu.union(
                    proof.duplicate.as_usize(),
                    proof.representative.as_usize(),
                    MergeEvidence::VerifiedCertificate { proof_index },
                ) {
                    stats.certificate_merges += 1;
                }
                generated_proofs.push(proof);
                Ok(())
            }
            Verdict::Rejected(failure) => Err(EngineError::CertificateRejected {
                proof: proof_index,
                failure,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_stats_default_is_empty() {
        let stats = RunStats::default();
        assert_eq!(stats.groups, 0);
        assert!(stats.distinguished_by.is_empty());
    }

    #[test]
    fn merge_record_roundtrips_through_json() {
        let rec = MergeRecord {
            a: GroupIndex(2),
            b: GroupIndex(5),
            evidence: MergeEvidence::VerifiedCertificate { proof_index: 0 },
        };
        let json = serde_json::to_string(&rec).unwrap();
        let back: MergeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
