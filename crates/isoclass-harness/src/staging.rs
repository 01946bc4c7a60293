//! Staging generated proofs into the master proof set.
//!
//! Each duplicate index carries at most one proof in the master set. The
//! first proof seen for a duplicate wins, whether it was already in the
//! master set or appears earlier in the incoming batch; later ones are
//! skipped. Every surviving candidate is re-verified before it is appended,
//! so a master set only ever grows by checked certificates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use isoclass_core::{AlgebraOracle, CertificateVerifier, GroupHandle, ProofRecord, Verdict};

use crate::input::ProofSet;
use crate::runner::HarnessError;

/// What happened to an incoming batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingReport {
    pub appended: usize,
    /// Candidates whose duplicate already had a proof, in the master set
    /// or earlier in the batch.
    pub skipped_covered: usize,
    /// Candidates the verifier turned away.
    pub rejected: usize,
}

/// Stage `incoming` proofs into `master`, first wins per duplicate index.
pub fn stage_proofs<O: AlgebraOracle>(
    oracle: &O,
    handles: &[GroupHandle],
    master: &mut ProofSet,
    incoming: &[ProofRecord],
) -> Result<StagingReport, HarnessError> {
    let verifier = CertificateVerifier::new(oracle);
    let mut covered: HashSet<usize> = master
        .proofs
        .iter()
        .map(|p| p.duplicate.as_usize())
        .collect();
    let mut report = StagingReport::default();

    for proof in incoming {
        let d = proof.duplicate.as_usize();
        let r = proof.representative.as_usize();
        if d >= handles.len() || r >= handles.len() {
            return Err(HarnessError::Integrity(format!(
                "staged proof references {} -> {} but only {} groups were loaded",
                proof.duplicate,
                proof.representative,
                handles.len()
            )));
        }
        if covered.contains(&d) {
            report.skipped_covered += 1;
            continue;
        }
        match verifier.verify(&handles[d], &handles[r], &proof.map)? {
            Verdict::Accepted => {
                covered.insert(d);
                master.proofs.push(proof.clone());
                report.appended += 1;
            }
            Verdict::Rejected(_) => {
                report.rejected += 1;
            }
        }
    }
    Ok(report)
}
