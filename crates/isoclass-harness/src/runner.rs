//! Run orchestration: sharding, classification, post-run verification.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use isoclass_core::{
    Classification, Classifier, ConjugacyCascade, ConjugacyStats, EngineConfig, EngineError,
    GroupHandle, GroupIndex, OracleError, ProofRecord, RunStats, TypeAudit,
    shard::indices_for_worker, verify_audit_fingerprints,
};
use isoclass_core::{AlgebraOracle, CertificateVerifier, Verdict};

use crate::input::{GroupSet, InputError, ProofSet, SCHEMA_VERSION};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, Phase};

/// Errors surfaced by the harness layer.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input integrity: {0}")]
    Integrity(String),
    #[error("{count} conjugate pair(s) found among classified representatives")]
    ConjugacyViolations { count: usize },
}

/// Shard selection and expectation options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 1-based worker identifier.
    pub worker: usize,
    pub num_workers: usize,
    /// Expected final type count, checked after classification.
    pub expected: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            worker: 1,
            num_workers: 1,
            expected: None,
        }
    }
}

/// One worker's self-contained output, written to disk for a later merge.
///
/// Indices inside `indices`, `audits`, and `generated_proofs` are global
/// input positions; `type_labels` are 1-based labels local to this worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResult {
    pub version: u32,
    pub worker: usize,
    pub num_workers: usize,
    pub total_groups: usize,
    /// Global indices of the groups this worker processed, in shard order.
    pub indices: Vec<usize>,
    /// Local type label per shard member, parallel to `indices`.
    pub type_labels: Vec<usize>,
    pub type_count: usize,
    pub stats: RunStats,
    pub audits: Vec<TypeAudit>,
    pub generated_proofs: Vec<ProofRecord>,
    /// Set only when `--expected` was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_match: Option<bool>,
}

impl WorkerResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Per-proof verdict from a standalone verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofVerdict {
    pub proof_index: usize,
    pub duplicate: GroupIndex,
    pub representative: GroupIndex,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Drives the engine over loaded inputs.
pub struct Runner<'a, O: AlgebraOracle> {
    oracle: &'a O,
    config: &'a EngineConfig,
}

impl<'a, O: AlgebraOracle> Runner<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a O, config: &'a EngineConfig) -> Self {
        Self { oracle, config }
    }

    /// Classify this worker's shard of the input set.
    ///
    /// Supplied proofs whose endpoints both fall inside the shard are
    /// remapped and consumed; proofs crossing the shard boundary are
    /// skipped with a warning, since no single worker can check them.
    /// After classification the audit records are independently
    /// re-verified against the oracle before the result is returned.
    pub fn classify_shard(
        &self,
        set: &GroupSet,
        proofs: &ProofSet,
        opts: &RunOptions,
        log: &mut Option<LogEmitter>,
    ) -> Result<WorkerResult, HarnessError> {
        if opts.worker == 0 || opts.worker > opts.num_workers {
            return Err(HarnessError::Integrity(format!(
                "worker {} out of range for {} workers",
                opts.worker, opts.num_workers
            )));
        }

        let started = Instant::now();
        let total = set.len();
        let indices = indices_for_worker(opts.worker, opts.num_workers, total);

        if let Some(em) = log.as_mut() {
            em.emit_entry(
                LogEntry::new("", LogLevel::Info, "classify_start")
                    .with_phase(Phase::Classify)
                    .with_worker(opts.worker)
                    .with_details(serde_json::json!({
                        "total_groups": total,
                        "shard_size": indices.len(),
                        "num_workers": opts.num_workers,
                    })),
            )?;
        }

        // Re-handle the shard with local indices so the engine sees a
        // dense 0..k range.
        let shard_handles: Vec<GroupHandle> = indices
            .iter()
            .enumerate()
            .map(|(local, &global)| {
                GroupHandle::new(local, set.degree, set.groups[global].clone())
            })
            .collect();

        let local_of = |global: GroupIndex| indices.binary_search(&global.as_usize()).ok();
        let mut local_proofs = Vec::new();
        for proof in &proofs.proofs {
            match (local_of(proof.duplicate), local_of(proof.representative)) {
                (Some(d), Some(r)) => local_proofs.push(ProofRecord {
                    duplicate: GroupIndex(d),
                    representative: GroupIndex(r),
                    map: proof.map.clone(),
                }),
                _ => {
                    if let Some(em) = log.as_mut() {
                        em.emit_entry(
                            LogEntry::new("", LogLevel::Warn, "proof_outside_shard")
                                .with_phase(Phase::Classify)
                                .with_worker(opts.worker)
                                .with_pair(
                                    proof.duplicate.as_usize(),
                                    proof.representative.as_usize(),
                                ),
                        )?;
                    }
                }
            }
        }

        let classifier = Classifier::new(self.oracle, self.config);
        let classification = classifier.run(&shard_handles, &local_proofs)?;

        // Post-run verification: recompute every audited field.
        verify_audit_fingerprints(self.oracle, &shard_handles, &classification.audits)?;

        let result = self.globalize(set, opts, &indices, classification);

        if let Some(em) = log.as_mut() {
            let outcome = match result.expected_match {
                Some(false) => Outcome::Fail,
                _ => Outcome::Pass,
            };
            em.emit_entry(
                LogEntry::new("", LogLevel::Info, "classify_done")
                    .with_phase(Phase::Classify)
                    .with_worker(opts.worker)
                    .with_type_count(result.type_count)
                    .with_outcome(outcome)
                    .with_duration_ms(started.elapsed().as_millis() as u64),
            )?;
            em.flush()?;
        }

        Ok(result)
    }

    /// Map a shard-local classification back to global input indices.
    fn globalize(
        &self,
        set: &GroupSet,
        opts: &RunOptions,
        indices: &[usize],
        classification: Classification,
    ) -> WorkerResult {
        let to_global = |i: GroupIndex| GroupIndex(indices[i.as_usize()]);
        let audits = classification
            .audits
            .into_iter()
            .map(|mut a| {
                a.representative = to_global(a.representative);
                a
            })
            .collect();
        let generated_proofs = classification
            .generated_proofs
            .into_iter()
            .map(|mut p| {
                p.duplicate = to_global(p.duplicate);
                p.representative = to_global(p.representative);
                p
            })
            .collect();
        let expected_match = opts.expected.map(|e| e == classification.type_count);

        WorkerResult {
            version: SCHEMA_VERSION,
            worker: opts.worker,
            num_workers: opts.num_workers,
            total_groups: set.len(),
            indices: indices.to_vec(),
            type_labels: classification.type_labels,
            type_count: classification.type_count,
            stats: classification.stats,
            audits,
            generated_proofs,
            expected_match,
        }
    }

    /// Verify every proof in `proofs` against the loaded groups without
    /// classifying anything. Verdicts are reported per proof; nothing is
    /// merged.
    pub fn verify_proofs(
        &self,
        set: &GroupSet,
        proofs: &ProofSet,
        log: &mut Option<LogEmitter>,
    ) -> Result<Vec<ProofVerdict>, HarnessError> {
        let handles = set.handles();
        let verifier = CertificateVerifier::new(self.oracle);
        let mut verdicts = Vec::with_capacity(proofs.proofs.len());
        for (pi, proof) in proofs.proofs.iter().enumerate() {
            let d = proof.duplicate.as_usize();
            let r = proof.representative.as_usize();
            if d >= handles.len() || r >= handles.len() {
                return Err(HarnessError::Integrity(format!(
                    "proof {pi} references {} -> {} but only {} groups were loaded",
                    proof.duplicate,
                    proof.representative,
                    handles.len()
                )));
            }
            let verdict = verifier.verify(&handles[d], &handles[r], &proof.map)?;
            let (accepted, failure) = match verdict {
                Verdict::Accepted => (true, None),
                Verdict::Rejected(f) => (false, Some(f.to_string())),
            };
            if let Some(em) = log.as_mut() {
                em.emit_entry(
                    LogEntry::new("", LogLevel::Info, "proof_checked")
                        .with_phase(Phase::Verify)
                        .with_pair(d, r)
                        .with_outcome(if accepted { Outcome::Pass } else { Outcome::Fail }),
                )?;
            }
            verdicts.push(ProofVerdict {
                proof_index: pi,
                duplicate: proof.duplicate,
                representative: proof.representative,
                accepted,
                failure,
            });
        }
        Ok(verdicts)
    }

    /// Run the three-level conjugacy check over the whole set.
    ///
    /// A nonempty violation list means two inputs presented as distinct
    /// are conjugate in the ambient group, which is fatal.
    pub fn check_conjugacy(
        &self,
        set: &GroupSet,
        log: &mut Option<LogEmitter>,
    ) -> Result<ConjugacyStats, HarnessError> {
        let handles = set.handles();
        let cascade = ConjugacyCascade::new(self.oracle, self.config.sub_bucket_threshold);
        let stats = cascade.run(&handles)?;

        if let Some(em) = log.as_mut() {
            for &(a, b) in &stats.violations {
                em.emit_entry(
                    LogEntry::new("", LogLevel::Fatal, "conjugate_pair")
                        .with_phase(Phase::Conjugacy)
                        .with_pair(a.as_usize(), b.as_usize()),
                )?;
            }
            em.emit_entry(
                LogEntry::new("", LogLevel::Info, "conjugacy_done")
                    .with_phase(Phase::Conjugacy)
                    .with_outcome(if stats.is_clean() {
                        Outcome::Pass
                    } else {
                        Outcome::Fail
                    })
                    .with_details(serde_json::json!({
                        "pairs_into_l1": stats.pairs_into_l1(),
                        "pairs_into_l2": stats.pairs_into_l2,
                        "pairs_into_l3": stats.pairs_into_l3,
                        "direct_tests": stats.direct_tests,
                    })),
            )?;
            em.flush()?;
        }

        if !stats.is_clean() {
            return Err(HarnessError::ConjugacyViolations {
                count: stats.violations.len(),
            });
        }
        Ok(stats)
    }
}
