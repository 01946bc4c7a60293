//! Combining sharded worker outputs.
//!
//! Workers process round-robin shards independently; the merge step stitches
//! their results back together and cross-checks the partition. Any overlap
//! between shards, or any input left uncovered, is an input-integrity error
//! rather than something to paper over.

use serde::{Deserialize, Serialize};

use isoclass_core::{ProofRecord, TypeAudit};

use crate::input::SCHEMA_VERSION;
use crate::runner::{HarnessError, WorkerResult};

/// One input's placement after the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Global input index.
    pub index: usize,
    /// Worker that processed it.
    pub worker: usize,
    /// Type label local to that worker.
    pub label: usize,
}

/// The stitched-together run, ready for reporting or proof staging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedResult {
    pub version: u32,
    pub total_groups: usize,
    pub num_workers: usize,
    /// Placement per global index, sorted by index.
    pub assignments: Vec<Assignment>,
    /// `(worker, local type count)` per worker, sorted by worker id.
    pub worker_type_counts: Vec<(usize, usize)>,
    /// All audits across workers, representatives in global indices.
    pub audits: Vec<TypeAudit>,
    /// All generated proofs across workers, in worker order.
    pub generated_proofs: Vec<ProofRecord>,
}

impl MergedResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Sum of per-worker type counts. An upper bound on the global count,
    /// since types split across shards are counted once per shard.
    #[must_use]
    pub fn type_count_upper_bound(&self) -> usize {
        self.worker_type_counts.iter().map(|(_, c)| c).sum()
    }
}

/// Merge worker results, checking that the shards form an exact partition
/// of the input set.
pub fn merge_results(results: &[WorkerResult]) -> Result<MergedResult, HarnessError> {
    let first = results
        .first()
        .ok_or_else(|| HarnessError::Integrity("no worker results to merge".into()))?;
    let total = first.total_groups;
    let num_workers = first.num_workers;

    if results.len() != num_workers {
        return Err(HarnessError::Integrity(format!(
            "expected {num_workers} worker results, got {}",
            results.len()
        )));
    }

    let mut seen_workers = vec![false; num_workers + 1];
    let mut owner: Vec<Option<(usize, usize)>> = vec![None; total];
    for result in results {
        if result.version != SCHEMA_VERSION {
            return Err(HarnessError::Integrity(format!(
                "worker {} result has schema version {}",
                result.worker, result.version
            )));
        }
        if result.total_groups != total || result.num_workers != num_workers {
            return Err(HarnessError::Integrity(format!(
                "worker {} disagrees on run shape ({} groups / {} workers)",
                result.worker, result.total_groups, result.num_workers
            )));
        }
        if result.worker == 0 || result.worker > num_workers {
            return Err(HarnessError::Integrity(format!(
                "worker id {} out of range",
                result.worker
            )));
        }
        if std::mem::replace(&mut seen_workers[result.worker], true) {
            return Err(HarnessError::Integrity(format!(
                "worker {} appears twice",
                result.worker
            )));
        }
        if result.indices.len() != result.type_labels.len() {
            return Err(HarnessError::Integrity(format!(
                "worker {} has {} indices but {} labels",
                result.worker,
                result.indices.len(),
                result.type_labels.len()
            )));
        }
        for (&index, &label) in result.indices.iter().zip(&result.type_labels) {
            if index >= total {
                return Err(HarnessError::Integrity(format!(
                    "worker {} claims index {index} beyond {total} inputs",
                    result.worker
                )));
            }
            if let Some((other, _)) = owner[index] {
                return Err(HarnessError::Integrity(format!(
                    "index {index} claimed by both worker {other} and worker {}",
                    result.worker
                )));
            }
            owner[index] = Some((result.worker, label));
        }
    }

    let uncovered: Vec<usize> = owner
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.is_none().then_some(i))
        .collect();
    if !uncovered.is_empty() {
        return Err(HarnessError::Integrity(format!(
            "{} input(s) not covered by any shard, first: {}",
            uncovered.len(),
            uncovered[0]
        )));
    }

    let assignments = owner
        .iter()
        .copied()
        .enumerate()
        .filter_map(|(index, o)| o.map(|(worker, label)| Assignment { index, worker, label }))
        .collect();

    let mut sorted: Vec<&WorkerResult> = results.iter().collect();
    sorted.sort_by_key(|r| r.worker);
    let worker_type_counts = sorted.iter().map(|r| (r.worker, r.type_count)).collect();
    let audits = sorted.iter().flat_map(|r| r.audits.clone()).collect();
    let generated_proofs = sorted
        .iter()
        .flat_map(|r| r.generated_proofs.clone())
        .collect();

    Ok(MergedResult {
        version: SCHEMA_VERSION,
        total_groups: total,
        num_workers,
        assignments,
        worker_type_counts,
        audits,
        generated_proofs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoclass_core::RunStats;

    fn worker(id: usize, num_workers: usize, total: usize, indices: Vec<usize>) -> WorkerResult {
        let labels = (1..=indices.len()).collect();
        WorkerResult {
            version: SCHEMA_VERSION,
            worker: id,
            num_workers,
            total_groups: total,
            indices,
            type_labels: labels,
            type_count: 1,
            stats: RunStats::default(),
            audits: Vec::new(),
            generated_proofs: Vec::new(),
            expected_match: None,
        }
    }

    #[test]
    fn exact_partition_merges() {
        let merged = merge_results(&[
            worker(1, 2, 5, vec![0, 2, 4]),
            worker(2, 2, 5, vec![1, 3]),
        ])
        .unwrap();
        assert_eq!(merged.assignments.len(), 5);
        assert_eq!(merged.assignments[1].worker, 2);
        assert_eq!(merged.type_count_upper_bound(), 2);
    }

    #[test]
    fn overlapping_shards_are_rejected() {
        let err = merge_results(&[
            worker(1, 2, 4, vec![0, 2]),
            worker(2, 2, 4, vec![1, 2]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn uncovered_input_is_rejected() {
        let err = merge_results(&[
            worker(1, 2, 4, vec![0, 2]),
            worker(2, 2, 4, vec![1]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("not covered"));
    }

    #[test]
    fn duplicate_worker_id_is_rejected() {
        let err = merge_results(&[
            worker(1, 2, 4, vec![0, 2]),
            worker(1, 2, 4, vec![1, 3]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("twice"));
    }
}
