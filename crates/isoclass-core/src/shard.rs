//! Static round-robin work sharding.
//!
//! Scale-out is by independent worker processes over a fixed index range;
//! the assignment is index-based, never data-dependent, so any worker can
//! recompute its share without coordination.

/// Indices owned by `worker_id` out of `num_workers`, over `0..total`.
///
/// Worker ids are 1-based: worker 1 takes indices 0, `num_workers`,
/// `2 * num_workers`, and so on.
///
/// # Panics
///
/// Panics if `worker_id` is 0 or exceeds `num_workers`; the harness
/// validates CLI arguments before calling in.
#[must_use]
pub fn indices_for_worker(worker_id: usize, num_workers: usize, total: usize) -> Vec<usize> {
    assert!(
        worker_id >= 1 && worker_id <= num_workers,
        "worker id {worker_id} out of range 1..={num_workers}"
    );
    ((worker_id - 1)..total).step_by(num_workers).collect()
}

/// True when the workers' shares cover `0..total` exactly once.
#[must_use]
pub fn shards_cover_exactly(num_workers: usize, total: usize) -> bool {
    let mut seen = vec![0usize; total];
    for w in 1..=num_workers {
        for i in indices_for_worker(w, num_workers, total) {
            seen[i] += 1;
        }
    }
    seen.iter().all(|&c| c == 1)
}
