//! Auditable disjoint-set forest.
//!
//! The forest is an explicit owned structure, never a hidden global. Every
//! `union` requires a [`MergeEvidence`] value, so there is no code path that
//! merges two components without a recorded reason.

use serde::{Deserialize, Serialize};

use crate::handle::GroupIndex;
use crate::oracle::CanonicalId;

/// Why two components were merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeEvidence {
    /// Both groups resolved to the same catalog identifier.
    SharedCanonicalId { id: CanonicalId },
    /// A certificate passed all seven verifier checks. `proof_index` points
    /// into the run's proof list (supplied or cascade-generated).
    VerifiedCertificate { proof_index: usize },
}

/// Union-find with path compression, re-parenting toward the smaller index
/// so the final root assignment is deterministic.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    log: Vec<(GroupIndex, GroupIndex, MergeEvidence)>,
}

impl DisjointSet {
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            log: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of `i`'s component, compressing the walked path.
    pub fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the components of `a` and `b`, recording why. Returns false if
    /// they were already merged (the evidence is then not logged; the first
    /// reason stands).
    pub fn union(&mut self, a: usize, b: usize, evidence: MergeEvidence) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (keep, absorb) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[absorb] = keep;
        self.log.push((GroupIndex(a), GroupIndex(b), evidence));
        true
    }

    /// Current component roots, ascending.
    #[must_use]
    pub fn roots(&mut self) -> Vec<usize> {
        let mut roots: Vec<usize> = (0..self.len()).map(|i| self.find(i)).collect();
        roots.sort_unstable();
        roots.dedup();
        roots
    }

    #[must_use]
    pub fn component_count(&mut self) -> usize {
        self.roots().len()
    }

    /// Per-index type labels in `1..=K`, assigned to roots in ascending
    /// order. Deterministic because unions re-parent toward smaller
    /// indices.
    #[must_use]
    pub fn type_labels(&mut self) -> Vec<usize> {
        let roots = self.roots();
        (0..self.len())
            .map(|i| {
                let r = self.find(i);
                // roots is sorted and contains every root
                roots.binary_search(&r).map(|p| p + 1).unwrap_or(0)
            })
            .collect()
    }

    /// Every merge performed, in order, with its evidence.
    #[must_use]
    pub fn merge_log(&self) -> &[(GroupIndex, GroupIndex, MergeEvidence)] {
        &self.log
    }
}
