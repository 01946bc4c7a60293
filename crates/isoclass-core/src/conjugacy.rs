//! The conjugacy cascade.
//!
//! Decides, over a list of permutation groups on a shared point set,
//! whether any two are conjugate inside the ambient symmetric group. Levels
//! only shrink the number of expensive direct tests; they never change the
//! answer. Any positive direct test is a completeness violation for the
//! enumeration that produced the list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::handle::{GroupHandle, GroupIndex};
use crate::oracle::{AlgebraOracle, OracleError};

/// L1 key: sorted multiset of `(orbit length, transitive action id)` pairs.
/// Groups with different keys cannot be conjugate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrbitTypeKey(Vec<(u16, u32)>);

impl OrbitTypeKey {
    #[must_use]
    pub fn new(mut pairs: Vec<(u16, u32)>) -> Self {
        pairs.sort_unstable();
        Self(pairs)
    }

    #[must_use]
    pub fn pairs(&self) -> &[(u16, u32)] {
        &self.0
    }
}

/// L2 key: sorted multiset of `(element order, fixed points)` pairs with
/// class-size weights. Derived from conjugacy classes, never by enumerating
/// elements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HistogramKey(Vec<((u64, u16), u64)>);

impl HistogramKey {
    #[must_use]
    pub fn from_classes(classes: &[crate::oracle::ClassInfo]) -> Self {
        let mut weights: BTreeMap<(u64, u16), u64> = BTreeMap::new();
        for c in classes {
            *weights.entry((c.element_order, c.fixed_points)).or_insert(0) += c.size;
        }
        Self(weights.into_iter().collect())
    }
}

/// Counters for the cascade's funnel, plus any violations found.
///
/// Monotonicity holds by construction: `pairs_into_l3` counts pairs that
/// survived both key filters, so it never exceeds `pairs_into_l2`, which
/// never exceeds `pairs_into_l1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugacyStats {
    pub groups: usize,
    pub orbit_buckets: usize,
    /// Unordered pairs sharing an orbit-type key.
    pub pairs_into_l2: u64,
    /// Of those, pairs also sharing a histogram key; each costs one direct
    /// test.
    pub pairs_into_l3: u64,
    pub direct_tests: u64,
    /// Pairs the direct test confirmed conjugate. Must be empty for the
    /// completeness claim to stand.
    pub violations: Vec<(GroupIndex, GroupIndex)>,
}

impl ConjugacyStats {
    /// All candidate pairs enter L1; the funnel starts at n choose 2.
    #[must_use]
    pub fn pairs_into_l1(&self) -> u64 {
        let n = self.groups as u64;
        n * n.saturating_sub(1) / 2
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Three-level conjugacy check over a shared ambient point set.
pub struct ConjugacyCascade<'a, O: AlgebraOracle> {
    oracle: &'a O,
    /// Orbit buckets at most this large skip the sub-bucketing pass and go
    /// straight to pairwise histogram comparison.
    sub_bucket_threshold: usize,
}

impl<'a, O: AlgebraOracle> ConjugacyCascade<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a O, sub_bucket_threshold: usize) -> Self {
        Self {
            oracle,
            sub_bucket_threshold,
        }
    }

    /// Run the cascade over `groups`. Returns the funnel counters and any
    /// conjugate pairs found; the caller decides that a nonempty violation
    /// list is fatal.
    pub fn run(&self, groups: &[GroupHandle]) -> Result<ConjugacyStats, OracleError> {
        let mut stats = ConjugacyStats {
            groups: groups.len(),
            ..ConjugacyStats::default()
        };

        // L1: bucket by orbit-type key.
        let mut l1: BTreeMap<OrbitTypeKey, Vec<usize>> = BTreeMap::new();
        for (i, g) in groups.iter().enumerate() {
            let key = OrbitTypeKey::new(self.oracle.orbit_types(g)?);
            l1.entry(key).or_default().push(i);
        }
        stats.orbit_buckets = l1.len();

        for members in l1.values() {
            if members.len() < 2 {
                continue;
            }
            let n = members.len() as u64;
            stats.pairs_into_l2 += n * (n - 1) / 2;

            // L2: histogram keys for every member of the bucket. Large
            // buckets are sub-bucketed by key; small ones are compared
            // pairwise, which tests exactly the same pairs.
            let mut keys = Vec::with_capacity(members.len());
            for &i in members {
                let classes = self.oracle.conjugacy_classes(&groups[i])?;
                keys.push(HistogramKey::from_classes(&classes));
            }

            if members.len() > self.sub_bucket_threshold {
                let mut sub: BTreeMap<&HistogramKey, Vec<usize>> = BTreeMap::new();
                for (pos, &i) in members.iter().enumerate() {
                    sub.entry(&keys[pos]).or_default().push(i);
                }
                for sub_members in sub.values() {
                    self.run_l3(groups, sub_members, &mut stats)?;
                }
            } else {
                for (pa, &a) in members.iter().enumerate() {
                    for (pb, &b) in members.iter().enumerate().skip(pa + 1) {
                        if keys[pa] == keys[pb] {
                            self.run_l3(groups, &[a, b], &mut stats)?;
                        }
                    }
                }
            }
        }
        Ok(stats)
    }

    /// L3: direct tests over all pairs in one residual bucket.
    fn run_l3(
        &self,
        groups: &[GroupHandle],
        members: &[usize],
        stats: &mut ConjugacyStats,
    ) -> Result<(), OracleError> {
        for (pa, &a) in members.iter().enumerate() {
            for &b in members.iter().skip(pa + 1) {
                stats.pairs_into_l3 += 1;
                stats.direct_tests += 1;
                if self.oracle.conjugate_in_ambient(&groups[a], &groups[b])? {
                    stats.violations.push((GroupIndex(a), GroupIndex(b)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ClassInfo;

    #[test]
    fn orbit_key_is_order_insensitive() {
        let a = OrbitTypeKey::new(vec![(3, 1), (1, 0), (4, 2)]);
        let b = OrbitTypeKey::new(vec![(4, 2), (3, 1), (1, 0)]);
        assert_eq!(a, b);
        assert_eq!(a.pairs(), &[(1, 0), (3, 1), (4, 2)]);
    }

    #[test]
    fn histogram_key_weights_by_class_size() {
        // two classes of order-2 elements with the same fixed-point count
        // fold into one weighted entry
        let classes = [
            ClassInfo { element_order: 1, fixed_points: 7, size: 1 },
            ClassInfo { element_order: 2, fixed_points: 3, size: 3 },
            ClassInfo { element_order: 2, fixed_points: 3, size: 1 },
        ];
        let key = HistogramKey::from_classes(&classes);
        assert_eq!(key.0, vec![((1, 7), 1), ((2, 3), 4)]);
    }

    #[test]
    fn histogram_distinguishes_fixed_point_profiles() {
        let a = HistogramKey::from_classes(&[ClassInfo {
            element_order: 2,
            fixed_points: 3,
            size: 1,
        }]);
        let b = HistogramKey::from_classes(&[ClassInfo {
            element_order: 2,
            fixed_points: 1,
            size: 1,
        }]);
        assert_ne!(a, b);
    }

    #[test]
    fn funnel_counters_start_at_n_choose_2() {
        let stats = ConjugacyStats {
            groups: 5,
            ..ConjugacyStats::default()
        };
        assert_eq!(stats.pairs_into_l1(), 10);
        assert!(stats.is_clean());
    }
}
