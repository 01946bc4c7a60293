//! Signature-key buckets.

use std::collections::BTreeMap;

use crate::handle::GroupIndex;
use crate::signature::SignatureKey;

/// Partition of the input set by signature key.
///
/// Built once per run and read-only afterwards. Singleton buckets need no
/// pairwise work: their single member is immediately a type representative.
#[derive(Debug, Clone, Default)]
pub struct BucketIndex {
    buckets: BTreeMap<SignatureKey, Vec<GroupIndex>>,
    total: usize,
}

impl BucketIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the partition from `(index, key)` pairs.
    #[must_use]
    pub fn build(entries: impl IntoIterator<Item = (GroupIndex, SignatureKey)>) -> Self {
        let mut index = Self::new();
        for (i, key) in entries {
            index.insert(i, key);
        }
        index
    }

    pub fn insert(&mut self, i: GroupIndex, key: SignatureKey) {
        self.buckets.entry(key).or_default().push(i);
        self.total += 1;
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of groups across all buckets; the partition is exact, so this
    /// equals the input count.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn singleton_count(&self) -> usize {
        self.buckets.values().filter(|m| m.len() == 1).count()
    }

    /// Buckets needing pairwise work, largest first.
    #[must_use]
    pub fn multi_buckets(&self) -> Vec<(&SignatureKey, &[GroupIndex])> {
        let mut multi: Vec<_> = self
            .buckets
            .iter()
            .filter(|(_, m)| m.len() > 1)
            .map(|(k, m)| (k, m.as_slice()))
            .collect();
        multi.sort_by_key(|(_, m)| std::cmp::Reverse(m.len()));
        multi
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SignatureKey, &[GroupIndex])> {
        self.buckets.iter().map(|(k, m)| (k, m.as_slice()))
    }

    #[must_use]
    pub fn members(&self, key: &SignatureKey) -> Option<&[GroupIndex]> {
        self.buckets.get(key).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Solvability;

    fn key(order: u64, classes: u64) -> SignatureKey {
        SignatureKey {
            order,
            derived_size: 1,
            class_count: classes,
            solvability: Solvability::Solvable { derived_length: 1 },
            abelian_invariants: vec![order],
        }
    }

    #[test]
    fn partition_is_exact() {
        let idx = BucketIndex::build([
            (GroupIndex(0), key(6, 6)),
            (GroupIndex(1), key(6, 6)),
            (GroupIndex(2), key(10, 10)),
        ]);
        assert_eq!(idx.member_count(), 3);
        assert_eq!(idx.bucket_count(), 2);
        assert_eq!(idx.singleton_count(), 1);
    }

    #[test]
    fn multi_buckets_come_largest_first() {
        let big = key(4, 4);
        let small = key(9, 9);
        let idx = BucketIndex::build([
            (GroupIndex(0), small.clone()),
            (GroupIndex(1), small.clone()),
            (GroupIndex(2), big.clone()),
            (GroupIndex(3), big.clone()),
            (GroupIndex(4), big.clone()),
        ]);
        let multi = idx.multi_buckets();
        assert_eq!(multi.len(), 2);
        assert_eq!(multi[0].1.len(), 3);
        assert_eq!(multi[1].1.len(), 2);
    }

    #[test]
    fn members_preserves_insertion_order() {
        let k = key(8, 5);
        let idx = BucketIndex::build([(GroupIndex(7), k.clone()), (GroupIndex(2), k.clone())]);
        assert_eq!(idx.members(&k), Some(&[GroupIndex(7), GroupIndex(2)][..]));
    }
}
