//! Engine configuration.
//!
//! The cascade ordering is data, not control flow: it was tuned against the
//! observed input distribution and callers with a different distribution can
//! supply their own.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::fingerprint::InvariantField;

/// Ordered invariant walk for the non-isomorphism cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Cheapest-discriminating-first. The last entry should be
    /// `DirectIsomorphismTest`; without it the cascade can return
    /// `Unresolved`, which is fatal downstream.
    pub order: Vec<InvariantField>,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            order: vec![
                InvariantField::DerivedSize,
                InvariantField::ClassCount,
                InvariantField::DerivedLength,
                InvariantField::AbelianInvariants,
                InvariantField::Exponent,
                InvariantField::ElementOrderHistogram,
                InvariantField::CenterSize,
                InvariantField::FrattiniSize,
                InvariantField::NilpotencyClass,
                InvariantField::NormalSubgroupCount,
                InvariantField::DerivedSeriesSizes,
                InvariantField::ClassSizes,
                InvariantField::AutGroupOrder,
                InvariantField::SubgroupProfile,
                InvariantField::DirectIsomorphismTest,
            ],
        }
    }
}

impl CascadeConfig {
    /// The record-backed prefix, excluding the direct-test rung.
    #[must_use]
    pub fn record_fields(&self) -> Vec<InvariantField> {
        self.order
            .iter()
            .copied()
            .filter(|f| *f != InvariantField::DirectIsomorphismTest)
            .collect()
    }

    #[must_use]
    pub fn ends_with_direct_test(&self) -> bool {
        self.order.last() == Some(&InvariantField::DirectIsomorphismTest)
    }
}

/// Orders for which canonical identifiers are authoritative.
///
/// The excluded orders are the ones whose catalog indexing is incomplete
/// upstream; groups of those orders fall through to the cascade even though
/// they sit below the limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRange {
    pub limit: u64,
    pub excluded: BTreeSet<u64>,
}

impl Default for CatalogRange {
    fn default() -> Self {
        Self {
            limit: 2000,
            excluded: BTreeSet::from([512, 768, 1024, 1536]),
        }
    }
}

impl CatalogRange {
    #[must_use]
    pub fn covers(&self, order: u64) -> bool {
        order < self.limit && !self.excluded.contains(&order)
    }
}

/// Everything the classifier and conjugacy cascade need up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cascade: CascadeConfig,
    pub catalog: CatalogRange,
    /// Orbit-type buckets larger than this are sub-bucketed by histogram
    /// key before pairwise conjugacy testing.
    #[serde(default = "default_sub_bucket_threshold")]
    pub sub_bucket_threshold: usize,
}

fn default_sub_bucket_threshold() -> usize {
    15
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cascade: CascadeConfig::default(),
            catalog: CatalogRange::default(),
            sub_bucket_threshold: default_sub_bucket_threshold(),
        }
    }
}
