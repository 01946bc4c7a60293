//! Direct-factor decomposition and factor-level comparison.
//!
//! Two decomposable groups are compared factor-against-factor instead of
//! whole-against-whole. The comparison demands a complete matching: every
//! factor of one side must pair with a distinct, order-equal, isomorphic
//! factor of the other before the groups are declared isomorphic. Matching
//! only one pair and waving the rest through is the historical defect this
//! module's shape exists to prevent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::handle::{GroupHandle, GroupIndex};
use crate::oracle::{AlgebraOracle, FactorInfo, GeneratorMap, IsoAnswer, OracleError};

/// Canonically sorted list of indecomposable direct factors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorList {
    factors: Vec<FactorInfo>,
}

impl FactorList {
    /// Sorts by order then label so equal decompositions compare equal.
    #[must_use]
    pub fn new(mut factors: Vec<FactorInfo>) -> Self {
        factors.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.label.cmp(&b.label)));
        Self { factors }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    #[must_use]
    pub fn factors(&self) -> &[FactorInfo] {
        &self.factors
    }

    /// Sorted factor orders.
    #[must_use]
    pub fn orders(&self) -> Vec<u64> {
        self.factors.iter().map(|f| f.order).collect()
    }

    /// Product of factor orders; must equal the parent group's order.
    #[must_use]
    pub fn order_product(&self) -> u64 {
        self.factors.iter().map(|f| f.order).product()
    }
}

/// Outcome of comparing two decompositions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorComparison {
    /// Every factor of the left side matched a distinct isomorphic factor
    /// of the right side. `pairing[i]` is the right-side position matched
    /// to left factor `i`; `witnesses[i]` is the oracle's map for that
    /// pair, still subject to certificate verification.
    Matched {
        pairing: Vec<usize>,
        witnesses: Vec<GeneratorMap>,
    },
    /// Different factor counts; immediately non-isomorphic.
    CountMismatch,
    /// Equal counts but different sorted order sequences; immediately
    /// non-isomorphic.
    OrderMismatch,
    /// Order shapes agree but no complete matching exists, even after
    /// backtracking. At least one factor pair is non-isomorphic.
    NoCompleteMatching,
}

/// Decomposes groups through the oracle and memoizes the result per input
/// index; decomposition is attempted at most once per group.
pub struct FactorDecomposer<'a, O: AlgebraOracle> {
    oracle: &'a O,
    memo: HashMap<GroupIndex, Option<FactorList>>,
}

impl<'a, O: AlgebraOracle> FactorDecomposer<'a, O> {
    #[must_use]
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            memo: HashMap::new(),
        }
    }

    /// `None` means indecomposable.
    pub fn decompose(&mut self, g: &GroupHandle) -> Result<Option<&FactorList>, OracleError> {
        if !self.memo.contains_key(&g.index) {
            let list = self.oracle.direct_factors(g)?.map(FactorList::new);
            self.memo.insert(g.index, list);
        }
        Ok(self.memo[&g.index].as_ref())
    }

    /// Compare two decomposed groups factor-by-factor.
    ///
    /// Greedy assignment in sorted order with backtracking when a greedy
    /// pass strands a factor; any complete matching is as good as any other
    /// because isomorphism is transitive.
    pub fn compare(
        &self,
        g: &GroupHandle,
        gf: &FactorList,
        h: &GroupHandle,
        hf: &FactorList,
    ) -> Result<FactorComparison, OracleError> {
        if gf.len() != hf.len() {
            return Ok(FactorComparison::CountMismatch);
        }
        if gf.orders() != hf.orders() {
            return Ok(FactorComparison::OrderMismatch);
        }

        let left: Vec<GroupHandle> = gf
            .factors()
            .iter()
            .map(|f| g.derived(f.generators.clone()))
            .collect();
        let right: Vec<GroupHandle> = hf
            .factors()
            .iter()
            .map(|f| h.derived(f.generators.clone()))
            .collect();

        let mut tested: HashMap<(usize, usize), Option<GeneratorMap>> = HashMap::new();
        let mut used = vec![false; right.len()];
        let mut pairing = vec![usize::MAX; left.len()];

        if self.match_all(gf, hf, &left, &right, 0, &mut used, &mut pairing, &mut tested)? {
            // match_all only pairs factors whose memoized test produced a
            // witness, so every assigned slot must hold one.
            let mut witnesses = Vec::with_capacity(pairing.len());
            for (i, &j) in pairing.iter().enumerate() {
                match tested.get(&(i, j)) {
                    Some(Some(map)) => witnesses.push(map.clone()),
                    _ => {
                        return Err(OracleError::Unsupported {
                            op: "factor matching",
                            detail: format!("pair ({i}, {j}) was assigned without a witness"),
                        });
                    }
                }
            }
            Ok(FactorComparison::Matched { pairing, witnesses })
        } else {
            Ok(FactorComparison::NoCompleteMatching)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn match_all(
        &self,
        gf: &FactorList,
        hf: &FactorList,
        left: &[GroupHandle],
        right: &[GroupHandle],
        pos: usize,
        used: &mut Vec<bool>,
        pairing: &mut Vec<usize>,
        tested: &mut HashMap<(usize, usize), Option<GeneratorMap>>,
    ) -> Result<bool, OracleError> {
        if pos == left.len() {
            return Ok(true);
        }
        let order = gf.factors()[pos].order;
        for j in 0..right.len() {
            if used[j] || hf.factors()[j].order != order {
                continue;
            }
            if !tested.contains_key(&(pos, j)) {
                let answer = match self.oracle.isomorphism(&left[pos], &right[j])? {
                    IsoAnswer::Isomorphic(map) => Some(map),
                    IsoAnswer::NonIsomorphic => None,
                };
                tested.insert((pos, j), answer);
            }
            if tested[&(pos, j)].is_none() {
                continue;
            }
            used[j] = true;
            pairing[pos] = j;
            if self.match_all(gf, hf, left, right, pos + 1, used, pairing, tested)? {
                return Ok(true);
            }
            used[j] = false;
            pairing[pos] = usize::MAX;
        }
        Ok(false)
    }
}
