//! Concrete permutation groups: element closure and the structural
//! computations the fingerprint fields are built from.
//!
//! Everything here enumerates elements, so it is deliberately naive and
//! bounded; the engine's scale comes from invariant filtering, not from
//! this oracle being fast.

use std::collections::{BTreeSet, HashMap, VecDeque};

use isoclass_core::oracle::OracleError;

use crate::perm::Perm;

/// A fully enumerated permutation group on `1..=degree`.
///
/// Element 0 is always the identity. Element ids are stable for the
/// lifetime of the value; subgroups are passed around as sorted id sets.
#[derive(Debug, Clone)]
pub struct PermGroup {
    degree: u16,
    gens: Vec<Perm>,
    elements: Vec<Perm>,
    index: HashMap<Perm, usize>,
}

impl PermGroup {
    /// Close the generator set under multiplication, failing once the
    /// element count passes `cap`.
    pub fn generate(degree: u16, gens: Vec<Perm>, cap: usize) -> Result<Self, OracleError> {
        let mut elements = vec![Perm::identity(degree)];
        let mut index = HashMap::new();
        index.insert(elements[0].clone(), 0);
        let mut queue: VecDeque<usize> = VecDeque::from([0]);
        while let Some(i) = queue.pop_front() {
            for g in &gens {
                let next = elements[i].compose(g);
                if !index.contains_key(&next) {
                    if elements.len() >= cap {
                        return Err(OracleError::GroupTooLarge { cap });
                    }
                    index.insert(next.clone(), elements.len());
                    queue.push_back(elements.len());
                    elements.push(next);
                }
            }
        }
        Ok(Self {
            degree,
            gens,
            elements,
            index,
        })
    }

    #[must_use]
    pub fn degree(&self) -> u16 {
        self.degree
    }

    #[must_use]
    pub fn order(&self) -> u64 {
        self.elements.len() as u64
    }

    #[must_use]
    pub fn generators(&self) -> &[Perm] {
        &self.gens
    }

    #[must_use]
    pub fn element(&self, id: usize) -> &Perm {
        &self.elements[id]
    }

    #[must_use]
    pub fn elements(&self) -> &[Perm] {
        &self.elements
    }

    #[must_use]
    pub fn contains(&self, p: &Perm) -> bool {
        self.index.contains_key(p)
    }

    #[must_use]
    pub fn id_of(&self, p: &Perm) -> Option<usize> {
        self.index.get(p).copied()
    }

    /// Element ids of the generators.
    #[must_use]
    pub fn generator_ids(&self) -> Vec<usize> {
        self.gens.iter().filter_map(|g| self.id_of(g)).collect()
    }

    /// Product of two elements by id.
    #[must_use]
    pub fn multiply(&self, a: usize, b: usize) -> usize {
        self.index[&self.elements[a].compose(&self.elements[b])]
    }

    // ---- conjugacy ----

    /// Conjugacy classes as sorted element-id sets, identity class first.
    #[must_use]
    pub fn conjugacy_classes(&self) -> Vec<Vec<usize>> {
        let n = self.elements.len();
        let mut assigned = vec![false; n];
        let mut classes = Vec::new();
        for start in 0..n {
            if assigned[start] {
                continue;
            }
            let mut class = vec![start];
            assigned[start] = true;
            let mut queue = VecDeque::from([start]);
            while let Some(e) = queue.pop_front() {
                for g in &self.gens {
                    let c = self.index[&self.elements[e].conjugate_by(g)];
                    if !assigned[c] {
                        assigned[c] = true;
                        class.push(c);
                        queue.push_back(c);
                    }
                }
            }
            class.sort_unstable();
            classes.push(class);
        }
        classes
    }

    /// Element ids of the center.
    #[must_use]
    pub fn center(&self) -> Vec<usize> {
        (0..self.elements.len())
            .filter(|&e| {
                self.gens
                    .iter()
                    .all(|g| self.elements[e].compose(g) == g.compose(&self.elements[e]))
            })
            .collect()
    }

    // ---- subgroup arithmetic on id sets ----

    /// Closure of `seeds` under multiplication, as a sorted id set.
    #[must_use]
    pub fn closure(&self, seeds: &[usize]) -> Vec<usize> {
        let mut members: BTreeSet<usize> = BTreeSet::from([0]);
        let mut queue: VecDeque<usize> = VecDeque::from([0]);
        while let Some(e) = queue.pop_front() {
            for &s in seeds {
                let next = self.multiply(e, s);
                if members.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        members.into_iter().collect()
    }

    /// A small generating sequence for a subgroup given as a sorted id set.
    /// Greedy: repeatedly add the largest-order element not yet generated.
    #[must_use]
    pub fn small_generating_set(&self, sub: &[usize]) -> Vec<usize> {
        let mut by_order: Vec<usize> = sub.to_vec();
        by_order.sort_by_key(|&e| std::cmp::Reverse(self.elements[e].order()));
        let mut gens: Vec<usize> = Vec::new();
        let mut span = vec![0usize];
        for &e in &by_order {
            if span.binary_search(&e).is_err() {
                gens.push(e);
                span = self.closure(&gens);
                if span.len() == sub.len() {
                    break;
                }
            }
        }
        gens
    }

    /// Normal closure of `seeds` inside the subgroup generated by
    /// `ambient_gens`, as a sorted id set.
    #[must_use]
    pub fn normal_closure(&self, seeds: &[usize], ambient_gens: &[usize]) -> Vec<usize> {
        let mut gens: Vec<usize> = seeds.to_vec();
        let mut span = self.closure(&gens);
        loop {
            let mut grew = false;
            let conjugators: Vec<Perm> = ambient_gens
                .iter()
                .map(|&g| self.elements[g].clone())
                .collect();
            for &e in &span.clone() {
                for c in &conjugators {
                    let conj = self.index[&self.elements[e].conjugate_by(c)];
                    if span.binary_search(&conj).is_err() {
                        gens.push(conj);
                        span = self.closure(&gens);
                        grew = true;
                    }
                }
            }
            if !grew {
                return span;
            }
        }
    }

    /// Derived subgroup of the subgroup `sub`, as a sorted id set.
    #[must_use]
    pub fn derived_subgroup(&self, sub: &[usize]) -> Vec<usize> {
        let sub_gens = if sub.len() == self.elements.len() {
            self.generator_ids()
        } else {
            self.small_generating_set(sub)
        };
        let mut seeds = Vec::new();
        for &a in &sub_gens {
            for &b in &sub_gens {
                let c = self.index[&self.elements[a].commutator(&self.elements[b])];
                if c != 0 {
                    seeds.push(c);
                }
            }
        }
        if seeds.is_empty() {
            return vec![0];
        }
        self.normal_closure(&seeds, &sub_gens)
    }

    /// Sizes along the derived series, starting at `|G|`, stopping when
    /// the series stabilizes. Ends at 1 exactly for solvable groups.
    #[must_use]
    pub fn derived_series_sizes(&self) -> Vec<u64> {
        let mut sizes = vec![self.order()];
        let mut current: Vec<usize> = (0..self.elements.len()).collect();
        loop {
            let next = self.derived_subgroup(&current);
            if next.len() == current.len() {
                return sizes;
            }
            sizes.push(next.len() as u64);
            if next.len() == 1 {
                return sizes;
            }
            current = next;
        }
    }

    /// `[span(outer), span(inner)]` as a sorted id set: the normal closure
    /// of pairwise commutators of the two generating sets.
    #[must_use]
    pub fn commutator_subgroup(&self, outer_gens: &[usize], inner_gens: &[usize]) -> Vec<usize> {
        let mut seeds = Vec::new();
        for &a in outer_gens {
            for &b in inner_gens {
                let c = self.index[&self.elements[a].commutator(&self.elements[b])];
                if c != 0 {
                    seeds.push(c);
                }
            }
        }
        if seeds.is_empty() {
            return vec![0];
        }
        self.normal_closure(&seeds, &self.generator_ids())
    }

    /// Nilpotency class via the lower central series; `None` when the
    /// series stabilizes above the identity.
    #[must_use]
    pub fn nilpotency_class(&self) -> Option<u32> {
        let whole_gens = self.generator_ids();
        let mut layer_gens = whole_gens.clone();
        let mut layer_size = self.order();
        let mut class = 0u32;
        loop {
            if layer_size == 1 {
                return Some(class);
            }
            let next = self.commutator_subgroup(&whole_gens, &layer_gens);
            if next.len() as u64 == layer_size {
                return None;
            }
            layer_gens = self.small_generating_set(&next);
            layer_size = next.len() as u64;
            class += 1;
        }
    }

    // ---- abelianization ----

    /// Abelian invariants of `G / [G, G]` in sorted prime-power form.
    #[must_use]
    pub fn abelian_invariants(&self) -> Vec<u64> {
        let derived = self.derived_subgroup(&(0..self.elements.len()).collect::<Vec<_>>());
        let quotient_order = self.order() / derived.len() as u64;
        if quotient_order == 1 {
            return Vec::new();
        }
        // order of each coset in the quotient: least m with x^m in [G,G]
        let in_derived = |e: usize| derived.binary_search(&e).is_ok();
        let coset_orders: Vec<u64> = self
            .coset_representatives(&derived)
            .into_iter()
            .map(|rep| {
                let mut power = rep;
                let mut m = 1u64;
                while !in_derived(power) {
                    power = self.multiply(power, rep);
                    m += 1;
                }
                m
            })
            .collect();
        let mut invariants = Vec::new();
        for p in prime_factors(quotient_order) {
            // n_k = #cosets of order dividing p^k; the exponents of the
            // cyclic p-power factors fall out of the successive ratios
            let mut pk = 1u64;
            let mut counts = vec![1u64];
            loop {
                pk *= p;
                let nk = coset_orders.iter().filter(|&&o| pk % o == 0).count() as u64;
                if nk == *counts.last().unwrap_or(&1) {
                    break;
                }
                counts.push(nk);
            }
            // d_k = #factors with exponent >= k
            let mut d = Vec::new();
            for k in 1..counts.len() {
                let ratio = counts[k] / counts[k - 1];
                d.push(ratio.ilog(p));
            }
            for k in 0..d.len() {
                let ge_k = d[k];
                let ge_next = if k + 1 < d.len() { d[k + 1] } else { 0 };
                for _ in 0..(ge_k - ge_next) {
                    invariants.push(p.pow(k as u32 + 1));
                }
            }
        }
        invariants.sort_unstable();
        invariants
    }

    /// One representative id per coset of `sub` (a sorted id set).
    #[must_use]
    pub fn coset_representatives(&self, sub: &[usize]) -> Vec<usize> {
        let mut covered = vec![false; self.elements.len()];
        let mut reps = Vec::new();
        for e in 0..self.elements.len() {
            if covered[e] {
                continue;
            }
            reps.push(e);
            for &s in sub {
                covered[self.multiply(e, s)] = true;
            }
        }
        reps
    }

    // ---- action on points ----

    /// Orbits of the action on `0..degree`, each sorted.
    #[must_use]
    pub fn orbits(&self) -> Vec<Vec<u16>> {
        let mut seen = vec![false; self.degree as usize];
        let mut orbits = Vec::new();
        for start in 0..self.degree {
            if seen[start as usize] {
                continue;
            }
            let mut orbit = vec![start];
            seen[start as usize] = true;
            let mut queue = VecDeque::from([start]);
            while let Some(p) = queue.pop_front() {
                for g in &self.gens {
                    let q = g.image(p);
                    if !seen[q as usize] {
                        seen[q as usize] = true;
                        orbit.push(q);
                        queue.push_back(q);
                    }
                }
            }
            orbit.sort_unstable();
            orbits.push(orbit);
        }
        orbits
    }

    /// Order of the transitive group induced on one orbit.
    pub fn induced_orbit_order(&self, orbit: &[u16], cap: usize) -> Result<u64, OracleError> {
        let position: HashMap<u16, u16> = orbit
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, i as u16))
            .collect();
        let restricted: Vec<Perm> = self
            .gens
            .iter()
            .map(|g| {
                let images: Vec<u16> = orbit
                    .iter()
                    .map(|&p| position[&g.image(p)] + 1)
                    .collect();
                Perm::from_one_based(&images, orbit.len() as u16, 0)
            })
            .collect::<Result<_, _>>()?;
        Ok(PermGroup::generate(orbit.len() as u16, restricted, cap)?.order())
    }
}

fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut primes = Vec::new();
    let mut p = 2;
    while p * p <= n {
        if n % p == 0 {
            primes.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += 1;
    }
    if n > 1 {
        primes.push(n);
    }
    primes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(degree: u16, words: &[&str]) -> PermGroup {
        let gens = words
            .iter()
            .map(|w| Perm::from_cycles(w, degree, 0).unwrap())
            .collect();
        PermGroup::generate(degree, gens, 100_000).unwrap()
    }

    fn s3() -> PermGroup {
        group(3, &["(1,2)", "(1,2,3)"])
    }

    fn q8() -> PermGroup {
        // right-regular representation of the quaternion group with
        // 1,-1,i,-i,j,-j,k,-k numbered 1..8
        group(8, &["(1,3,2,4)(5,8,6,7)", "(1,5,2,6)(3,7,4,8)"])
    }

    #[test]
    fn closure_of_s3_has_six_elements() {
        assert_eq!(s3().order(), 6);
    }

    #[test]
    fn closure_respects_the_element_cap() {
        let gens = vec![Perm::from_cycles("(1,2,3,4,5)", 5, 0).unwrap()];
        assert!(matches!(
            PermGroup::generate(5, gens, 3),
            Err(OracleError::GroupTooLarge { cap: 3 })
        ));
    }

    #[test]
    fn s3_has_three_conjugacy_classes() {
        let classes = s3().conjugacy_classes();
        let mut sizes: Vec<usize> = classes.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 2, 3]);
    }

    #[test]
    fn s3_derived_series_is_6_3_1() {
        assert_eq!(s3().derived_series_sizes(), vec![6, 3, 1]);
    }

    #[test]
    fn a5_is_its_own_derived_subgroup() {
        let a5 = group(5, &["(1,2,3)", "(3,4,5)"]);
        assert_eq!(a5.order(), 60);
        assert_eq!(a5.derived_series_sizes(), vec![60]);
    }

    #[test]
    fn q8_center_has_order_two() {
        assert_eq!(q8().center().len(), 2);
    }

    #[test]
    fn abelian_invariants_of_s3_are_c2() {
        assert_eq!(s3().abelian_invariants(), vec![2]);
    }

    #[test]
    fn abelian_invariants_distinguish_c4_from_klein_four() {
        let c4 = group(4, &["(1,2,3,4)"]);
        let v4 = group(4, &["(1,2)(3,4)", "(1,3)(2,4)"]);
        assert_eq!(c4.abelian_invariants(), vec![4]);
        assert_eq!(v4.abelian_invariants(), vec![2, 2]);
    }

    #[test]
    fn abelian_invariants_of_c12_are_prime_power_form() {
        let c12 = group(12, &["(1,2,3,4,5,6,7,8,9,10,11,12)"]);
        assert_eq!(c12.abelian_invariants(), vec![3, 4]);
    }

    #[test]
    fn nilpotency_class_of_q8_is_two() {
        assert_eq!(q8().nilpotency_class(), Some(2));
        assert_eq!(s3().nilpotency_class(), None);
    }

    #[test]
    fn orbits_of_an_intransitive_group() {
        let g = group(5, &["(1,2)", "(3,4,5)"]);
        let orbits = g.orbits();
        let lens: Vec<usize> = orbits.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![2, 3]);
        assert_eq!(g.induced_orbit_order(&orbits[1], 1000).unwrap(), 3);
    }

    #[test]
    fn coset_representatives_cover_the_group() {
        let g = s3();
        let derived = g.derived_subgroup(&(0..6).collect::<Vec<_>>());
        assert_eq!(derived.len(), 3);
        assert_eq!(g.coset_representatives(&derived).len(), 2);
    }
}
