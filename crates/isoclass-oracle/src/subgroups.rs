//! Subgroup enumeration and direct-factor search.
//!
//! Enumeration is by closure of generator sets seeded from cyclic
//! subgroups, so it is exponential in the worst case; the oracle gates it
//! behind an order cap and reports anything larger as unsupported.

use std::collections::BTreeSet;

use isoclass_core::oracle::OracleError;

use crate::group::PermGroup;

/// Largest group order the lattice walk will attempt.
pub const LATTICE_ORDER_CAP: u64 = 200;

/// Every subgroup of `g`, as sorted element-id sets, smallest first. The
/// trivial subgroup and `g` itself are included.
pub fn all_subgroups(g: &PermGroup) -> Result<Vec<Vec<usize>>, OracleError> {
    if g.order() > LATTICE_ORDER_CAP {
        return Err(OracleError::Unsupported {
            op: "subgroup enumeration",
            detail: format!("order {} exceeds lattice cap {LATTICE_ORDER_CAP}", g.order()),
        });
    }
    let n = g.order() as usize;
    let mut known: BTreeSet<Vec<usize>> = BTreeSet::new();
    known.insert(vec![0]);
    // seed with cyclic subgroups
    let mut worklist: Vec<Vec<usize>> = Vec::new();
    for e in 1..n {
        let cyclic = g.closure(&[e]);
        if known.insert(cyclic.clone()) {
            worklist.push(cyclic);
        }
    }
    // grow each known subgroup by one outside element until nothing new
    while let Some(sub) = worklist.pop() {
        if sub.len() == n {
            continue;
        }
        let gens = g.small_generating_set(&sub);
        for e in 1..n {
            if sub.binary_search(&e).is_ok() {
                continue;
            }
            let mut extended = gens.clone();
            extended.push(e);
            let bigger = g.closure(&extended);
            if known.insert(bigger.clone()) {
                worklist.push(bigger);
            }
        }
    }
    let mut subgroups: Vec<Vec<usize>> = known.into_iter().collect();
    subgroups.sort_by_key(|s| (s.len(), s.clone()));
    Ok(subgroups)
}

/// Is `sub` (sorted) closed under conjugation by the generators of `g`?
#[must_use]
pub fn is_normal(g: &PermGroup, sub: &[usize]) -> bool {
    let gen_ids = g.generator_ids();
    sub.iter().all(|&e| {
        gen_ids.iter().all(|&c| {
            let conj = g
                .id_of(&g.element(e).conjugate_by(g.element(c)))
                .unwrap_or(usize::MAX);
            sub.binary_search(&conj).is_ok()
        })
    })
}

/// Frattini subgroup: intersection of the maximal proper subgroups.
pub fn frattini_subgroup(g: &PermGroup) -> Result<Vec<usize>, OracleError> {
    let subgroups = all_subgroups(g)?;
    let n = g.order() as usize;
    let proper: Vec<&Vec<usize>> = subgroups.iter().filter(|s| s.len() < n).collect();
    let maximal: Vec<&Vec<usize>> = proper
        .iter()
        .filter(|s| {
            !proper
                .iter()
                .any(|t| t.len() > s.len() && s.iter().all(|e| t.binary_search(e).is_ok()))
        })
        .copied()
        .collect();
    if maximal.is_empty() {
        // only the trivial group has no proper subgroup
        return Ok(vec![0]);
    }
    let mut intersection: Vec<usize> = maximal[0].clone();
    for m in &maximal[1..] {
        intersection.retain(|e| m.binary_search(e).is_ok());
    }
    Ok(intersection)
}

/// Count of normal subgroups, the trivial one and the whole group
/// included.
pub fn normal_subgroup_count(g: &PermGroup) -> Result<u64, OracleError> {
    Ok(all_subgroups(g)?
        .iter()
        .filter(|s| is_normal(g, s))
        .count() as u64)
}

/// Sorted multiset of subgroup orders.
pub fn subgroup_order_profile(g: &PermGroup) -> Result<Vec<u64>, OracleError> {
    let mut profile: Vec<u64> = all_subgroups(g)?.iter().map(|s| s.len() as u64).collect();
    profile.sort_unstable();
    Ok(profile)
}

/// Split `sub` as an internal direct product of two proper subgroups, if
/// possible. Both parts are normal in `sub` with trivial intersection and
/// complementary orders, which forces elementwise commuting.
#[must_use]
pub fn split_once(
    g: &PermGroup,
    sub: &[usize],
    subgroups: &[Vec<usize>],
) -> Option<(Vec<usize>, Vec<usize>)> {
    let sub_gens = g.small_generating_set(sub);
    let inside: Vec<&Vec<usize>> = subgroups
        .iter()
        .filter(|s| {
            s.len() > 1
                && s.len() < sub.len()
                && s.iter().all(|e| sub.binary_search(e).is_ok())
        })
        .collect();
    let normal_in_sub = |s: &[usize]| {
        s.iter().all(|&e| {
            sub_gens.iter().all(|&c| {
                let conj = g
                    .id_of(&g.element(e).conjugate_by(g.element(c)))
                    .unwrap_or(usize::MAX);
                s.binary_search(&conj).is_ok()
            })
        })
    };
    let normals: Vec<&&Vec<usize>> = inside.iter().filter(|s| normal_in_sub(s)).collect();
    for a in &normals {
        for b in &normals {
            if a.len() * b.len() != sub.len() {
                continue;
            }
            let meet: Vec<usize> = a
                .iter()
                .copied()
                .filter(|e| b.binary_search(e).is_ok())
                .collect();
            if meet == [0] {
                return Some(((**a).clone(), (**b).clone()));
            }
        }
    }
    None
}

/// Fully refine `sub` into indecomposable direct factors. Returns `None`
/// when `sub` itself is indecomposable.
pub fn indecomposable_factors(
    g: &PermGroup,
    sub: &[usize],
) -> Result<Option<Vec<Vec<usize>>>, OracleError> {
    let subgroups = all_subgroups(g)?;
    let Some((a, b)) = split_once(g, sub, &subgroups) else {
        return Ok(None);
    };
    let mut queue = vec![a, b];
    let mut factors = Vec::new();
    while let Some(part) = queue.pop() {
        match split_once(g, &part, &subgroups) {
            Some((x, y)) => {
                queue.push(x);
                queue.push(y);
            }
            None => factors.push(part),
        }
    }
    factors.sort_by_key(|f| (f.len(), f.clone()));
    Ok(Some(factors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perm::Perm;

    fn group(degree: u16, words: &[&str]) -> PermGroup {
        let gens = words
            .iter()
            .map(|w| Perm::from_cycles(w, degree, 0).unwrap())
            .collect();
        PermGroup::generate(degree, gens, 100_000).unwrap()
    }

    #[test]
    fn s3_has_six_subgroups() {
        let g = group(3, &["(1,2)", "(1,2,3)"]);
        let subs = all_subgroups(&g).unwrap();
        // trivial, three C2, one C3, S3
        assert_eq!(subs.len(), 6);
        assert_eq!(subgroup_order_profile(&g).unwrap(), vec![1, 2, 2, 2, 3, 6]);
    }

    #[test]
    fn s3_has_three_normal_subgroups() {
        let g = group(3, &["(1,2)", "(1,2,3)"]);
        assert_eq!(normal_subgroup_count(&g).unwrap(), 3);
    }

    #[test]
    fn frattini_of_c4_is_c2() {
        let c4 = group(4, &["(1,2,3,4)"]);
        assert_eq!(frattini_subgroup(&c4).unwrap().len(), 2);
    }

    #[test]
    fn frattini_of_s3_is_trivial() {
        let g = group(3, &["(1,2)", "(1,2,3)"]);
        assert_eq!(frattini_subgroup(&g).unwrap(), vec![0]);
    }

    #[test]
    fn c6_splits_into_c2_and_c3() {
        let c6 = group(6, &["(1,2,3,4,5,6)"]);
        let all: Vec<usize> = (0..6).collect();
        let factors = indecomposable_factors(&c6, &all).unwrap().unwrap();
        let sizes: Vec<usize> = factors.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 3]);
    }

    #[test]
    fn s3_is_indecomposable() {
        let g = group(3, &["(1,2)", "(1,2,3)"]);
        let all: Vec<usize> = (0..6).collect();
        assert!(indecomposable_factors(&g, &all).unwrap().is_none());
    }

    #[test]
    fn lattice_cap_is_enforced() {
        // S5 has order 120 < cap, S6 would pass 200; use a fake big cyclic
        let c210 = group(17, &["(1,2)", "(3,4,5)", "(6,7,8,9,10)", "(11,12,13,14,15,16,17)"]);
        assert_eq!(c210.order(), 210);
        assert!(matches!(
            all_subgroups(&c210),
            Err(OracleError::Unsupported { .. })
        ));
    }
}
