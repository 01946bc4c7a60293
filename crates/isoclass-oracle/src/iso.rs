//! Isomorphism search, homomorphism extension, and ambient conjugacy.
//!
//! All by backtracking over generator images with element-order pruning.
//! Fine for the group sizes this oracle accepts, hopeless beyond them.

use std::collections::HashMap;

use isoclass_core::oracle::OracleError;

use crate::group::PermGroup;
use crate::perm::Perm;

/// Result of extending a generator map by breadth-first closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    pub kernel_size: u64,
    pub image_size: u64,
}

/// Try to extend `gens[i] -> images[i]` to a homomorphism from the
/// subgroup of `a` generated by `gens` into `b`. Returns `None` when the
/// map is not well-defined.
#[must_use]
pub fn extend_generator_map(
    a: &PermGroup,
    gens: &[usize],
    b: &PermGroup,
    images: &[usize],
) -> Option<Extension> {
    debug_assert_eq!(gens.len(), images.len());
    let mut map: HashMap<usize, usize> = HashMap::from([(0, 0)]);
    let mut queue = vec![0usize];
    while let Some(x) = queue.pop() {
        let y = map[&x];
        for (i, &g) in gens.iter().enumerate() {
            let xn = a.multiply(x, g);
            let yn = b.multiply(y, images[i]);
            match map.get(&xn) {
                Some(&seen) if seen != yn => return None,
                Some(_) => {}
                None => {
                    map.insert(xn, yn);
                    queue.push(xn);
                }
            }
        }
    }
    let kernel_size = map.values().filter(|&&y| y == 0).count() as u64;
    let mut image: Vec<usize> = map.values().copied().collect();
    image.sort_unstable();
    image.dedup();
    Some(Extension {
        kernel_size,
        image_size: image.len() as u64,
    })
}

/// Search for an isomorphism from `a` to `b`. Returns the generator ids of
/// `a` paired with their image ids in `b`, or `None` if the groups are not
/// isomorphic.
#[must_use]
pub fn find_isomorphism(a: &PermGroup, b: &PermGroup) -> Option<(Vec<usize>, Vec<usize>)> {
    if a.order() != b.order() {
        return None;
    }
    let all: Vec<usize> = (0..a.order() as usize).collect();
    let gens = if a.order() == 1 {
        Vec::new()
    } else {
        a.small_generating_set(&all)
    };
    if gens.is_empty() {
        // trivial group
        return Some((Vec::new(), Vec::new()));
    }
    // candidate images per generator, filtered by element order
    let candidates: Vec<Vec<usize>> = gens
        .iter()
        .map(|&g| {
            let order = a.element(g).order();
            (0..b.order() as usize)
                .filter(|&e| b.element(e).order() == order)
                .collect()
        })
        .collect();
    let mut images = Vec::with_capacity(gens.len());
    if search(a, b, &gens, &candidates, &mut images) {
        Some((gens, images))
    } else {
        None
    }
}

/// Number of automorphisms of `g`.
#[must_use]
pub fn automorphism_count(g: &PermGroup) -> u64 {
    if g.order() == 1 {
        return 1;
    }
    let all: Vec<usize> = (0..g.order() as usize).collect();
    let gens = g.small_generating_set(&all);
    let candidates: Vec<Vec<usize>> = gens
        .iter()
        .map(|&x| {
            let order = g.element(x).order();
            (0..g.order() as usize)
                .filter(|&e| g.element(e).order() == order)
                .collect()
        })
        .collect();
    let mut images = Vec::with_capacity(gens.len());
    let mut count = 0u64;
    count_all(g, g, &gens, &candidates, &mut images, &mut count);
    count
}

/// Depth-first assignment, stopping at the first full isomorphism.
fn search(
    a: &PermGroup,
    b: &PermGroup,
    gens: &[usize],
    candidates: &[Vec<usize>],
    images: &mut Vec<usize>,
) -> bool {
    let depth = images.len();
    if depth == gens.len() {
        return is_isomorphism(a, b, gens, images);
    }
    for &cand in &candidates[depth] {
        images.push(cand);
        // partial consistency: the assigned prefix must already extend
        if extend_generator_map(a, &gens[..images.len()], b, images).is_some()
            && search(a, b, gens, candidates, images)
        {
            return true;
        }
        images.pop();
    }
    false
}

fn count_all(
    a: &PermGroup,
    b: &PermGroup,
    gens: &[usize],
    candidates: &[Vec<usize>],
    images: &mut Vec<usize>,
    count: &mut u64,
) {
    let depth = images.len();
    if depth == gens.len() {
        if is_isomorphism(a, b, gens, images) {
            *count += 1;
        }
        return;
    }
    for &cand in &candidates[depth] {
        images.push(cand);
        if extend_generator_map(a, &gens[..images.len()], b, images).is_some() {
            count_all(a, b, gens, candidates, images, count);
        }
        images.pop();
    }
}

fn is_isomorphism(a: &PermGroup, b: &PermGroup, gens: &[usize], images: &[usize]) -> bool {
    match extend_generator_map(a, gens, b, images) {
        Some(ext) => ext.kernel_size == 1 && ext.image_size == b.order(),
        None => false,
    }
}

/// Largest ambient degree the exhaustive conjugacy search will attempt
/// (8! = 40320 candidate conjugators).
pub const CONJUGACY_DEGREE_CAP: u16 = 8;

/// Are `a` and `b` conjugate inside the symmetric group on their shared
/// point set? Exhaustive over the ambient group.
pub fn conjugate_in_ambient(a: &PermGroup, b: &PermGroup) -> Result<bool, OracleError> {
    if a.degree() != b.degree() {
        return Err(OracleError::AmbientMismatch {
            left: a.degree(),
            right: b.degree(),
        });
    }
    if a.order() != b.order() {
        return Ok(false);
    }
    let degree = a.degree();
    if degree > CONJUGACY_DEGREE_CAP {
        return Err(OracleError::Unsupported {
            op: "ambient conjugacy",
            detail: format!("degree {degree} exceeds cap {CONJUGACY_DEGREE_CAP}"),
        });
    }
    let mut points: Vec<u16> = (1..=degree).collect();
    let mut found = false;
    permute(&mut points, 0, &mut |images| {
        if found {
            return;
        }
        if let Ok(s) = Perm::from_one_based(images, degree, 0) {
            if a.generators().iter().all(|g| b.contains(&g.conjugate_by(&s))) {
                found = true;
            }
        }
    });
    Ok(found)
}

/// Heap-style enumeration of all orderings of `points[k..]`.
fn permute(points: &mut Vec<u16>, k: usize, visit: &mut impl FnMut(&[u16])) {
    if k == points.len() {
        visit(points);
        return;
    }
    for i in k..points.len() {
        points.swap(k, i);
        permute(points, k + 1, visit);
        points.swap(k, i);
    }
}
