//! Canonical identifiers for orders 1 through 15.
//!
//! The numbering follows the standard small-groups catalog so that
//! identifiers line up with the published tables. Beyond order 15 this
//! oracle answers `NotApplicable` and the engine falls through to the
//! cascade.

use isoclass_core::oracle::{CanonicalId, CatalogAnswer};

use crate::group::PermGroup;

/// Largest order this catalog covers.
pub const CATALOG_LIMIT: u64 = 15;

/// Identify `g` within the catalog range.
#[must_use]
pub fn canonical_id(g: &PermGroup) -> CatalogAnswer {
    let order = g.order();
    if order > CATALOG_LIMIT {
        return CatalogAnswer::NotApplicable;
    }
    let id = match order {
        1 => 1,
        // prime orders have exactly the cyclic group
        2 | 3 | 5 | 7 | 11 | 13 => 1,
        4 => {
            if is_cyclic(g) { 1 } else { 2 }
        }
        9 => {
            if is_cyclic(g) { 1 } else { 2 }
        }
        // order 2p: the dihedral group is id 1, the cyclic group id 2
        6 | 10 | 14 => {
            if is_abelian(g) { 2 } else { 1 }
        }
        15 => 1,
        8 => {
            if is_abelian(g) {
                // C8, C4 x C2, C2^3 sorted by decreasing exponent
                match max_element_order(g) {
                    8 => 1,
                    4 => 2,
                    _ => 5,
                }
            } else if involution_count(g) == 5 {
                3 // dihedral
            } else {
                4 // quaternion
            }
        }
        12 => {
            if is_abelian(g) {
                if max_element_order(g) == 12 { 2 } else { 5 }
            } else {
                // dicyclic has 1 involution, the alternating group 3, the
                // dihedral group 7
                match involution_count(g) {
                    1 => 1,
                    3 => 3,
                    _ => 4,
                }
            }
        }
        _ => return CatalogAnswer::NotApplicable,
    };
    CatalogAnswer::Id(CanonicalId { order, id })
}

fn is_abelian(g: &PermGroup) -> bool {
    let gens = g.generators();
    gens.iter()
        .all(|a| gens.iter().all(|b| a.compose(b) == b.compose(a)))
}

fn is_cyclic(g: &PermGroup) -> bool {
    g.elements().iter().any(|e| e.order() == g.order())
}

fn max_element_order(g: &PermGroup) -> u64 {
    g.elements().iter().map(|e| e.order()).max().unwrap_or(1)
}

fn involution_count(g: &PermGroup) -> u64 {
    g.elements().iter().filter(|e| e.order() == 2).count() as u64
}
