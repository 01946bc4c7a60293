//! The reference oracle.
//!
//! Reconstructs each group from its stored generators on demand, behind a
//! bounded cache that is cleared wholesale when full; correctness never
//! depends on cache contents because reconstruction is a pure function of
//! the handle.

use std::sync::Arc;

use parking_lot::Mutex;
use std::collections::HashMap;

use isoclass_core::handle::{GeneratorSpec, GroupHandle};
use isoclass_core::oracle::{
    AlgebraOracle, CatalogAnswer, ClassInfo, FactorInfo, GeneratorMap, HomExtension, IsoAnswer,
    OracleError,
};

use crate::catalog;
use crate::group::PermGroup;
use crate::iso;
use crate::perm::Perm;
use crate::subgroups;

/// Default closure cap: groups beyond this many elements are refused.
pub const DEFAULT_ELEMENT_CAP: usize = 100_000;

/// Default reconstruction-cache capacity.
pub const DEFAULT_CACHE_CAP: usize = 4096;

pub struct NaiveOracle {
    element_cap: usize,
    cache_cap: usize,
    cache: Mutex<HashMap<GroupHandle, Arc<PermGroup>>>,
}

impl Default for NaiveOracle {
    fn default() -> Self {
        Self::new(DEFAULT_ELEMENT_CAP, DEFAULT_CACHE_CAP)
    }
}

impl NaiveOracle {
    #[must_use]
    pub fn new(element_cap: usize, cache_cap: usize) -> Self {
        Self {
            element_cap,
            cache_cap: cache_cap.max(1),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Cached reconstruction of the handle's group.
    fn realize(&self, handle: &GroupHandle) -> Result<Arc<PermGroup>, OracleError> {
        if let Some(hit) = self.cache.lock().get(handle) {
            return Ok(Arc::clone(hit));
        }
        let group = Arc::new(self.reconstruct(handle)?);
        let mut cache = self.cache.lock();
        if cache.len() >= self.cache_cap {
            cache.clear();
        }
        cache.insert(handle.clone(), Arc::clone(&group));
        Ok(group)
    }

    fn reconstruct(&self, handle: &GroupHandle) -> Result<PermGroup, OracleError> {
        let gens = self.parse_generators(handle)?;
        PermGroup::generate(handle.degree, gens, self.element_cap)
    }

    fn parse_generators(&self, handle: &GroupHandle) -> Result<Vec<Perm>, OracleError> {
        match &handle.generators {
            GeneratorSpec::Images(lists) => lists
                .iter()
                .enumerate()
                .map(|(i, list)| Perm::from_one_based(list, handle.degree, i))
                .collect(),
            GeneratorSpec::Words(words) => words
                .iter()
                .enumerate()
                .map(|(i, w)| Perm::from_cycles(w, handle.degree, i))
                .collect(),
        }
    }

    fn parse_list(
        &self,
        lists: &[Vec<u16>],
        degree: u16,
    ) -> Result<Vec<Perm>, OracleError> {
        lists
            .iter()
            .enumerate()
            .map(|(i, list)| Perm::from_one_based(list, degree, i))
            .collect()
    }

    /// Number of cached reconstructions, for tests.
    #[must_use]
    pub fn cached_groups(&self) -> usize {
        self.cache.lock().len()
    }
}

impl AlgebraOracle for NaiveOracle {
    fn order(&self, g: &GroupHandle) -> Result<u64, OracleError> {
        Ok(self.realize(g)?.order())
    }

    fn derived_series_sizes(&self, g: &GroupHandle) -> Result<Vec<u64>, OracleError> {
        Ok(self.realize(g)?.derived_series_sizes())
    }

    fn conjugacy_classes(&self, g: &GroupHandle) -> Result<Vec<ClassInfo>, OracleError> {
        let group = self.realize(g)?;
        Ok(group
            .conjugacy_classes()
            .into_iter()
            .map(|class| {
                let rep = group.element(class[0]);
                ClassInfo {
                    element_order: rep.order(),
                    fixed_points: rep.fixed_points(),
                    size: class.len() as u64,
                }
            })
            .collect())
    }

    fn abelian_invariants(&self, g: &GroupHandle) -> Result<Vec<u64>, OracleError> {
        Ok(self.realize(g)?.abelian_invariants())
    }

    fn center_size(&self, g: &GroupHandle) -> Result<u64, OracleError> {
        Ok(self.realize(g)?.center().len() as u64)
    }

    fn frattini_size(&self, g: &GroupHandle) -> Result<u64, OracleError> {
        let group = self.realize(g)?;
        Ok(subgroups::frattini_subgroup(&group)?.len() as u64)
    }

    fn normal_subgroup_count(&self, g: &GroupHandle) -> Result<u64, OracleError> {
        let group = self.realize(g)?;
        subgroups::normal_subgroup_count(&group)
    }

    fn subgroup_order_profile(&self, g: &GroupHandle) -> Result<Vec<u64>, OracleError> {
        let group = self.realize(g)?;
        subgroups::subgroup_order_profile(&group)
    }

    fn aut_group_order(&self, g: &GroupHandle) -> Result<u64, OracleError> {
        let group = self.realize(g)?;
        if group.order() > subgroups::LATTICE_ORDER_CAP {
            return Err(OracleError::Unsupported {
                op: "automorphism count",
                detail: format!("order {} exceeds cap", group.order()),
            });
        }
        Ok(iso::automorphism_count(&group))
    }

    fn nilpotency_class(&self, g: &GroupHandle) -> Result<Option<u32>, OracleError> {
        Ok(self.realize(g)?.nilpotency_class())
    }

    fn direct_factors(&self, g: &GroupHandle) -> Result<Option<Vec<FactorInfo>>, OracleError> {
        let group = self.realize(g)?;
        let all: Vec<usize> = (0..group.order() as usize).collect();
        let factors = match subgroups::indecomposable_factors(&group, &all) {
            Ok(f) => f,
            // beyond the lattice cap the decomposition attempt is simply
            // abandoned and the group treated as unsplit
            Err(OracleError::Unsupported { .. }) => None,
            Err(e) => return Err(e),
        };
        let Some(factors) = factors else {
            return Ok(None);
        };
        let mut infos = Vec::with_capacity(factors.len());
        for part in factors {
            let gen_ids = group.small_generating_set(&part);
            let generators: Vec<Vec<u16>> = gen_ids
                .iter()
                .map(|&e| group.element(e).to_one_based())
                .collect();
            let gens: Vec<Perm> = gen_ids.iter().map(|&e| group.element(e).clone()).collect();
            let factor_group = PermGroup::generate(group.degree(), gens, self.element_cap)?;
            let label = match catalog::canonical_id(&factor_group) {
                CatalogAnswer::Id(id) => id.to_string(),
                CatalogAnswer::NotApplicable => format!("o{}", factor_group.order()),
            };
            infos.push(FactorInfo {
                order: part.len() as u64,
                label,
                generators,
            });
        }
        Ok(Some(infos))
    }

    fn canonical_id(&self, g: &GroupHandle) -> Result<CatalogAnswer, OracleError> {
        let group = self.realize(g)?;
        Ok(catalog::canonical_id(&group))
    }

    fn contains(&self, g: &GroupHandle, perm: &[u16]) -> Result<bool, OracleError> {
        let group = self.realize(g)?;
        let p = Perm::from_one_based(perm, g.degree, 0)?;
        Ok(group.contains(&p))
    }

    fn generated_order(&self, g: &GroupHandle, gens: &[Vec<u16>]) -> Result<u64, OracleError> {
        let parsed = self.parse_list(gens, g.degree)?;
        Ok(PermGroup::generate(g.degree, parsed, self.element_cap)?.order())
    }

    fn extend_homomorphism(
        &self,
        source: &GroupHandle,
        target: &GroupHandle,
        map: &GeneratorMap,
    ) -> Result<HomExtension, OracleError> {
        let sub = PermGroup::generate(
            source.degree,
            self.parse_list(&map.generators, source.degree)?,
            self.element_cap,
        )?;
        let img = PermGroup::generate(
            target.degree,
            self.parse_list(&map.images, target.degree)?,
            self.element_cap,
        )?;
        let gen_ids = sub.generator_ids();
        let img_ids = img.generator_ids();
        Ok(
            match iso::extend_generator_map(&sub, &gen_ids, &img, &img_ids) {
                Some(ext) => HomExtension::WellDefined {
                    kernel_size: ext.kernel_size,
                    image_size: ext.image_size,
                },
                None => HomExtension::NotWellDefined,
            },
        )
    }

    fn isomorphism(&self, a: &GroupHandle, b: &GroupHandle) -> Result<IsoAnswer, OracleError> {
        let ga = self.realize(a)?;
        let gb = self.realize(b)?;
        Ok(match iso::find_isomorphism(&ga, &gb) {
            Some((gens, images)) => IsoAnswer::Isomorphic(GeneratorMap::new(
                gens.iter().map(|&e| ga.element(e).to_one_based()).collect(),
                images.iter().map(|&e| gb.element(e).to_one_based()).collect(),
            )),
            None => IsoAnswer::NonIsomorphic,
        })
    }

    fn conjugate_in_ambient(
        &self,
        a: &GroupHandle,
        b: &GroupHandle,
    ) -> Result<bool, OracleError> {
        let ga = self.realize(a)?;
        let gb = self.realize(b)?;
        iso::conjugate_in_ambient(&ga, &gb)
    }

    fn orbit_types(&self, g: &GroupHandle) -> Result<Vec<(u16, u32)>, OracleError> {
        let group = self.realize(g)?;
        let mut types = Vec::new();
        for orbit in group.orbits() {
            let induced = group.induced_orbit_order(&orbit, self.element_cap)?;
            types.push((orbit.len() as u16, (induced % u64::from(u32::MAX)) as u32));
        }
        types.sort_unstable();
        Ok(types)
    }
}
